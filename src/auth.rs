use actix_web::{dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::{
    models::{StaffUserRow, ROLE_ADMIN, ROLE_STAFF},
    state::AppState,
};

#[derive(Clone, Debug)]
pub struct StaffUser {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn authenticate_credentials(
    state: &AppState,
    username: &str,
    password: &str,
) -> Option<StaffUser> {
    let user = sqlx::query_as::<_, StaffUserRow>(
        r#"SELECT id, username, display_name, role, password_hash, active, created_at
           FROM staff_users
           WHERE username = ? AND active = 1
           LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    if !verify_password(password, &user.password_hash) {
        return None;
    }

    Some(StaffUser {
        id: user.id,
        display_name: user.display_name,
        role: user.role,
    })
}

/// Admits admins and front-desk staff; the user is stored in request extensions.
pub async fn staff_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return Err((ErrorUnauthorized("Unauthorized"), req));
    };
    let password = credentials.password().unwrap_or_default();
    match authenticate_credentials(&state, credentials.user_id(), password).await {
        Some(user) if user.role == ROLE_ADMIN || user.role == ROLE_STAFF => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Some(_) => Err((ErrorUnauthorized("Staff access required"), req)),
        None => Err((ErrorUnauthorized("Unauthorized"), req)),
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("clipper-42").unwrap();
        assert!(verify_password("clipper-42", &hash));
        assert!(!verify_password("clipper-43", &hash));
        assert!(!verify_password("clipper-42", "not-a-hash"));
    }
}
