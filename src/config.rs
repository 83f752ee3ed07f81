use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/barber-queue.db";

#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    pub max_connections: u32,
    pub admin: AdminSeed,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            database_url: text("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_address: text("BIND_ADDRESS", "0.0.0.0"),
            port: lookup("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(8080),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|value| value.parse().ok())
                .filter(|value| *value > 0)
                .unwrap_or(5),
            admin: AdminSeed {
                username: text("ADMIN_USER", "admin"),
                password: text("ADMIN_PASSWORD", "admin"),
                display_name: text("ADMIN_DISPLAY_NAME", "Front Desk Admin"),
            },
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
