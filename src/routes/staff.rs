use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Local;
use serde::Deserialize;

use crate::{
    auth::{staff_validator, StaffUser},
    error::AppError,
    queue::{barber_queue, compose_queue, queue_stats, QueueDay},
    slots::{self, NewBooking, NewWalkIn, Reservation, SlotQuery},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct QueueFilter {
    status: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(HttpAuthentication::basic(staff_validator))
            .service(web::resource("/branches/{branch_id}/queue").route(web::get().to(branch_queue)))
            .service(web::resource("/branches/{branch_id}/queue/stats").route(web::get().to(branch_stats)))
            .service(
                web::resource("/branches/{branch_id}/barbers/{barber_id}/queue")
                    .route(web::get().to(barber_line)),
            )
            .service(web::resource("/branches/{branch_id}/bookings").route(web::post().to(create_booking)))
            .service(web::resource("/branches/{branch_id}/walk-ins").route(web::post().to(create_walk_in)))
            .service(web::resource("/slots/validate").route(web::get().to(validate_slot))),
    );
}

async fn branch_queue(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<QueueFilter>,
) -> Result<HttpResponse, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|status| !status.is_empty());
    let queue = compose_queue(&state.db, &path, status).await?;
    Ok(HttpResponse::Ok().json(queue))
}

async fn branch_stats(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let stats = queue_stats(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn barber_line(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (branch_id, barber_id) = path.into_inner();
    let group = barber_queue(&state.db, &branch_id, &barber_id).await?;
    Ok(HttpResponse::Ok().json(group))
}

async fn validate_slot(
    state: web::Data<AppState>,
    query: web::Query<SlotQuery>,
) -> Result<HttpResponse, AppError> {
    let availability = slots::validate_time_slot(&state.db, &query).await?;
    Ok(HttpResponse::Ok().json(availability))
}

async fn create_booking(
    state: web::Data<AppState>,
    staff: web::ReqData<StaffUser>,
    path: web::Path<String>,
    form: web::Json<NewBooking>,
) -> Result<HttpResponse, AppError> {
    let branch_id = path.into_inner();
    match slots::reserve_booking(&state.db, &branch_id, form.into_inner(), &QueueDay::today()).await? {
        Reservation::Confirmed(booking) => {
            log::info!(
                "{} ({}) booked {} at branch {branch_id}",
                staff.display_name,
                staff.id,
                booking.booking_code
            );
            state.notify_queue_changed(&branch_id);
            Ok(HttpResponse::Created().json(booking))
        }
        Reservation::Rejected(availability) => Ok(HttpResponse::Conflict().json(availability)),
    }
}

async fn create_walk_in(
    state: web::Data<AppState>,
    staff: web::ReqData<StaffUser>,
    path: web::Path<String>,
    form: web::Json<NewWalkIn>,
) -> Result<HttpResponse, AppError> {
    let branch_id = path.into_inner();
    let walk_in = slots::check_in_walk_in(&state.db, &branch_id, form.into_inner(), Local::now()).await?;
    log::info!(
        "{} ({}) checked in walk-in #{} at branch {branch_id}",
        staff.display_name,
        staff.id,
        walk_in.queue_number
    );
    state.notify_queue_changed(&branch_id);
    Ok(HttpResponse::Created().json(walk_in))
}
