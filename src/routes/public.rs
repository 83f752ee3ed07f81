use actix_web::{web, HttpResponse};
use askama::Template;

use crate::{
    error::AppError,
    queue::public::{public_queue, PublicBarberQueue, PublicQueue},
    state::AppState,
    templates::render,
};

#[derive(Clone, Debug)]
struct BoardCustomer {
    position: usize,
    first_name: String,
    service: String,
    time_label: String,
    serving: bool,
}

#[derive(Clone, Debug)]
struct BoardBarber {
    name: String,
    avatar: String,
    color: String,
    status: String,
    waiting: usize,
    customers: Vec<BoardCustomer>,
}

#[derive(Template)]
#[template(path = "live_queue.html")]
struct LiveQueueTemplate {
    branch_id: String,
    branch_name: String,
    date: String,
    total: usize,
    active: usize,
    waiting: usize,
    barbers: Vec<BoardBarber>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/b/{branch_id}/queue").route(web::get().to(live_board)))
        .service(web::resource("/b/{branch_id}/queue/data").route(web::get().to(queue_data)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn queue_data(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let queue = public_queue(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(queue))
}

async fn live_board(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let queue = public_queue(&state.db, &path).await?;
    render(board(queue))
}

fn board_barber(group: PublicBarberQueue) -> BoardBarber {
    let customers = group
        .customers
        .into_iter()
        .map(|entry| BoardCustomer {
            position: entry.position.unwrap_or_default(),
            serving: entry.status == crate::models::STATUS_ACTIVE,
            time_label: entry
                .start_time
                .or_else(|| entry.queue_number.map(|number| format!("#{number}")))
                .unwrap_or_else(|| "Walk-in".to_string()),
            first_name: entry.first_name,
            service: entry.service,
        })
        .collect();

    BoardBarber {
        name: group.barber_name,
        avatar: group.barber_avatar,
        color: group.barber_color,
        status: group.barber_status,
        waiting: group.waiting,
        customers,
    }
}

fn board(queue: PublicQueue) -> LiveQueueTemplate {
    LiveQueueTemplate {
        branch_id: queue.branch_id,
        branch_name: queue.branch_name,
        date: queue.date,
        total: queue.stats.total_customers,
        active: queue.stats.active,
        waiting: queue.stats.waiting,
        barbers: queue.queue_by_barber.into_iter().map(board_barber).collect(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use chrono::Local;

    use super::*;
    use crate::db::fixtures;

    #[actix_web::test]
    async fn board_and_data_are_public_and_redacted() {
        let pool = fixtures::test_pool().await;
        fixtures::branch(&pool, "b1", "Makati").await;
        fixtures::barber(&pool, "r1", "b1", "Ramon Cruz").await;
        let now = Local::now().timestamp_millis();
        fixtures::walk_in(&pool, "w1", "b1", Some("r1"), 1, "Emilio Aguinaldo", None, "waiting", now).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(pool)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/b/b1/queue/data").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("\"firstName\":\"Emilio\""));
        assert!(!text.contains("Aguinaldo"));
        assert!(!text.contains("0917"));

        let req = test::TestRequest::get().uri("/b/b1/queue").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Makati"));
        assert!(html.contains("Emilio"));
        assert!(!html.contains("Aguinaldo"));

        let req = test::TestRequest::get().uri("/b/missing/queue/data").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
