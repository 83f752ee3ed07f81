use actix_web::{http::header, web, HttpResponse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{
    db,
    error::AppError,
    state::{AppState, QueueEvent},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/b/{branch_id}/queue/events").route(web::get().to(stream_queue_events)));
}

/// Lagged receivers just skip ahead; every event means "re-fetch".
async fn stream_queue_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let branch_id = path.into_inner();
    if db::fetch_branch(&state.db, &branch_id).await?.is_none() {
        return Err(AppError::NotFound(format!("branch {branch_id}")));
    }
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.branch_id == branch_id => {
            Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event)))
        }
        _ => None,
    });

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream))
}

fn event_to_bytes(event: &QueueEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: {}\ndata: {}\n\n", event.kind, payload))
}
