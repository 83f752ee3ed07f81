use actix_web::{http::header, HttpResponse};
use askama::Template;

use crate::error::AppError;

pub fn render<T: Template>(template: T) -> Result<HttpResponse, AppError> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(body))
}
