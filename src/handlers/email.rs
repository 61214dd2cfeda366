use actix_web::{web, HttpResponse};
use serde::Serialize;
use crate::errors::AppError;
use crate::store::Store;

#[derive(Serialize)]
struct EmailExists {
    exists: bool,
}

/// Reports whether any employee holds exactly this email.
pub async fn check_email_exists(
    store: web::Data<dyn Store>,
    email: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let exists = store.email_in_use(&email, None).await?;
    Ok(HttpResponse::Ok().json(EmailExists { exists }))
}
