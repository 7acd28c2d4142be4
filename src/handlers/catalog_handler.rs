use actix_web::{get, web, HttpResponse};
use validator::Validate;

use crate::{app_state::AppState, errors::AppError, models::dto::request::ChaptersQuery};

#[get("/api/v1/titles/")]
pub async fn list_titles(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.test_bank_service.list_titles())
}

#[get("/api/v1/chapters/")]
pub async fn list_chapters(
    state: web::Data<AppState>,
    query: web::Query<ChaptersQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    query.validate()?;

    let response = state.test_bank_service.list_chapters(&query.title).await?;
    Ok(HttpResponse::Ok().json(response))
}
