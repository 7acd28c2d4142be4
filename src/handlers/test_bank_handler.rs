use actix_web::{get, post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState, errors::AppError, middleware::get_request_id,
    models::dto::request::GenerateTestBankRequest,
};

#[post("/api/v1/test-bank/generate/")]
pub async fn generate_test_bank(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<GenerateTestBankRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    log::info!(
        "[{}] Test bank requested for '{}' / '{}'",
        get_request_id(&req).unwrap_or_default(),
        request.title,
        request.chapter_name
    );

    let response = state.test_bank_service.generate(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/v1/files/")]
pub async fn list_files(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let files = state.test_bank_service.list_saved_files().await?;
    Ok(HttpResponse::Ok().json(files))
}
