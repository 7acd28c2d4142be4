pub mod catalog_handler;
pub mod health_handler;
pub mod test_bank_handler;

use actix_web::web;

use crate::{app_state::AppState, errors::AppError};

pub use catalog_handler::{list_chapters, list_titles};
pub use health_handler::{health_check, root};
pub use test_bank_handler::{generate_test_bank, list_files};

const MAX_JSON_BODY_BYTES: usize = 256 * 1024;

/// Registers state, extractor error handling and every route.
pub fn configure(cfg: &mut web::ServiceConfig, state: AppState) {
    let json_config = web::JsonConfig::default()
        .limit(MAX_JSON_BODY_BYTES)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into());

    cfg.app_data(web::Data::new(state))
        .app_data(json_config)
        .app_data(query_config)
        .service(root)
        .service(health_check)
        .service(list_titles)
        .service(list_chapters)
        .service(generate_test_bank)
        .service(list_files);
}
