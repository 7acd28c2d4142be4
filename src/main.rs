use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};

use testgen_server::{
    app_state::AppState, config::Config, handlers, middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    config.validate().map_err(std::io::Error::other)?;

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    log::info!(
        "Serving {} books from {} with model {}",
        config.title_index.len(),
        config.content_store_url,
        config.llm_model
    );

    let state = AppState::new(config).map_err(std::io::Error::other)?;

    log::info!("Starting HTTP server on http://{}:{}", host, port);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .configure(|cfg| handlers::configure(cfg, state))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
