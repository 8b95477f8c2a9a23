mod cli;
mod config;
mod db;
mod error;
mod handlers;
mod i18n;
mod models;
mod navigation;
mod pages;
mod services;
mod state;
#[cfg(test)]
mod testing;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;
use state::AppState;

async fn serve(config: &Config) -> std::io::Result<()> {
    info!(
        "Dashboard listening on {}:{}, proxying /api to {}",
        config.bind_addr, config.port, config.backend_url
    );
    let app_state = web::Data::new(AppState::new(config.backend_url.clone()));

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .route("/", web::get().to(handlers::main))
            .route("/health", web::get().to(handlers::health_check))
            .configure(handlers::proxy::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let json = cli.json;

    let result = if matches!(cli.command, Commands::Serve) {
        serve(&config).await.map_err(Into::into)
    } else {
        cli::run(cli, &config).await
    };

    if let Err(e) = result {
        error!("{}", e);
        cli::print_error(&e, json, config.locale);
        std::process::exit(1);
    }
}
