mod catalog;
mod config;
mod error;
mod job_controller;
mod labels;
mod orders;
mod products;
mod services;

use crate::catalog::{CatalogClient, CatalogSnapshot};
use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use crate::labels::raster::{CanvasRasterizer, Fonts, Rasterizer};
use crate::orders::{HttpOrdersClient, OrderLookup};
use crate::products::store::SqliteProductStore;
use crate::products::ProductList;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::io;
use std::sync::Arc;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const EXPORT_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;
    let url = format!("http://{}:{}", config.host, config.port);

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(io::Error::other)?;

    // Lookups answer "Not found" until the next restart if this fails.
    let catalog = match CatalogClient::new(http.clone(), config.catalog_url.clone())
        .fetch()
        .await
    {
        Ok(snapshot) if snapshot.is_empty() => {
            warn!("Catalog at {} returned no usable records", config.catalog_url);
            snapshot
        }
        Ok(snapshot) => {
            info!("Loaded {} catalog records", snapshot.len());
            snapshot
        }
        Err(e) => {
            error!("Failed to load catalog from {}: {}", config.catalog_url, e);
            CatalogSnapshot::default()
        }
    };

    let store = SqliteProductStore::open(&config.database_path).map_err(io::Error::other)?;
    let products = ProductList::load(Box::new(store)).map_err(io::Error::other)?;

    let fonts = Fonts::load(&config.fonts_dir, &config.font_family).map_err(|e| {
        error!("Label fonts are required: {}", e);
        io::Error::other(e)
    })?;
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(CanvasRasterizer::new(fonts));
    let orders: Arc<dyn OrderLookup> =
        Arc::new(HttpOrdersClient::new(http, config.orders_base_url.clone()));

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        warn!("Could not create {}: {}", config.output_dir.display(), e);
    }

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new();
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });
    tokio::spawn(job_controller::state::start_export_sweeper(
        jobs_state.clone(),
        config.export_ttl,
        EXPORT_SWEEP_PERIOD,
    ));

    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);
    let catalog = web::Data::new(catalog);
    let products = web::Data::new(products);
    let rasterizer = web::Data::from(rasterizer);
    let orders = web::Data::from(orders);
    let jobs_state = web::Data::new(jobs_state);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(config.clone())
            .app_data(catalog.clone())
            .app_data(products.clone())
            .app_data(rasterizer.clone())
            .app_data(orders.clone())
            .app_data(jobs_state.clone())
            .service(services::catalog::configure_routes())
            .service(services::products::configure_routes())
            .service(services::labels::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
