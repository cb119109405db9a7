#[macro_use]
extern crate rocket;

mod api;
mod cache;
mod config;
mod images;

use std::env;

use cache::{EphemeralStore, StoreReaper};
use config::AppConfig;
use dotenv::dotenv;
use env_logger::Env;
use images::{Compositor, FetchError, ImageFetcher};
use log::{error, info};
use rocket::{
    figment::{
        providers::{Format, Serialized, Toml},
        Figment, Profile,
    },
    Build, Config, Rocket,
};

/// Assembles the service around an already-created store.
pub fn build(figment: Figment, config: AppConfig, store: EphemeralStore) -> Result<Rocket<Build>, FetchError> {
    let fetcher = ImageFetcher::new(config.timeout, &config.user_agent)?;
    let compositor = Compositor::new(config.compositor.clone());
    let reaper = StoreReaper::new(store.clone(), config.sweep_interval);

    Ok(rocket::custom(figment)
        .attach(reaper)
        .manage(fetcher)
        .manage(compositor)
        .manage(store)
        .manage(config)
        .mount(
            "/",
            routes![
                api::images::index,
                api::images::edit_image,
                api::images::temp_image,
            ],
        )
        .register("/", api::catchers()))
}

fn load_figment() -> Figment {
    let defaults = AppConfig::default();

    let mut figment = Figment::from(Config::default())
        .merge(("address", defaults.address))
        .merge(("port", defaults.port))
        .merge(Toml::file("App.toml").nested());

    if let Ok(public_url) = env::var("PUBLIC_URL") {
        figment = figment.merge(("public_url", public_url));
    }

    if let Ok(logo_url) = env::var("DEFAULT_LOGO_URL") {
        figment = figment.merge(("default_logo_url", logo_url));
    }

    if let Ok(font_path) = env::var("FONT_PATH") {
        figment = figment.merge(Serialized::default("compositor.font_path", font_path));
    }

    if let Ok(ttl) = env::var("STORE_TTL") {
        match ttl.trim().parse::<u64>() {
            Ok(ttl) => figment = figment.merge(("store_ttl", ttl)),
            Err(e) => error!("Ignoring STORE_TTL={:?}: {}", ttl, e),
        }
    }

    figment.select(Profile::from_env_or("APP_PROFILE", "default"))
}

#[launch]
fn rocket() -> _ {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let figment = load_figment();
    let config = match figment.extract::<AppConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded successfully");

    let store = EphemeralStore::new(config.store_ttl);
    info!("Ephemeral image store initialized ({}s TTL)", config.store_ttl);

    info!(
        "Starting image editor on {}:{} (font: {})",
        config.address, config.port, config.compositor.font_path
    );

    match build(figment, config, store) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    }
}
