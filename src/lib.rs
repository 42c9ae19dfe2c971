pub mod appresult;
pub mod config;
pub mod rooms;
pub mod scenes;
pub mod uploads;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub use appresult::{AppError, AppResult};
use config::{AllowedOrigins, Config};
use rooms::{MessageStore, PresenceRegistry, Relay};
use scenes::SceneClient;
use uploads::UploadDir;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub scenes: SceneClient,
    pub upload_dir: UploadDir,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            relay: Arc::new(Relay::new(PresenceRegistry::new(), MessageStore::new())),
            scenes: SceneClient::new(config),
            upload_dir: UploadDir(config.upload_dir.clone()),
        }
    }
}

pub fn app(config: &Config, state: AppState) -> Router {
    Router::new()
        .merge(rooms::router())
        .merge(uploads::router(&config.upload_dir))
        .merge(scenes::router())
        .with_state(state)
        .layer(cors(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| warn!(%origin, "ignoring unparsable CORS origin"))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
