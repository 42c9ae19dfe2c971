#![allow(dead_code)]

use std::net::SocketAddr;

use tabletalk::{AppState, app, config::Config};

pub fn test_config(vars: &[(&str, &str)]) -> Config {
    let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Config::from_lookup(|key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
        .expect("test config")
}

/// Serves the full router on an ephemeral port.
pub async fn spawn(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(&config);
    let router = app(&config, state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, state)
}
