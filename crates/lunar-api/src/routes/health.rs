use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports the API version and MongoDB reachability. A database outage is
/// reported, not propagated: chat itself keeps working offline.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let mongodb = match state.gateway.connect().await {
        Ok(store) => match store.ping().await {
            Ok(()) => "connected",
            Err(_) => "disconnected",
        },
        Err(_) => "offline",
    };
    services.insert("mongodb".to_string(), mongodb.to_string());

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
