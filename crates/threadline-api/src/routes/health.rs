use axum::{extract::State, Json};
use serde_json::{json, Value};
use threadline_core::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match threadline_db::ping(&state.db).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("health check: database unavailable: {e}");
            "unavailable"
        }
    };
    Json(json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics() -> Json<Value> {
    Json(json!(threadline_core::observability::metrics_snapshot()))
}
