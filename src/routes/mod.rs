pub mod services;
pub mod ui;

pub use services::*;
pub use ui::*;

use axum::Json;
use serde_json::json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "homedash"
    }))
}
