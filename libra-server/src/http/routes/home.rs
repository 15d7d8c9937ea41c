//! API metadata endpoint.

use axum::{routing::get, Json, Router};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static METADATA: Lazy<Value> = Lazy::new(|| {
    json!({
        "api": {
            "name": "libra",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Read-only access to scraped job listings",
        },
        "endpoints": {
            "GET /": "API metadata",
            "GET /health": "Liveness check",
            "GET /jobs": "List jobs, optional ?limit=N",
            "GET /jobs/company/{company}": "Jobs at one company (case-insensitive), optional ?limit=N",
            "GET /jobs/search/{keyword}": "Keyword search over title and company, optional ?limit=N",
            "GET /jobs/sponsor": "Jobs with likely visa sponsorship",
        },
        "notes": [
            "All data is read-only and refreshed by background scrapers.",
            "Company and keyword matching is case-insensitive.",
        ],
    })
});

/// GET /
async fn home() -> Json<Value> {
    Json(METADATA.clone())
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metadata_lists_every_endpoint() {
        let Json(body) = home().await;
        let endpoints = body["endpoints"].as_object().unwrap();
        assert!(endpoints.contains_key("GET /jobs"));
        assert!(endpoints.contains_key("GET /jobs/sponsor"));
        assert_eq!(body["api"]["name"], "libra");
    }
}
