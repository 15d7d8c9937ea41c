//! Job listing endpoints.
//!
//! Handlers translate path/query parameters into filter sets and raw
//! predicate fragments; user input only ever travels through bind
//! parameters.

use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{FetchMode, Record, SelectQuery};
use crate::http::error::ApiError;
use crate::http::server::AppState;

const JOBS_TABLE: &str = "jobs";
const DEFAULT_ORDER: &str = "date_posted DESC";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
}

fn listing(jobs: Vec<Record>) -> Json<Value> {
    Json(json!({
        "count": jobs.len(),
        "jobs": jobs,
    }))
}

/// Wrap a keyword for substring ILIKE matching.
fn contains_pattern(keyword: &str) -> String {
    format!("%{keyword}%")
}

/// GET /jobs
async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let mut query = SelectQuery::table(JOBS_TABLE).order_by(DEFAULT_ORDER);
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    let jobs = state.dal().await?.select(query).await?;
    Ok(listing(jobs))
}

/// GET /jobs/company/{company}
async fn jobs_by_company(
    State(state): State<AppState>,
    Path(company): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let mut query = SelectQuery::table(JOBS_TABLE)
        .raw_where("company ILIKE $1", vec![company.into()])
        .order_by(DEFAULT_ORDER);
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    let jobs = state.dal().await?.select(query).await?;
    Ok(listing(jobs))
}

/// GET /jobs/search/{keyword}
async fn search_jobs(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let pattern = contains_pattern(&keyword);
    let mut query = SelectQuery::table(JOBS_TABLE)
        .raw_where("title ILIKE $1 OR company ILIKE $1", vec![pattern.into()])
        .order_by(DEFAULT_ORDER);
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    let jobs = state.dal().await?.select(query).await?;
    Ok(listing(jobs))
}

/// GET /jobs/sponsor
async fn sponsored_jobs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let result = state
        .dal()
        .await?
        .call_function("jobs_by_sponsor", vec![], FetchMode::Fetch)
        .await?;
    Ok(listing(result.into_rows().unwrap_or_default()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/company/{company}", get(jobs_by_company))
        .route("/jobs/search/{keyword}", get(search_jobs))
        .route("/jobs/sponsor", get(sponsored_jobs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_wraps_keyword() {
        assert_eq!(contains_pattern("rust"), "%rust%");
    }

    #[test]
    fn listing_reports_count() {
        let Json(body) = listing(vec![Record::new(), Record::new()]);
        assert_eq!(body["count"], 2);
        assert_eq!(body["jobs"].as_array().unwrap().len(), 2);
    }
}
