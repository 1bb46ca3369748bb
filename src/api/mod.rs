//! Job submission and query surface
//!
//! Two routes, both JSON out:
//! - `POST /` submits a job. The body is raw concatenated URL text, not a
//!   form; whatever the ingestion parser can pull out of it becomes the
//!   job's initial scope, announced to the worker pool at depth 0 after the
//!   response has gone out.
//! - `GET /job/:job_id` returns the job's current snapshot.

use crate::bus::{enqueue_crawl_tasks, TaskSink};
use crate::ingest::{parse_concatenated_urls, strip_linebreaks};
use crate::store::{JobStore, SqliteJobStore, StoreError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::{Arc, Mutex};

/// Shared state behind the API handlers
///
/// The store handle and the task-queue sink are constructed once at startup
/// and injected here; the handlers own nothing themselves.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Mutex<SqliteJobStore>>,
    pub tasks: Arc<dyn TaskSink>,
}

/// Builds the API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(submit_job))
        .route("/job/:job_id", get(job_detail))
        .with_state(state)
}

async fn submit_job(State(state): State<ApiState>, body: String) -> Response {
    // We aren't expecting CRs or LFs. Strip any out just in case.
    let body = strip_linebreaks(&body);

    let urls = match parse_concatenated_urls(&body) {
        Ok(urls) => urls,
        Err(error) => {
            return error_response(StatusCode::BAD_REQUEST, &error.to_string());
        }
    };

    let created = lock_store(&state).create_job(&urls);

    match created {
        Ok(job) => {
            // Announce the initial URLs to the pool once the response is on
            // its way; the submitter never waits on the queue.
            let sink = Arc::clone(&state.tasks);
            let queued_job = job.clone();
            tokio::spawn(async move {
                match enqueue_crawl_tasks(sink.as_ref(), &queued_job.id, &queued_job.all_urls, 0)
                    .await
                {
                    Ok(count) => tracing::info!(
                        "New job ({}) created with {} URL(s) enqueued.",
                        queued_job.id,
                        count
                    ),
                    Err(error) => tracing::error!(
                        "Failed to enqueue initial URLs for job {}: {}",
                        queued_job.id,
                        error
                    ),
                }
            });

            (StatusCode::OK, Json(job)).into_response()
        }
        Err(StoreError::NoUrls) => {
            error_response(StatusCode::BAD_REQUEST, &StoreError::NoUrls.to_string())
        }
        Err(error) => {
            tracing::error!("Error encountered when creating new job: {}", error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error was encountered while creating new job.",
            )
        }
    }
}

async fn job_detail(State(state): State<ApiState>, Path(job_id): Path<String>) -> Response {
    let found = lock_store(&state).get_job(&job_id);

    match found {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(StoreError::UnknownJob(_)) => {
            error_response(StatusCode::NOT_FOUND, "Invalid job ID.")
        }
        Err(error) => {
            tracing::error!("Error encountered when retrieving job data: {}", error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error was encountered while retrieving job data.",
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

fn lock_store(state: &ApiState) -> std::sync::MutexGuard<'_, SqliteJobStore> {
    state.store.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingSink;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> (ApiState, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let state = ApiState {
            store: Arc::new(Mutex::new(SqliteJobStore::open_in_memory().unwrap())),
            tasks: sink.clone(),
        };
        (state, sink)
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_job_returns_job_snapshot() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(
                Request::post("/")
                    .body(Body::from("http://a.com/https://b.com"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert!(json["id"].as_str().is_some_and(|id| !id.is_empty()));

        let mut all_urls: Vec<&str> = json["all_urls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        all_urls.sort_unstable();
        assert_eq!(all_urls, vec!["http://a.com", "https://b.com"]);
        assert_eq!(json["crawls_pending"].as_array().unwrap().len(), 2);
        assert_eq!(json["crawls_completed"].as_array().unwrap().len(), 0);
        assert_eq!(json["images"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_submit_job_enqueues_initial_urls_at_depth_zero() {
        let (state, sink) = test_state();
        let response = router(state)
            .oneshot(
                Request::post("/")
                    .body(Body::from("http://a.com/https://b.com"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The announcements go out on a detached task after the response.
        let mut sent = sink.sent();
        for _ in 0..50 {
            if sent.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            sent = sink.sent();
        }

        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.depth == 0));
    }

    #[tokio::test]
    async fn test_submit_job_rejects_body_without_protocol() {
        let (state, sink) = test_state();
        let response = router(state)
            .oneshot(Request::post("/").body(Body::from("not a url")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert!(json["message"].as_str().is_some());
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_submit_job_rejects_bare_protocol_body() {
        // Parses fine but yields zero URLs, which the store refuses.
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(Request::post("/").body(Body::from("http://")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["message"], "No valid URLs provided.");
    }

    #[tokio::test]
    async fn test_job_detail_unknown_id_is_404() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(
                Request::get("/job/no-such-job")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["message"], "Invalid job ID.");
    }

    #[tokio::test]
    async fn test_job_detail_returns_submitted_job() {
        let (state, _) = test_state();
        let job_id = {
            let mut store = state.store.lock().unwrap();
            let urls = ["http://a.com".to_string()].into_iter().collect();
            store.create_job(&urls).unwrap().id
        };

        let response = router(state)
            .oneshot(
                Request::get(format!("/job/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["id"], job_id);
        assert_eq!(json["all_urls"].as_array().unwrap().len(), 1);
    }
}
