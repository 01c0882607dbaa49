use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
pub struct ReceivedForm {
    pub cv_file_name: Option<String>,
    pub cv_content_type: Option<String>,
    pub cv_len: usize,
    pub job_offer: Option<String>,
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    body: Value,
    calls: Arc<AtomicUsize>,
    forms: Arc<Mutex<Vec<ReceivedForm>>>,
}

/// In-process scoring service answering `/api/analyze` with a fixed reply.
pub struct StubBackend {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
    forms: Arc<Mutex<Vec<ReceivedForm>>>,
}

impl StubBackend {
    pub fn analyze_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_form(&self) -> Option<ReceivedForm> {
        self.forms.lock().unwrap().last().cloned()
    }
}

pub async fn spawn_backend(status: StatusCode, body: Value) -> StubBackend {
    let calls = Arc::new(AtomicUsize::new(0));
    let forms = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        status,
        body,
        calls: Arc::clone(&calls),
        forms: Arc::clone(&forms),
    };

    let router = Router::new()
        .route("/", get(root))
        .route("/api/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    StubBackend {
        base_url: format!("http://{addr}"),
        calls,
        forms,
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "CV Analyzer API",
        "status": "running",
        "version": "1.0.0"
    }))
}

async fn analyze(
    State(state): State<BackendState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let mut form = ReceivedForm::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv_file" => {
                form.cv_file_name = field.file_name().map(str::to_string);
                form.cv_content_type = field.content_type().map(str::to_string);
                form.cv_len = field.bytes().await.unwrap().len();
            }
            "job_offer" => {
                form.job_offer = Some(field.text().await.unwrap());
            }
            _ => {}
        }
    }
    state.forms.lock().unwrap().push(form);

    (state.status, Json(state.body.clone()))
}

pub fn sample_payload(total_score: f64) -> Value {
    json!({
        "success": true,
        "data": {
            "match_result": {
                "total_score": total_score,
                "breakdown": {
                    "skills": {"score": 90, "details": {"found": 9, "required": 10}},
                    "experience": {"score": 80, "details": {"match": "Exceeds requirement"}},
                    "context": {"score": 70, "details": {"dominant": "backend"}}
                },
                "skills_found": {
                    "programming_languages": ["python", "rust"],
                    "cloud_platforms": ["aws"]
                },
                "skills_missing": {
                    "devops_tools": ["terraform"]
                },
                "total_found": 9,
                "total_required": 10
            },
            "recommendations": {
                "critical": [],
                "improvements": ["Add a Terraform project"],
                "strengths": ["Strong Python background"]
            }
        }
    })
}
