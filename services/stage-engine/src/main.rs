//! Expropia Stage-Progression Engine Service
//!
//! HTTP surface for the expropriation case workflow engine: case creation,
//! stage transitions, checklist management, timeline queries and the stage
//! catalog.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use expropia_models::{CaseWorkflowState, ChecklistItem, Stage, TimelineEntry, Transition};
use expropia_utils::{init_logging, AppConfig, ErrorResponse, ExpropiaError};

use expropia_stage_engine::{
    CaseWorkflowService, NotificationDispatcher, StageCatalog, TransitionRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Falling back to default configuration: {}", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;
    info!("Starting Expropia Stage-Progression Engine");

    let catalog = Arc::new(StageCatalog::expropriation_default());
    let notifier = NotificationDispatcher::spawn_logging();
    let service = CaseWorkflowService::new(catalog, config.workflow.clone(), notifier);

    let app = Router::new()
        .route("/health", get(health_check))
        // Case lifecycle
        .route("/api/v1/cases", post(create_case))
        .route("/api/v1/cases", get(list_cases))
        .route("/api/v1/cases/:id", get(get_case))
        .route("/api/v1/cases/:id/transitions", post(request_transition))
        .route("/api/v1/cases/:id/cancel", post(cancel_case))
        .route("/api/v1/cases/:id/suspend", post(suspend_case))
        .route("/api/v1/cases/:id/resume", post(resume_case))
        // Timeline
        .route("/api/v1/cases/:id/history", get(get_history))
        .route("/api/v1/cases/:id/returns", get(get_recent_returns))
        // Checklists
        .route(
            "/api/v1/cases/:id/checklist/:stage_code",
            get(get_checklist),
        )
        .route(
            "/api/v1/cases/:id/checklist/items/:item_id",
            put(toggle_checklist_item),
        )
        // Catalog
        .route("/api/v1/stages", get(list_stages))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Stage-Progression Engine listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "stage-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn error_reply(error: ExpropiaError) -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(code = error.error_code(), "Engine error: {}", error);
    }
    (status, Json(error.into()))
}

// ===== Case Endpoints =====

#[derive(Debug, Deserialize)]
pub struct CreateCaseRequest {
    /// Supplied by the case CRUD module; generated when absent.
    pub case_id: Option<Uuid>,
    pub actor_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CaseStateResponse {
    pub case_id: Uuid,
    pub current_stage_code: String,
    pub status: String,
    pub progress_percentage: f64,
    pub department_id: String,
    pub started_at: DateTime<Utc>,
    pub entered_stage_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<CaseWorkflowState> for CaseStateResponse {
    fn from(state: CaseWorkflowState) -> Self {
        Self {
            case_id: state.case_id,
            current_stage_code: state.current_stage_code,
            status: state.status.to_string(),
            progress_percentage: state.progress_percentage,
            department_id: state.department_id,
            started_at: state.started_at,
            entered_stage_at: state.entered_stage_at,
            completed_at: state.completed_at,
        }
    }
}

async fn create_case(
    State(service): State<CaseWorkflowService>,
    Json(request): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseStateResponse>), (StatusCode, Json<ErrorResponse>)> {
    let case_id = request.case_id.unwrap_or_else(Uuid::new_v4);
    let state = service
        .create_case(case_id, request.actor_id)
        .await
        .map_err(error_reply)?;

    Ok((StatusCode::CREATED, Json(state.into())))
}

async fn list_cases(
    State(service): State<CaseWorkflowService>,
) -> Json<Vec<CaseStateResponse>> {
    let cases = service.list_cases().await;
    Json(cases.into_iter().map(Into::into).collect())
}

async fn get_case(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseStateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let state = service.current_state(id).await.map_err(error_reply)?;
    Ok(Json(state.into()))
}

// ===== Transition Endpoints =====

#[derive(Debug, Deserialize)]
pub struct TransitionRequestBody {
    /// "forward" | "backward" | "jump"
    pub kind: String,
    /// Required for backward and jump; forward's target is implied.
    pub to_stage_code: Option<String>,
    pub reason: String,
    pub observations: Option<String>,
    pub actor_id: Uuid,
}

impl TransitionRequestBody {
    fn into_request(self) -> Result<(TransitionRequest, Uuid), ExpropiaError> {
        let actor_id = self.actor_id;
        let request = match self.kind.to_lowercase().as_str() {
            "forward" => TransitionRequest::Forward {
                reason: self.reason,
            },
            "backward" => TransitionRequest::Backward {
                to_stage_code: self.to_stage_code.ok_or_else(|| {
                    ExpropiaError::validation(
                        "to_stage_code",
                        "Backward transitions must name a target stage",
                    )
                })?,
                reason: self.reason,
                observations: self.observations.unwrap_or_default(),
            },
            "jump" => TransitionRequest::Jump {
                to_stage_code: self.to_stage_code.ok_or_else(|| {
                    ExpropiaError::validation(
                        "to_stage_code",
                        "Jump transitions must name a target stage",
                    )
                })?,
                reason: self.reason,
            },
            other => {
                return Err(ExpropiaError::validation(
                    "kind",
                    format!("Unknown transition kind '{}'", other),
                ))
            }
        };
        Ok((request, actor_id))
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub transition: Transition,
    pub state: CaseStateResponse,
}

async fn request_transition(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionRequestBody>,
) -> Result<(StatusCode, Json<TransitionResponse>), (StatusCode, Json<ErrorResponse>)> {
    let (request, actor_id) = body.into_request().map_err(error_reply)?;
    let outcome = service
        .request_transition(id, request, actor_id)
        .await
        .map_err(error_reply)?;

    Ok((
        StatusCode::CREATED,
        Json(TransitionResponse {
            transition: outcome.transition,
            state: outcome.new_state.into(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusActionRequest {
    pub reason: String,
    pub actor_id: Uuid,
}

async fn cancel_case(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusActionRequest>,
) -> Result<Json<CaseStateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let state = service
        .cancel_case(id, request.reason, request.actor_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(state.into()))
}

async fn suspend_case(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusActionRequest>,
) -> Result<Json<CaseStateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let state = service
        .suspend_case(id, request.reason, request.actor_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(state.into()))
}

async fn resume_case(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusActionRequest>,
) -> Result<Json<CaseStateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let state = service
        .resume_case(id, request.reason, request.actor_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(state.into()))
}

// ===== Timeline Endpoints =====

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<TimelineEntry>,
    pub thrash_warning: bool,
    pub chain_verified: bool,
}

async fn get_history(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let view = service.history(id).await.map_err(error_reply)?;
    Ok(Json(HistoryResponse {
        entries: view.entries,
        thrash_warning: view.thrash_warning,
        chain_verified: view.chain_verified,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReturnsQuery {
    pub within_days: Option<i64>,
}

async fn get_recent_returns(
    State(service): State<CaseWorkflowService>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReturnsQuery>,
) -> Result<Json<Vec<Transition>>, (StatusCode, Json<ErrorResponse>)> {
    let returns = service
        .recent_returns(id, query.within_days)
        .await
        .map_err(error_reply)?;
    Ok(Json(returns))
}

// ===== Checklist Endpoints =====

#[derive(Debug, Serialize)]
pub struct ChecklistResponse {
    pub stage_code: String,
    pub items: Vec<ChecklistItem>,
    pub may_advance: bool,
}

async fn get_checklist(
    State(service): State<CaseWorkflowService>,
    Path((id, stage_code)): Path<(Uuid, String)>,
) -> Result<Json<ChecklistResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (items, may_advance) = service
        .get_checklist(id, &stage_code)
        .await
        .map_err(error_reply)?;
    Ok(Json(ChecklistResponse {
        stage_code,
        items,
        may_advance,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ToggleItemRequest {
    pub completed: bool,
    pub actor_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ToggleItemResponse {
    pub item: ChecklistItem,
    pub completion_ratio: f64,
}

async fn toggle_checklist_item(
    State(service): State<CaseWorkflowService>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ToggleItemRequest>,
) -> Result<Json<ToggleItemResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (item, completion_ratio) = service
        .toggle_checklist_item(id, item_id, request.completed, request.actor_id)
        .await
        .map_err(error_reply)?;
    Ok(Json(ToggleItemResponse {
        item,
        completion_ratio,
    }))
}

// ===== Catalog Endpoints =====

async fn list_stages(State(service): State<CaseWorkflowService>) -> Json<Vec<Stage>> {
    Json(service.catalog().stages_ordered().to_vec())
}
