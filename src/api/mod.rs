use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::db::{self, repository};
use crate::error::{AppError, describe_storage_error};
use crate::models::*;
use crate::state::AppState;

const ENDPOINTS: [&str; 5] = [
    "GET /api/todos - Get all todos",
    "GET /api/todos/<id> - Get specific todo",
    "POST /api/todos - Create new todo",
    "PUT /api/todos/<id> - Update todo",
    "DELETE /api/todos/<id> - Delete todo",
];

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .layer(CatchPanicLayer::custom(handler_panicked))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    info!("CORS allowed origins: {:?}", origins);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

fn handler_panicked(_: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("handler panicked");
    AppError::InternalServerError.into_response()
}

async fn service_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Todo API is running!",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS.to_vec(),
    })
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match db::ping(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
                message: Some("API is running normally"),
                error: None,
            }),
        ),
        Err(err) => {
            error!("health check failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                    message: None,
                    error: Some(describe_storage_error(&err)),
                }),
            )
        }
    }
}

fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    match path? {
        Path(id) if id > 0 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = repository::fetch_todos(&state.db).await?;
    Ok(Json(todos))
}

async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(path)?;
    let todo = repository::find_todo_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<NewTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(req) = body?;
    let new = req.validate()?;

    let todo = repository::insert_todo(&state.db, new).await?;
    info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let id = todo_id(path)?;
    let Json(req) = body?;
    let changes = req.validate()?;

    let todo = repository::update_todo(&state.db, id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = todo_id(path)?;
    if repository::delete_todo(&state.db, id).await? {
        info!(id, "todo deleted");
        Ok(Json(MessageResponse {
            message: "Todo deleted successfully",
        }))
    } else {
        Err(AppError::NotFound)
    }
}
