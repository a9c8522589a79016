use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::maintenance_dto::{CreateMaintenanceRequest, UpdateMaintenanceRequest};
use crate::dto::ApiResponse;
use crate::models::{MaintenanceFilters, MaintenanceOrder};
use crate::services::MaintenanceOrderDetails;
use crate::state::AppState;
use crate::utils::errors::AppError;
use uuid::Uuid;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id", put(update_order))
        .route("/:id/start", post(start_order))
        .route("/:id/complete", post(complete_order))
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceOrderDetails>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(filters): Query<MaintenanceFilters>,
) -> Result<Json<ApiResponse<Vec<MaintenanceOrder>>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.list(filters).await?;
    Ok(Json(response))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceOrderDetails>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceOrderDetails>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn start_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceOrderDetails>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.start(id).await?;
    Ok(Json(response))
}

async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceOrderDetails>>, AppError> {
    let controller = MaintenanceController::new(state.core.clone());
    let response = controller.complete(id).await?;
    Ok(Json(response))
}
