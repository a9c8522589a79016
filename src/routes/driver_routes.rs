use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use crate::controllers::driver_controller::DriverController;
use crate::dto::fleet_dto::{RegisterDriverRequest, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::models::{Driver, DriverFilters};
use crate::state::AppState;
use crate::utils::errors::AppError;
use uuid::Uuid;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_driver))
        .route("/", get(list_drivers))
        .route("/:id", get(get_driver))
        .route("/:id", put(update_driver))
        .route("/:id/suspend", post(suspend_driver))
        .route("/:id/reinstate", post(reinstate_driver))
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<RegisterDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_drivers(
    State(state): State<AppState>,
    Query(filters): Query<DriverFilters>,
) -> Result<Json<ApiResponse<Vec<Driver>>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.list(filters).await?;
    Ok(Json(response))
}

async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn suspend_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.suspend(id).await?;
    Ok(Json(response))
}

async fn reinstate_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.core.clone());
    let response = controller.reinstate(id).await?;
    Ok(Json(response))
}
