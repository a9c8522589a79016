use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use crate::controllers::trip_controller::TripController;
use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest};
use crate::dto::ApiResponse;
use crate::models::{Trip, TripFilters};
use crate::services::TripDetails;
use crate::state::AppState;
use crate::utils::errors::AppError;
use uuid::Uuid;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip))
        .route("/", get(list_trips))
        .route("/:id", get(get_trip))
        .route("/:id/dispatch", post(dispatch_trip))
        .route("/:id/complete", post(complete_trip))
        .route("/:id/cancel", post(cancel_trip))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<Json<ApiResponse<TripDetails>>, AppError> {
    let controller = TripController::new(state.core.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_trips(
    State(state): State<AppState>,
    Query(filters): Query<TripFilters>,
) -> Result<Json<ApiResponse<Vec<Trip>>>, AppError> {
    let controller = TripController::new(state.core.clone());
    let response = controller.list(filters).await?;
    Ok(Json(response))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripDetails>>, AppError> {
    let controller = TripController::new(state.core.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn dispatch_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripDetails>>, AppError> {
    let controller = TripController::new(state.core.clone());
    let response = controller.dispatch(id).await?;
    Ok(Json(response))
}

// El cuerpo es opcional: sin odómetro final se conserva el del vehículo
async fn complete_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<CompleteTripRequest>>,
) -> Result<Json<ApiResponse<TripDetails>>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let controller = TripController::new(state.core.clone());
    let response = controller.complete(id, request).await?;
    Ok(Json(response))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripDetails>>, AppError> {
    let controller = TripController::new(state.core.clone());
    let response = controller.cancel(id).await?;
    Ok(Json(response))
}
