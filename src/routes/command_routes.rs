use axum::{extract::State, routing::post, Json, Router};
use crate::controllers::command_controller::CommandController;
use crate::dto::ApiResponse;
use crate::services::{Command, CommandOutcome, ReconciliationReport};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_command_router() -> Router<AppState> {
    Router::new().route("/", post(execute_command))
}

pub fn create_admin_router() -> Router<AppState> {
    Router::new().route("/reconcile", post(reconcile))
}

async fn execute_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<ApiResponse<CommandOutcome>>, AppError> {
    let controller = CommandController::new(state.core.clone());
    let response = controller.execute(command).await?;
    Ok(Json(response))
}

async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReconciliationReport>>, AppError> {
    let controller = CommandController::new(state.core.clone());
    let response = controller.reconcile().await?;
    Ok(Json(response))
}
