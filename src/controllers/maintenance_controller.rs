use crate::dto::maintenance_dto::{CreateMaintenanceRequest, UpdateMaintenanceRequest};
use crate::dto::ApiResponse;
use crate::models::{MaintenanceFilters, MaintenanceOrder};
use crate::services::{CoreContext, MaintenanceOrderDetails, MaintenanceService};
use crate::utils::errors::AppResult;
use uuid::Uuid;
use validator::Validate;

pub struct MaintenanceController {
    service: MaintenanceService,
}

impl MaintenanceController {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            service: MaintenanceService::new(ctx),
        }
    }

    pub async fn create(&self, request: CreateMaintenanceRequest) -> AppResult<ApiResponse<MaintenanceOrderDetails>> {
        request.validate()?;
        let details = self.service.create(request.into()).await?;

        Ok(ApiResponse::success_with_message(
            details,
            "Orden de mantenimiento abierta".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<ApiResponse<MaintenanceOrderDetails>> {
        Ok(ApiResponse::success(self.service.get(id).await?))
    }

    pub async fn list(&self, filters: MaintenanceFilters) -> AppResult<ApiResponse<Vec<MaintenanceOrder>>> {
        Ok(ApiResponse::success(self.service.list(&filters).await?))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateMaintenanceRequest,
    ) -> AppResult<ApiResponse<MaintenanceOrderDetails>> {
        request.validate()?;
        let details = self.service.update(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Orden de mantenimiento actualizada".to_string(),
        ))
    }

    pub async fn start(&self, id: Uuid) -> AppResult<ApiResponse<MaintenanceOrderDetails>> {
        let details = self.service.start(id).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Orden de mantenimiento en curso".to_string(),
        ))
    }

    pub async fn complete(&self, id: Uuid) -> AppResult<ApiResponse<MaintenanceOrderDetails>> {
        let details = self.service.complete(id).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Orden de mantenimiento cerrada".to_string(),
        ))
    }
}
