use crate::dto::fleet_dto::{RegisterDriverRequest, UpdateDriverRequest};
use crate::dto::ApiResponse;
use crate::models::{Driver, DriverFilters};
use crate::services::{CoreContext, FleetService};
use crate::utils::errors::AppResult;
use uuid::Uuid;
use validator::Validate;

pub struct DriverController {
    fleet: FleetService,
}

impl DriverController {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            fleet: FleetService::new(ctx),
        }
    }

    pub async fn create(&self, request: RegisterDriverRequest) -> AppResult<ApiResponse<Driver>> {
        request.validate()?;
        let driver = self.fleet.register_driver(request.into()).await?;

        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<ApiResponse<Driver>> {
        Ok(ApiResponse::success(self.fleet.driver(id).await?))
    }

    pub async fn list(&self, filters: DriverFilters) -> AppResult<ApiResponse<Vec<Driver>>> {
        Ok(ApiResponse::success(self.fleet.list_drivers(&filters).await?))
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<ApiResponse<Driver>> {
        request.validate()?;
        let driver = self.fleet.update_driver(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor actualizado exitosamente".to_string(),
        ))
    }

    pub async fn suspend(&self, id: Uuid) -> AppResult<ApiResponse<Driver>> {
        let driver = self.fleet.suspend_driver(id).await?;
        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor suspendido".to_string(),
        ))
    }

    pub async fn reinstate(&self, id: Uuid) -> AppResult<ApiResponse<Driver>> {
        let driver = self.fleet.reinstate_driver(id).await?;
        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor reactivado".to_string(),
        ))
    }
}
