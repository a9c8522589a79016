use crate::dto::fleet_dto::{RegisterVehicleRequest, UpdateVehicleRequest};
use crate::dto::ApiResponse;
use crate::models::{Vehicle, VehicleFilters};
use crate::services::{CoreContext, FleetService};
use crate::utils::errors::AppResult;
use uuid::Uuid;
use validator::Validate;

pub struct VehicleController {
    fleet: FleetService,
}

impl VehicleController {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            fleet: FleetService::new(ctx),
        }
    }

    pub async fn create(&self, request: RegisterVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let vehicle = self.fleet.register_vehicle(request.into()).await?;

        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        Ok(ApiResponse::success(self.fleet.vehicle(id).await?))
    }

    pub async fn list(&self, filters: VehicleFilters) -> AppResult<ApiResponse<Vec<Vehicle>>> {
        Ok(ApiResponse::success(self.fleet.list_vehicles(&filters).await?))
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let vehicle = self.fleet.update_vehicle(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    /// Baja lógica
    pub async fn retire(&self, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.fleet.retire_vehicle(id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo retirado de la flota".to_string(),
        ))
    }

    pub async fn suspend(&self, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.fleet.suspend_vehicle(id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo suspendido".to_string(),
        ))
    }

    pub async fn reinstate(&self, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.fleet.reinstate_vehicle(id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo reactivado".to_string(),
        ))
    }
}
