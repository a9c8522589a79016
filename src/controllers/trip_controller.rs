use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest};
use crate::dto::ApiResponse;
use crate::models::{Trip, TripFilters};
use crate::services::{CoreContext, TripDetails, TripService};
use crate::utils::errors::AppResult;
use uuid::Uuid;
use validator::Validate;

pub struct TripController {
    service: TripService,
}

impl TripController {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            service: TripService::new(ctx),
        }
    }

    pub async fn create(&self, request: CreateTripRequest) -> AppResult<ApiResponse<TripDetails>> {
        request.validate()?;
        let details = self.service.create(request.into()).await?;

        Ok(ApiResponse::success_with_message(
            details,
            "Viaje creado en borrador".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<ApiResponse<TripDetails>> {
        Ok(ApiResponse::success(self.service.get(id).await?))
    }

    pub async fn list(&self, filters: TripFilters) -> AppResult<ApiResponse<Vec<Trip>>> {
        Ok(ApiResponse::success(self.service.list(&filters).await?))
    }

    pub async fn dispatch(&self, id: Uuid) -> AppResult<ApiResponse<TripDetails>> {
        let details = self.service.dispatch(id).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Viaje despachado".to_string(),
        ))
    }

    pub async fn complete(&self, id: Uuid, request: CompleteTripRequest) -> AppResult<ApiResponse<TripDetails>> {
        request.validate()?;
        let details = self.service.complete(id, request.odometer_end).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Viaje completado".to_string(),
        ))
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<ApiResponse<TripDetails>> {
        let details = self.service.cancel(id).await?;
        Ok(ApiResponse::success_with_message(
            details,
            "Viaje cancelado".to_string(),
        ))
    }
}
