//! DTOs de la API
//! 
//! Cuerpos de petición validados con `validator` y la respuesta genérica.

pub mod api_response;
pub mod trip_dto;
pub mod maintenance_dto;
pub mod fleet_dto;

pub use api_response::ApiResponse;
