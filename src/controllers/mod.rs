//! Controladores HTTP
//! 
//! Validan el cuerpo de la petición y delegan en los managers del núcleo.

pub mod trip_controller;
pub mod maintenance_controller;
pub mod vehicle_controller;
pub mod driver_controller;
pub mod command_controller;
