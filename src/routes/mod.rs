pub mod trip_routes;
pub mod maintenance_routes;
pub mod vehicle_routes;
pub mod driver_routes;
pub mod command_routes;
