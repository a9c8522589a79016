//! Modelos del sistema
//! 
//! Este módulo contiene los modelos de datos de la flota: vehículos, conductores,
//! viajes y órdenes de mantenimiento. Cada registro lleva un `version` que el
//! store usa para las escrituras compare-and-swap.

pub mod vehicle;
pub mod driver;
pub mod trip;
pub mod maintenance;

pub use vehicle::*;
pub use driver::*;
pub use trip::*;
pub use maintenance::*;
