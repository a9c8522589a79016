//! Utilidades del sistema
//! 
//! Este módulo contiene utilidades para manejo de errores y validación
//! de los payloads de entrada.

pub mod errors;
pub mod validation;

pub use errors::*;
