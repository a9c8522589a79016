//! Middleware del sistema
//! 
//! CORS y trazas HTTP.

pub mod cors;

pub use cors::*;
