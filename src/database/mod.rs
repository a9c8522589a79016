//! Módulo de base de datos
//! 
//! Maneja la conexión con PostgreSQL y las migraciones del esquema de flota.

pub mod connection;

pub use connection::*;
