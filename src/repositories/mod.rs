//! Repositorios
//! 
//! Contrato del Entity Store y sus dos implementaciones: PostgreSQL (sqlx)
//! y memoria (desarrollo y tests).

pub mod store;
pub mod memory_store;
pub mod pg_store;

pub use store::*;
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
