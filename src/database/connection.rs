//! Configuración de conexión a PostgreSQL
//! 
//! Conexión, migraciones embebidas y enmascarado de la URL para los logs.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::database::DatabaseConfig;

/// Crear el pool y aplicar las migraciones pendientes
pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool> {
    info!("🗄️ Conectando a {}", mask_database_url(database_url));
    let pool = DatabaseConfig::new(database_url)
        .create_pool()
        .await
        .context("Error conectando a la base de datos")?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Error aplicando migraciones")?;
    info!("✅ Migraciones aplicadas");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(_colon_pos) = url[..at_pos].rfind(':') {
            let protocol = &url[..url.find("://").map_or(0, |p| p + 3)];
            let host = &url[at_pos + 1..];
            format!("{}***:***@{}", protocol, host)
        } else {
            url.to_string()
        }
    } else {
        url.to_string()
    }
}
