//! Configuración de variables de entorno
//! 
//! Este módulo maneja la configuración del entorno. Todos los valores tienen un
//! default razonable para desarrollo; un valor mal formado es un error, no un panic.

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub database_url: Option<String>,
    pub reconcile_interval: Option<Duration>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            database_url: None,
            reconcile_interval: None,
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a valid value, got '{}'", name, raw))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde el entorno (después de `dotenvy::dotenv()`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            reconcile_interval: parse_var::<u64>("RECONCILE_INTERVAL_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
        .ensure_consistent()
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// En producción el store en memoria no es aceptable
    fn ensure_consistent(self) -> Result<Self> {
        if self.is_production() && self.database_url.is_none() {
            bail!("DATABASE_URL is required when ENVIRONMENT=production");
        }
        Ok(self)
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
