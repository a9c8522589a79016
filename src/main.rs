use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_dispatch::config::environment::EnvironmentConfig;
use fleet_dispatch::database::connect_and_migrate;
use fleet_dispatch::repositories::{EntityStore, MemoryStore, PgStore};
use fleet_dispatch::services::reconciliation_service::spawn_periodic;
use fleet_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚚 Fleet Dispatch - núcleo de despacho");
    info!("======================================");

    let config = EnvironmentConfig::from_env()?;

    // Seleccionar el store
    let store: Arc<dyn EntityStore> = match &config.database_url {
        Some(url) => {
            let pool = connect_and_migrate(url).await.inspect_err(|e| {
                error!("❌ Error conectando a la base de datos: {:#}", e);
            })?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida; usando store en memoria");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(store, config.clone());

    let reconciler = config.reconcile_interval.map(|every| {
        info!("🩺 Reconciliación periódica cada {:?}", every);
        spawn_periodic(app_state.core.clone(), every)
    });

    let app = fleet_dispatch::build_router(app_state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{} ({})", addr, config.environment);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   POST /api/commands - Ejecutar un comando tipado");
    info!("   POST /api/admin/reconcile - Reconciliar estados");
    info!("🧭 Viajes:");
    info!("   POST /api/trips - Crear viaje en borrador");
    info!("   GET  /api/trips - Listar viajes");
    info!("   GET  /api/trips/:id - Obtener viaje");
    info!("   POST /api/trips/:id/dispatch|complete|cancel - Transiciones");
    info!("🔧 Mantenimiento:");
    info!("   POST /api/maintenance - Abrir orden");
    info!("   GET  /api/maintenance - Listar órdenes");
    info!("   GET|PUT /api/maintenance/:id - Obtener / editar orden");
    info!("   POST /api/maintenance/:id/start|complete - Transiciones");
    info!("🚗 Flota:");
    info!("   POST|GET /api/vehicles, GET|PUT|DELETE /api/vehicles/:id");
    info!("   POST /api/vehicles/:id/suspend|reinstate");
    info!("   POST|GET /api/drivers, GET|PUT /api/drivers/:id");
    info!("   POST /api/drivers/:id/suspend|reinstate");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(handle) = reconciler {
        handle.abort();
    }

    if let Err(e) = served {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
