use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, seed::seed_demo_data, AppState, ServerConfig};

/// Main entry point for carebook
///
/// Serves the patients REST API, its Swagger UI and the health check on one port.
///
/// # Environment Variables
/// - `CAREBOOK_REST_ADDR`: listen address (default: "0.0.0.0:8000")
/// - `CAREBOOK_API_TOKENS`: comma separated `token:provider` pairs
/// - `CAREBOOK_PAGE_SIZE`: list page size (default: 10)
/// - `CAREBOOK_SEED_PATIENTS`: demo patients per provider created at startup (default: 0)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, seeding or the listener fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carebook=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.addr;
    let seed_patients = config.seed_patients;
    let state = AppState::new(config);

    if seed_patients > 0 {
        let providers = state.config.providers();
        let created = seed_demo_data(
            &state.store,
            &providers,
            seed_patients,
            &mut rand::thread_rng(),
        )?;
        tracing::info!("seeded {} demo patients", created);
    }

    tracing::info!("++ Starting carebook REST on {}", addr);
    tracing::info!("++ Swagger UI at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
