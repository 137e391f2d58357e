use std::sync::Arc;

use honeycomb::banner::print_banner;
use honeycomb::config::AppConfig;
use honeycomb::server::build_registry_router;
use honeycomb::state::AppState;
use honeycomb_ca::CertificateAuthority;
use honeycomb_gateway::GatewayState;
use honeycomb_gateway::build_router;
use honeycomb_propagator::ChangePropagator;
use honeycomb_propagator::ProfileView;
use honeycomb_store::DocumentStore;
use honeycomb_store::HttpDocumentStore;
use honeycomb_store::MemoryDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    print_banner(&config);

    // Durable store: HTTP when configured, in-memory otherwise. An
    // unreachable store at boot is fatal.
    let store: Arc<dyn DocumentStore> = match &config.store.url {
        Some(url) => {
            tracing::info!(%url, database = %config.store.database, "connecting to durable store");
            HttpDocumentStore::connect(url.clone(), config.store.database.clone()).await?
        }
        None => {
            tracing::info!("using in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
    };
    println!("✓ Durable store ready");

    // Instance key pair: fatal when generation fails.
    let ca = Arc::new(CertificateAuthority::generate(config.instance.instance_id.clone())?);
    println!("✓ Instance key pair generated");

    // Change propagator materializes the gateway's profile view.
    let view = ProfileView::new();
    let propagator = ChangePropagator::new(Arc::clone(&store), view.clone());
    propagator.spawn();
    println!("✓ Change propagator running");

    // Internal registry app.
    let state = AppState::new(config.clone(), Arc::clone(&ca), store)?;
    let registry_app = build_registry_router(state);
    let registry_addr = format!("{}:{}", config.network.bind_addr, config.network.registry_port);
    let registry_listener = tokio::net::TcpListener::bind(&registry_addr).await?;
    println!("Registry listening on http://{}", registry_addr);
    tokio::spawn(async move {
        if let Err(error) = axum::serve(registry_listener, registry_app).await {
            tracing::error!(error = %error, "registry server failed");
        }
    });

    // Public gateway front door, proxying everything else to the registry.
    let upstream = format!("http://127.0.0.1:{}", config.network.registry_port);
    let gateway_app = build_router(GatewayState::new(view, upstream));
    let gateway_addr = format!("{}:{}", config.network.bind_addr, config.network.port);
    let gateway_listener = tokio::net::TcpListener::bind(&gateway_addr).await?;
    println!("Gateway listening on http://{}", gateway_addr);
    println!();

    axum::serve(gateway_listener, gateway_app).await?;
    Ok(())
}
