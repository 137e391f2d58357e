//! Demo service host: runs the three demonstration services behind one
//! JSON-RPC endpoint and registers NOOPService with a running instance.
//!
//! Environment:
//! - `HC2_GATEWAY_URL`  - gateway base URL (default `http://localhost:9200`)
//! - `HC2_RPC_PORT`     - port for the local `/rpc` endpoint (default 3001)
//! - `HC2_APP`          - app name for the registration (default `current.ly`)

use std::sync::Arc;

use honeycomb_ca::ServiceSigner;
use honeycomb_client::HoneycombClient;
use honeycomb_core::CertificateRequest;
use honeycomb_services::build_rpc_router;
use honeycomb_services::demo_container;
use honeycomb_services::noop_manifest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let gateway_url = std::env::var("HC2_GATEWAY_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
    let rpc_port: u16 = std::env::var("HC2_RPC_PORT").unwrap_or_else(|_| "3001".to_string()).parse()?;
    let app = std::env::var("HC2_APP").unwrap_or_else(|_| "current.ly".to_string());

    // Host the sandbox container behind /rpc.
    let container = Arc::new(demo_container());
    container.start().await;
    let router = build_rpc_router(container);

    let addr = format!("0.0.0.0:{}", rpc_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let rpc_endpoint = format!("http://localhost:{}/rpc", rpc_port);
    println!("Demo services listening on http://{}", addr);
    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router).await {
            tracing::error!(error = %error, "rpc server failed");
        }
    });

    // Obtain a certificate for NOOPService and register it.
    let client = HoneycombClient::new(&gateway_url);
    let signer = ServiceSigner::generate()?;
    let manifest = noop_manifest(&rpc_endpoint);

    let request = CertificateRequest {
        app: app.clone(),
        service: manifest.clone(),
        public_key: signer.public_key_b64()?,
    };
    let issue_url = format!("{}/api/v1/certs", gateway_url.trim_end_matches('/'));
    let certificate: honeycomb_core::ServiceCertificate =
        reqwest::Client::new().post(&issue_url).json(&request).send().await?.json().await?;

    let registration = signer.sign_registration(app, manifest, &certificate)?;
    let receipt = client.register(&registration).await?;
    println!("Registered NOOPService: receipt {} (alias {})", receipt.receipt_id, receipt.alias);

    let sync = client.ready().await;
    println!("Route table synced: {:?} services, status {:?}", sync.services.len(), sync.status);

    // Keep serving until interrupted.
    tokio::signal::ctrl_c().await?;
    println!("shutting down");
    Ok(())
}
