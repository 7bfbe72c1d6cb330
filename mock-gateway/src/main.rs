use std::sync::Arc;

use tokio::{net::TcpListener, sync::RwLock};

use mock_gateway::Gateway;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let env = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    let port = env("PORT", "3000");
    let gateway = Gateway::new(
        &env("MOCK_USER", "54321"),
        &env("MOCK_PASSWORD", "PASSWORD"),
        &env("MOCK_CONTEXT", "10"),
    )
    .with_zone(&env("MOCK_ZONE", "example.com"), &env("MOCK_SYSTEM_NS", "a.ns.de"));

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}");
    mock_gateway::run(listener, Arc::new(RwLock::new(gateway))).await
}
