//! Calculator example: a server with typed methods, driven by a client
//! session through the in-process loopback transport
//!
//! Run with: cargo run --example calculator
//!
//! Set RUST_LOG=jrpc::audit=debug to see every recorded exchange.

use jrpc::core::{Error, ObservabilityConfig, Result};
use jrpc::server::RequestContext;
use jrpc::{rpc_method, JrpcClient, JsonRpcServer, LoopbackTransport};
use serde::Serialize;

#[derive(Serialize)]
struct Quotient {
    quotient: i64,
    remainder: i64,
}

/// Add up to three integers
#[rpc_method(returns = "int", defaults(c = 0))]
async fn add(a: i64, b: i64, c: i64) -> Result<i64> {
    Ok(a + b + c)
}

/// Subtract one integer from another
#[rpc_method(returns = "int")]
async fn subtract(minuend: i64, subtrahend: i64) -> Result<i64> {
    Ok(minuend - subtrahend)
}

/// Integer division with remainder
#[rpc_method(returns = "object")]
async fn divide(dividend: i64, divisor: i64) -> Result<Quotient> {
    if divisor == 0 {
        return Err(Error::rpc(1001, "Division by zero"));
    }
    Ok(Quotient {
        quotient: dividend / divisor,
        remainder: dividend % divisor,
    })
}

/// Record a message on the server
#[rpc_method]
async fn log(message: String, level: Option<String>) -> Result<()> {
    tracing::info!(level = level.as_deref().unwrap_or("info"), "{}", message);
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    jrpc::core::init_observability(
        ObservabilityConfig::new("calculator")
            .with_traces(false)
            .with_metrics(false)
            .with_log_level("info"),
    )?;

    let server = JsonRpcServer::builder()
        .description("Calculator service")
        .service_name("CalculatorServer")
        .methods([add(), subtract(), divide(), log()])
        .with_metrics()
        .build()?;

    // Service map, as an HTTP client would fetch it with GET /rpc?smd
    let smd = server
        .handle(&RequestContext::new("").with_method("GET").with_uri("/rpc?smd"))
        .await
        .map(|reply| reply.body)
        .unwrap_or_default();
    println!("Service map: {}", smd);

    let mut client = JrpcClient::builder(LoopbackTransport::new(server).with_uri("/rpc"))
        .service_name("CalculatorClient")
        .with_metrics()
        .build()?;

    let sum: i64 = client.request("add", (1, 2)).await?;
    println!("add(1, 2) = {}", sum);

    let difference: i64 = client
        .request("subtract", serde_json::json!({"subtrahend": 23, "minuend": 42}))
        .await?;
    println!("subtract(minuend=42, subtrahend=23) = {}", difference);

    match client.request::<_, serde_json::Value>("divide", (1, 0)).await {
        Ok(value) => println!("divide(1, 0) = {}", value),
        Err(e) => println!("divide(1, 0) failed: {}", e),
    }

    client.begin_batch();
    client.call("add", (1, 2, 4)).await?;
    client.call("divide", (17, 5)).await?;
    client.call("sqrt", [16]).await?;
    client.notify("log", ["batch committed"]).await?;

    if let Some(calls) = client.commit_batch().await? {
        for call in calls {
            match (&call.id, &call.result, &call.error) {
                (Some(id), Some(result), _) => println!("#{} {} -> {}", id, call.method, result),
                (Some(id), _, Some(error)) => {
                    println!("#{} {} -> error {} {}", id, call.method, error.code, error.message)
                }
                _ => println!("{} sent as a notification", call.method),
            }
        }
    }

    jrpc::core::shutdown_observability();
    Ok(())
}
