use example_framerpc_app::arith_service;
use example_framerpc_service_definition::arith::{DIV, DIVIDE_BY_ZERO};
use example_framerpc_service_definition::{Args, Quotient};
use framerpc::{Context, MemoryNetwork, RpcOptions, ServerTransport};
use framerpc_tokio_rpc_client::{RpcCallError, RpcClient};
use framerpc_tokio_rpc_server::RpcServer;
use std::sync::Arc;
use std::time::Duration;

async fn arith_client() -> RpcClient {
    let network = MemoryNetwork::new();
    let mut transport = network.server_transport();
    transport.listen("memory", "arith").await.unwrap();

    let server = Arc::new(RpcServer::new());
    server.register(arith_service().unwrap(), "").unwrap();
    tokio::spawn(async move {
        let _ = server.serve_with(transport).await;
    });

    let options = RpcOptions::default().with_request_timeout(Duration::ZERO);
    RpcClient::connect_with(&network, "memory", "arith", options)
        .await
        .unwrap()
}

#[tokio::test]
async fn div_returns_quotient_and_remainder() {
    let client = arith_client().await;

    let quotient: Quotient = client
        .call(&Context::background(), DIV, &Args { a: -17, b: 5 })
        .await
        .unwrap();

    assert_eq!(quotient, Quotient { quo: -3, rem: -2 });
}

#[tokio::test]
async fn div_by_zero_is_a_remote_error() {
    let client = arith_client().await;

    let res: Result<Quotient, _> = client
        .call(&Context::background(), DIV, &Args { a: 1, b: 0 })
        .await;

    match res {
        Err(RpcCallError::Remote(text)) => assert_eq!(text, DIVIDE_BY_ZERO),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn div_overflow_is_a_remote_error() {
    let client = arith_client().await;

    let res: Result<Quotient, _> = tokio::time::timeout(
        Duration::from_secs(5),
        client.call(&Context::background(), DIV, &Args { a: i64::MIN, b: -1 }),
    )
    .await
    .expect("call resolves");

    match res {
        Err(RpcCallError::Remote(text)) => assert!(text.contains("overflows"), "{text}"),
        other => panic!("expected remote error, got {other:?}"),
    }
    assert_eq!(client.pending_count(), 0);
}
