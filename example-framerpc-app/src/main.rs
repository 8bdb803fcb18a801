use example_framerpc_app::arith_service;
use example_framerpc_service_definition::arith::{ADD, DIV, MUL};
use example_framerpc_service_definition::{Args, Quotient, Reply};
use framerpc::{Context, RpcOptions};
use framerpc_tokio_rpc_client::RpcClient;
use framerpc_tokio_rpc_server::RpcServer;
use framerpc_tokio_rpc_server::utils::bind_socket_transport_on_random_port;
use rand::Rng;
use std::sync::Arc;
use tokio::join;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Bind to a random available port
    let (transport, port) = bind_socket_transport_on_random_port().await.unwrap();
    tracing::info!("Bound demo server to 127.0.0.1:{}", port);

    let server = Arc::new(RpcServer::new());
    server.register(arith_service().unwrap(), "").unwrap();

    // Spawn the server using the pre-bound transport
    let _server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            let _ = server.serve_with(transport).await;
        }
    });

    let client = RpcClient::connect("tcp", &format!("127.0.0.1:{port}"), RpcOptions::default())
        .await
        .unwrap();

    let ctx = Context::background();
    let args = {
        let mut rng = rand::rng();
        Args {
            a: rng.random_range(0..200),
            b: rng.random_range(1..100),
        }
    };

    // `join!` will await all responses before proceeding
    let (sum, product, quotient) = join!(
        client.call::<_, Reply>(&ctx, ADD, &args),
        client.call::<_, Reply>(&ctx, MUL, &args),
        client.call::<_, Quotient>(&ctx, DIV, &args),
    );

    println!("{ADD} with param {args:?} equal {sum:?}");
    println!("{MUL} with param {args:?} equal {product:?}");
    println!("{DIV} with param {args:?} equal {quotient:?}");

    let _ = client.close().await;
    let _ = server.close();
}
