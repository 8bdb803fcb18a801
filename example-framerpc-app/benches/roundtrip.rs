use criterion::{Criterion, criterion_group, criterion_main};
use example_framerpc_app::arith_service;
use example_framerpc_service_definition::arith::ADD;
use example_framerpc_service_definition::{Args, Reply};
use framerpc::{Context, RpcOptions, SerializeType};
use framerpc_tokio_rpc_client::RpcClient;
use framerpc_tokio_rpc_server::RpcServer;
use framerpc_tokio_rpc_server::utils::bind_socket_transport_on_random_port;
use futures::{StreamExt, stream::FuturesUnordered};
use std::{hint::black_box, sync::Arc};
use tokio::runtime::Runtime;

fn connect(rt: &Runtime, serialize_type: SerializeType) -> (RpcClient, Arc<RpcServer>) {
    rt.block_on(async {
        let (transport, port) = bind_socket_transport_on_random_port().await.unwrap();

        let server = Arc::new(RpcServer::new());
        server.register(arith_service().unwrap(), "").unwrap();

        tokio::spawn({
            let server = Arc::clone(&server);
            async move {
                let _ = server.serve_with(transport).await;
            }
        });

        let options = RpcOptions::default().with_serialize_type(serialize_type);
        let client = RpcClient::connect("tcp", &format!("127.0.0.1:{port}"), options)
            .await
            .unwrap();
        (client, server)
    })
}

fn bench_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let ctx = Context::background();
    let args = Args { a: 2, b: 3 };

    for (label, serialize_type) in [
        ("bitcode", SerializeType::Bitcode),
        ("json", SerializeType::Json),
    ] {
        let (client, _server) = connect(&rt, serialize_type);

        c.bench_function(&format!("rpc_add_roundtrip_{label}_batch_10"), |b| {
            b.to_async(&rt).iter(|| async {
                let mut tasks = FuturesUnordered::new();

                // Submitted all at once and polled concurrently over one connection.
                for _ in 0..10 {
                    tasks.push(client.call::<_, Reply>(&ctx, ADD, &args));
                }

                let mut results = Vec::with_capacity(10);
                while let Some(res) = tasks.next().await {
                    results.push(res.unwrap());
                }

                black_box(results);
            });
        });

        c.bench_function(&format!("rpc_add_roundtrip_{label}_single"), |b| {
            b.to_async(&rt).iter(|| async {
                let res = client.call::<_, Reply>(&ctx, ADD, &args).await;
                black_box(res.unwrap());
            });
        });
    }
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
