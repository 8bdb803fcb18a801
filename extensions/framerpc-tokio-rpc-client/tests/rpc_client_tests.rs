use example_framerpc_service_definition::arith::{ADD, ADD_METHOD, DIV, DIV_METHOD, SERVICE_NAME};
use example_framerpc_service_definition::{Args, Quotient, Reply};
use framerpc::{Context, MemoryNetwork, RpcOptions, SerializeType, ServerTransport};
use framerpc_tokio_rpc_client::{RpcCallError, RpcClient, completion_queue};
use framerpc_tokio_rpc_server::utils::bind_socket_transport_on_random_port;
use framerpc_tokio_rpc_server::{RpcServer, Service, ServiceBuilder, ServiceError};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

struct Arith;

fn arith_service() -> Service {
    ServiceBuilder::named(SERVICE_NAME, Arith)
        .method(ADD_METHOD, |_: &Arith, _: &Context, args: Args, reply: &mut Reply| {
            reply.c = args.a + args.b;
            Ok(())
        })
        .unwrap()
        .async_method(DIV_METHOD, |_: Arc<Arith>, _: Context, args: Args| async move {
            if args.b == 0 {
                return Err::<Quotient, ServiceError>("divide by zero".into());
            }
            Ok(Quotient {
                quo: args.a / args.b,
                rem: args.a % args.b,
            })
        })
        .unwrap()
        .build()
}

/// Starts an `Arith` server on a random TCP port and connects a client to it.
async fn tcp_pair(options: RpcOptions) -> (RpcClient, Arc<RpcServer>) {
    let (transport, port) = bind_socket_transport_on_random_port().await.unwrap();

    let server = Arc::new(RpcServer::new());
    server.register(arith_service(), "").unwrap();

    let _server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            let _ = server.serve_with(transport).await;
        }
    });

    let client = RpcClient::connect("tcp", &format!("127.0.0.1:{port}"), options)
        .await
        .unwrap();

    (client, server)
}

#[tokio::test]
async fn test_success_client_server_roundtrip() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;

    let reply: Reply = client
        .call(&Context::background(), ADD, &Args { a: 2, b: 3 })
        .await
        .unwrap();

    assert_eq!(reply.c, 5);
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_json_client_server_roundtrip() {
    let options = RpcOptions::default().with_serialize_type(SerializeType::Json);
    let (client, _server) = tcp_pair(options).await;

    let quotient: Quotient = client
        .call(&Context::background(), DIV, &Args { a: 17, b: 5 })
        .await
        .unwrap();

    assert_eq!(quotient, Quotient { quo: 3, rem: 2 });
}

#[tokio::test]
async fn test_memory_network_roundtrip() {
    let network = MemoryNetwork::new();
    let mut transport = network.server_transport();
    transport.listen("memory", "arith").await.unwrap();

    let server = Arc::new(RpcServer::new());
    server.register(arith_service(), "").unwrap();
    let _server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move {
            let _ = server.serve_with(transport).await;
        }
    });

    let client = RpcClient::connect_with(&network, "memory", "arith", RpcOptions::default())
        .await
        .unwrap();

    let reply: Reply = client
        .call(&Context::background(), ADD, &Args { a: 40, b: 2 })
        .await
        .unwrap();
    assert_eq!(reply.c, 42);
}

#[tokio::test]
async fn test_concurrent_calls_get_unique_seqs_and_matching_replies() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;
    let ctx = Context::background();
    let (done, mut done_rx) = completion_queue::<Reply>();

    let mut expected = Vec::new();
    let mut seqs = HashSet::new();
    {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let args = Args {
                a: rng.random_range(-1000..1000),
                b: rng.random_range(-1000..1000),
            };
            expected.push(args);
        }
    }

    let mut want_by_seq = std::collections::HashMap::new();
    for args in &expected {
        let handle = client
            .go(&ctx, ADD, args, Default::default(), done.clone())
            .await;
        assert!(seqs.insert(handle.seq), "duplicate seq {}", handle.seq);
        want_by_seq.insert(handle.seq, args.a + args.b);
    }

    for _ in 0..expected.len() {
        let call = done_rx.recv().await.unwrap();
        assert_eq!(call.service_method, ADD);
        let want = want_by_seq.remove(&call.seq).expect("call delivered once");
        assert_eq!(call.reply.unwrap().c, want);
    }

    assert!(want_by_seq.is_empty());
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_concurrent_calls_from_many_tasks() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;
    let client = Arc::new(client);

    let tasks: Vec<_> = (0..32i64)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let reply: Reply = client
                    .call(&Context::background(), ADD, &Args { a: i, b: i })
                    .await
                    .unwrap();
                assert_eq!(reply.c, 2 * i);
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }
}

#[tokio::test]
async fn test_error_client_server_roundtrip() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;

    let res: Result<Quotient, _> = client
        .call(&Context::background(), DIV, &Args { a: 1, b: 0 })
        .await;

    match res {
        Err(RpcCallError::Remote(text)) => assert_eq!(text, "divide by zero"),
        other => panic!("expected remote error, got {other:?}"),
    }

    // The connection survives an application error.
    let reply: Reply = client
        .call(&Context::background(), ADD, &Args { a: 1, b: 1 })
        .await
        .unwrap();
    assert_eq!(reply.c, 2);
}

#[tokio::test]
async fn test_unknown_service_and_method_are_remote_errors() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;
    let ctx = Context::background();
    let args = Args { a: 1, b: 2 };

    let res: Result<Reply, _> = client.call(&ctx, "Nope.Add", &args).await;
    match res {
        Err(RpcCallError::Remote(text)) => assert!(text.contains("can't find service Nope")),
        other => panic!("expected remote error, got {other:?}"),
    }

    let res: Result<Reply, _> = client.call(&ctx, "Arith.Nope", &args).await;
    match res {
        Err(RpcCallError::Remote(text)) => assert!(text.contains("can't find method Nope")),
        other => panic!("expected remote error, got {other:?}"),
    }

    let reply: Reply = client.call(&ctx, ADD, &args).await.unwrap();
    assert_eq!(reply.c, 3);
}

#[tokio::test]
async fn test_reply_type_mismatch_is_codec_error() {
    let options = RpcOptions::default().with_serialize_type(SerializeType::Json);
    let (client, _server) = tcp_pair(options).await;

    // `Add` replies with `{"c":..}`, which has no `quo`/`rem`.
    let res: Result<Quotient, _> = client
        .call(&Context::background(), ADD, &Args { a: 1, b: 2 })
        .await;
    assert!(matches!(res, Err(RpcCallError::Codec(_))));
}

#[tokio::test]
async fn test_invalid_service_method_is_rejected_locally() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;
    let ctx = Context::background();
    let args = Args::default();

    for name in ["ArithAdd", ".Add", "Arith.", ""] {
        let res: Result<Reply, _> = client.call(&ctx, name, &args).await;
        assert!(
            matches!(res, Err(RpcCallError::InvalidServiceMethod(ref n)) if n == name),
            "{name:?}: {res:?}"
        );
    }
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_client_errors_if_it_cannot_connect() {
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let res = RpcClient::connect("tcp", &format!("127.0.0.1:{port}"), RpcOptions::default()).await;
    assert_eq!(
        res.err().unwrap().kind(),
        std::io::ErrorKind::ConnectionRefused
    );
}

#[tokio::test]
async fn test_calls_after_close_fail_with_shutdown() {
    let (client, _server) = tcp_pair(RpcOptions::default()).await;

    client.close().await.unwrap();
    assert!(client.is_shutdown());

    let res: Result<Reply, _> = client
        .call(&Context::background(), ADD, &Args { a: 1, b: 1 })
        .await;
    assert!(matches!(res, Err(RpcCallError::Shutdown)));

    // Closing twice reports the client is already shut down.
    assert!(matches!(client.close().await, Err(RpcCallError::Shutdown)));
}

#[tokio::test]
async fn test_server_close_ends_client_connection() {
    let (client, server) = tcp_pair(RpcOptions::default()).await;

    let reply: Reply = client
        .call(&Context::background(), ADD, &Args { a: 1, b: 1 })
        .await
        .unwrap();
    assert_eq!(reply.c, 2);

    server.close().unwrap();

    // The server drops the connection, so the reader loop ends and later
    // calls fail instead of hanging.
    let mut res: Result<Reply, _> = Ok(Reply::default());
    for _ in 0..50 {
        res = client
            .call(&Context::background(), ADD, &Args { a: 1, b: 1 })
            .await;
        if res.is_err() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(matches!(
        res,
        Err(RpcCallError::ConnectionClosed | RpcCallError::Io(_) | RpcCallError::Remote(_))
    ));
}

#[tokio::test]
async fn test_addresses_are_reported() {
    let (client, server) = tcp_pair(RpcOptions::default()).await;

    // A completed call proves the accept loop is running.
    let _: Reply = client
        .call(&Context::background(), ADD, &Args { a: 0, b: 0 })
        .await
        .unwrap();

    let server_addr = server.local_addr().unwrap();
    assert_eq!(client.remote_addr(), Some(&server_addr));
    assert!(client.local_addr().is_some());
}
