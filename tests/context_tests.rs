use framerpc::constants::DEFAULT_REQUEST_TIMEOUT;
use framerpc::{CompressType, Context, ProtocolType, RpcOptions, SerializeType, TransportType};
use std::time::Duration;
use tokio::time::Instant;

#[test]
fn background_context_never_expires() {
    let ctx = Context::background();

    assert_eq!(ctx.deadline(), None);
    assert_eq!(ctx.remaining(), None);
    assert!(!ctx.is_expired());
}

#[tokio::test(start_paused = true)]
async fn timeout_context_expires_at_its_deadline() {
    let ctx = Context::with_timeout(Duration::from_millis(100));
    assert!(!ctx.is_expired());

    tokio::time::advance(Duration::from_millis(99)).await;
    assert!(!ctx.is_expired());
    assert_eq!(ctx.remaining(), Some(Duration::from_millis(1)));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(ctx.is_expired());
    assert_eq!(ctx.remaining(), Some(Duration::ZERO));
}

#[tokio::test(start_paused = true)]
async fn child_keeps_the_earliest_deadline() {
    let parent = Context::with_timeout(Duration::from_millis(50));

    let tighter = parent.child_with_timeout(Duration::from_millis(10));
    assert!(tighter.deadline() < parent.deadline());

    let looser = parent.child_with_timeout(Duration::from_secs(5));
    assert_eq!(looser.deadline(), parent.deadline());

    let from_background = Context::background().child_with_timeout(Duration::from_secs(1));
    assert_eq!(
        from_background.deadline(),
        Some(Instant::now() + Duration::from_secs(1))
    );
}

#[test]
fn default_options() {
    let options = RpcOptions::default();

    assert_eq!(options.protocol_type, ProtocolType::Default);
    assert_eq!(options.serialize_type, SerializeType::Bitcode);
    assert_eq!(options.compress_type, CompressType::None);
    assert_eq!(options.transport_type, TransportType::Socket);
    assert_eq!(options.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    assert_eq!(options.request_timeout, Duration::from_secs(60));
}

#[test]
fn options_builders_override_fields() {
    let options = RpcOptions::default()
        .with_serialize_type(SerializeType::Json)
        .with_request_timeout(Duration::from_millis(250));

    assert_eq!(options.serialize_type, SerializeType::Json);
    assert_eq!(options.request_timeout, Duration::from_millis(250));
}
