use drillkit_core::contract::{ContentStatus, MockPublishTarget};
use drillkit_core::publish::publish;
use drillkit_core::DrillError;

#[tokio::test]
async fn publish_sends_a_single_published_transition() {
    let mut target = MockPublishTarget::new();
    target
        .expect_set_status()
        .withf(|id, status| id == "abc123" && *status == ContentStatus::Published)
        .times(1)
        .returning(|_, _| Ok(()));

    publish(&target, "abc123").await.expect("publish should succeed");
}

#[tokio::test]
async fn backend_failures_surface_as_publish_errors() {
    let mut target = MockPublishTarget::new();
    target
        .expect_set_status()
        .times(1)
        .returning(|_, _| Err(DrillError::Backend("status 404: content not found".into())));

    let err = publish(&target, "missing").await.unwrap_err();
    match err {
        DrillError::Publish(msg) => assert!(msg.contains("404")),
        other => panic!("expected publish error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_content_id_is_rejected_without_a_request() {
    let mut target = MockPublishTarget::new();
    target.expect_set_status().never();

    let err = publish(&target, "   ").await.unwrap_err();
    assert!(matches!(err, DrillError::InvalidInput(_)));
}
