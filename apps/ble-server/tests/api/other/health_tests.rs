use crate::utils::context::TestContext;

#[tokio::test]
async fn test_health_check() {
    let context = TestContext::new().await;

    let resp = context.api.other.health().await;

    assert_eq!(resp.status(), 204);
}
