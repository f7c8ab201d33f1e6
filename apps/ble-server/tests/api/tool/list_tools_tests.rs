use crate::utils::context::TestContext;

#[tokio::test(flavor = "multi_thread")]
async fn test_list_tools() {
    // GIVEN
    let context = TestContext::new().await;

    // WHEN
    let resp = context.api.tools.list().await;

    // THEN
    assert_eq!(resp.status(), 200);
    let resp = resp.json_value().await;

    let names: Vec<_> = resp["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(
        names,
        [
            "get_adapters",
            "scan_for",
            "connect",
            "disconnect",
            "services",
            "read",
            "notify"
        ]
    );

    let scan = &resp["tools"][1];
    assert_eq!(scan["inputSchema"]["type"], "object");
    assert_eq!(scan["inputSchema"]["properties"]["timeout_ms"]["default"], 20);
    assert_eq!(scan["annotations"]["readOnlyHint"], true);
}
