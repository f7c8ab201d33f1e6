use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use crate::fixtures::{ADDRESS, CHARACTERISTIC, SERVICE};
use crate::utils::context::stdio_server;

struct StdioClient {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server: JoinHandle<()>,
}

impl StdioClient {
    fn start() -> Self {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_reader, server_writer) = tokio::io::split(server);
        let server = tokio::spawn(async move {
            stdio_server()
                .serve(server_reader, server_writer)
                .await
                .unwrap()
        });

        let (reader, writer) = tokio::io::split(client);
        Self {
            writer,
            lines: BufReader::new(reader).lines(),
            server,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string()).await;
    }

    async fn receive(&mut self) -> Value {
        let line = self.lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn request(&mut self, message: Value) -> Value {
        self.send(message).await;
        self.receive().await
    }

    async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> Value {
        self.request(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }))
        .await
    }

    /// Closes the input and waits until the server has answered everything.
    async fn finish(mut self) -> Vec<Value> {
        self.writer.shutdown().await.unwrap();

        let mut remaining = vec![];
        while let Some(line) = self.lines.next_line().await.unwrap() {
            remaining.push(serde_json::from_str(&line).unwrap());
        }

        self.server.await.unwrap();
        remaining
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stdio_initialize_and_list_tools() {
    let mut client = StdioClient::start();

    let initialize = client
        .request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2025-03-26" }
        }))
        .await;
    assert_eq!(initialize["id"], 1);
    assert_eq!(initialize["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(
        initialize["result"]["serverInfo"]["name"],
        "SimpleBLE MCP Server"
    );
    assert_eq!(
        initialize["result"]["capabilities"]["tools"]["listChanged"],
        false
    );

    client
        .send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await;

    let tools = client
        .request(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }))
        .await;
    assert_eq!(tools["id"], 2);
    assert_eq!(tools["result"]["tools"].as_array().unwrap().len(), 7);

    let ping = client
        .request(json!({ "jsonrpc": "2.0", "id": 3, "method": "ping" }))
        .await;
    assert_eq!(ping, json!({ "jsonrpc": "2.0", "id": 3, "result": {} }));

    assert!(client.finish().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stdio_tool_calls() {
    let mut client = StdioClient::start();

    let failed = client
        .call_tool(1, "connect", json!({ "address": ADDRESS }))
        .await;
    assert_eq!(failed["id"], 1);
    assert_eq!(failed["result"]["isError"], true);
    assert_eq!(failed["result"]["structuredContent"]["code"], "BR_0003");

    let scanned = client.call_tool(2, "scan_for", json!({})).await;
    assert_eq!(scanned["result"]["isError"], false);
    assert_eq!(
        scanned["result"]["structuredContent"]["result"][0]["address"],
        ADDRESS
    );

    let connected = client
        .call_tool(3, "connect", json!({ "address": ADDRESS }))
        .await;
    let connected = &connected["result"];
    assert_eq!(connected["isError"], false);
    let expected = json!({ "message": "Connected to Plain Peripheral", "address": ADDRESS });
    assert_eq!(connected["structuredContent"], expected);
    assert_eq!(connected["content"][0]["type"], "text");
    assert_eq!(
        serde_json::from_str::<Value>(connected["content"][0]["text"].as_str().unwrap()).unwrap(),
        expected
    );

    assert!(client.finish().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stdio_long_tool_call_does_not_block_other_requests() {
    let mut client = StdioClient::start();
    client.call_tool(1, "scan_for", json!({})).await;
    client
        .call_tool(2, "connect", json!({ "address": ADDRESS }))
        .await;

    client
        .send(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "notify",
                "arguments": {
                    "address": ADDRESS,
                    "service_uuid": SERVICE,
                    "char_uuid": CHARACTERISTIC,
                    "duration_ms": 500
                }
            }
        }))
        .await;
    client
        .send(json!({ "jsonrpc": "2.0", "id": 4, "method": "ping" }))
        .await;

    let first = client.receive().await;
    assert_eq!(first["id"], 4);

    let second = client.receive().await;
    assert_eq!(second["id"], 3);
    assert_eq!(second["result"]["isError"], false);
    assert!(
        !second["result"]["structuredContent"]["result"]
            .as_array()
            .unwrap()
            .is_empty()
    );

    assert!(client.finish().await.is_empty());
}

#[tokio::test]
async fn test_stdio_protocol_errors() {
    let mut client = StdioClient::start();

    client.send_raw("{not json").await;
    let parse_error = client.receive().await;
    assert_eq!(parse_error["id"], Value::Null);
    assert_eq!(parse_error["error"]["code"], -32700);

    client.send_raw("").await;

    let version = client
        .request(json!({ "jsonrpc": "1.0", "id": 1, "method": "ping" }))
        .await;
    assert_eq!(version["error"]["code"], -32600);

    let method = client
        .request(json!({ "jsonrpc": "2.0", "id": 2, "method": "resources/list" }))
        .await;
    assert_eq!(method["error"]["code"], -32601);

    let params = client
        .request(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "arguments": {} }
        }))
        .await;
    assert_eq!(params["error"]["code"], -32602);

    assert!(client.finish().await.is_empty());
}
