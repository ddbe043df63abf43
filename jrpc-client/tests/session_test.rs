//! Client session integration tests: single calls, notifications, batches
//! and audit recording over a scripted transport

mod common;

use common::{MemorySink, ScriptedTransport};
use jrpc_client::{ClientBuilder, JrpcClient};
use jrpc_core::{Error, Id};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
struct Subtract {
    minuend: i64,
    subtrahend: i64,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Account {
    name: String,
    balance: i64,
}

#[tokio::test]
async fn test_single_call_round_trip() {
    let transport = ScriptedTransport::new().reply(r#"{"jsonrpc":"2.0","result":19,"id":1}"#);
    let mut client = JrpcClient::new(transport.clone());

    let call = client.call("subtract", (42, 23)).await.unwrap();

    assert_eq!(call.id, Some(Id::Number(1)));
    assert_eq!(call.result, Some(json!(19)));
    assert_eq!(
        transport.sent(),
        vec![json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1})]
    );
}

#[tokio::test]
async fn test_named_params_and_typed_result() {
    let transport = ScriptedTransport::new()
        .reply(r#"{"jsonrpc":"2.0","result":19,"id":1}"#)
        .reply(r#"{"jsonrpc":"2.0","result":{"name":"main","balance":5},"id":2}"#);
    let mut client = JrpcClient::new(transport.clone());

    let difference: i64 = client
        .request("subtract", Subtract { minuend: 42, subtrahend: 23 })
        .await
        .unwrap();
    assert_eq!(difference, 19);

    let account: Account = client.request("account", ()).await.unwrap();
    assert_eq!(account, Account { name: "main".into(), balance: 5 });

    let sent = transport.sent();
    assert_eq!(sent[0]["params"], json!({"minuend": 42, "subtrahend": 23}));
    assert!(sent[1].get("params").is_none());
    assert_eq!(sent[1]["id"], 2);
}

#[tokio::test]
async fn test_error_response() {
    let transport = ScriptedTransport::new().reply(
        r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found","detail":null},"id":1}"#,
    );
    let mut client = JrpcClient::new(transport);

    let call = client.call("missing", ()).await.unwrap();
    assert!(call.has_error());
    assert_eq!(call.error.as_ref().unwrap().code, -32601);

    let err = call.into_result::<i64>().unwrap_err();
    assert!(matches!(err, Error::JsonRpc(ref e) if e.message == "Method not found"));
}

#[tokio::test]
async fn test_notification_expects_no_body() {
    let transport = ScriptedTransport::new().reply("");
    let mut client = JrpcClient::new(transport.clone());

    client.notify("update", [1, 2, 3]).await.unwrap();

    assert_eq!(
        transport.sent(),
        vec![json!({"jsonrpc": "2.0", "method": "update", "params": [1, 2, 3]})]
    );
}

#[tokio::test]
async fn test_unusable_body_fails_single_call() {
    let transport = ScriptedTransport::new().reply("").reply("<html>bad gateway</html>");
    let mut client = JrpcClient::new(transport);

    assert!(matches!(
        client.call("ping", ()).await,
        Err(Error::InvalidResponse(_))
    ));
    assert!(matches!(
        client.call("ping", ()).await,
        Err(Error::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_batch_commit() {
    let transport = ScriptedTransport::new().reply(
        r#"[
            {"jsonrpc":"2.0","result":["hello",5],"id":3},
            {"jsonrpc":"2.0","result":7,"id":1},
            {"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found","detail":null},"id":2}
        ]"#,
    );
    let mut client = JrpcClient::new(transport.clone());

    assert!(client.begin_batch());
    assert!(!client.begin_batch());

    let pending = client.call("sum", [1, 2, 4]).await.unwrap();
    assert!(pending.is_pending());
    client.notify("notify_hello", [7]).await.unwrap();
    client.call("foo.get", json!({"name": "myself"})).await.unwrap();
    client.call("get_data", ()).await.unwrap();
    assert_eq!(client.pending(), 4);
    assert_eq!(transport.send_count(), 0);

    let calls = client.commit_batch().await.unwrap().unwrap();
    assert!(!client.is_batching());
    assert_eq!(transport.send_count(), 1);

    let sent = &transport.sent()[0];
    let sent = sent.as_array().unwrap();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[3], json!({"jsonrpc": "2.0", "method": "notify_hello", "params": [7]}));

    assert_eq!(calls[0].result, Some(json!(7)));
    assert_eq!(calls[1].error.as_ref().unwrap().code, -32601);
    assert_eq!(calls[2].result, Some(json!(["hello", 5])));
    assert!(calls[3].is_notification());
    assert!(calls[3].is_pending());
}

#[tokio::test]
async fn test_commit_with_nothing_queued() {
    let transport = ScriptedTransport::new();
    let mut client = JrpcClient::new(transport.clone());

    assert!(client.commit_batch().await.unwrap().is_none());

    client.begin_batch();
    assert!(client.commit_batch().await.unwrap().is_none());
    assert!(!client.is_batching());
    assert_eq!(transport.send_count(), 0);
}

#[tokio::test]
async fn test_rollback_sends_nothing() {
    let transport = ScriptedTransport::new();
    let mut client = JrpcClient::new(transport.clone());

    client.begin_batch();
    client.call("a", ()).await.unwrap();
    client.notify("b", ()).await.unwrap();
    assert!(client.rollback_batch());

    assert!(!client.is_batching());
    assert_eq!(client.pending(), 0);
    assert!(client.commit_batch().await.unwrap().is_none());
    assert_eq!(transport.send_count(), 0);
}

#[tokio::test]
async fn test_transport_failure_on_commit() {
    let transport = ScriptedTransport::new()
        .fail("connection refused")
        .reply(r#"{"jsonrpc":"2.0","result":"pong","id":3}"#);
    let mut client = JrpcClient::new(transport.clone());

    client.begin_batch();
    client.call("a", ()).await.unwrap();
    client.call("b", ()).await.unwrap();

    let err = client.commit_batch().await.unwrap_err();
    assert!(matches!(err, Error::Transport(ref msg) if msg == "connection refused"));
    assert!(!client.is_batching());

    let pong: String = client.request("ping", ()).await.unwrap();
    assert_eq!(pong, "pong");
}

#[tokio::test]
async fn test_request_refused_while_batching() {
    let mut client = JrpcClient::new(ScriptedTransport::new());
    client.begin_batch();

    let err = client.request::<_, i64>("sum", [1, 2]).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[tokio::test]
async fn test_strict_correlation() {
    let body = r#"[{"jsonrpc":"2.0","result":1,"id":1},{"jsonrpc":"2.0","result":2,"id":42}]"#;

    let mut lenient = JrpcClient::new(ScriptedTransport::new().reply(body));
    lenient.begin_batch();
    lenient.call("a", ()).await.unwrap();
    let calls = lenient.commit_batch().await.unwrap().unwrap();
    assert_eq!(calls[0].result, Some(json!(1)));

    let mut strict = ClientBuilder::new(ScriptedTransport::new().reply(body))
        .strict_correlation(true)
        .build()
        .unwrap();
    strict.begin_batch();
    strict.call("a", ()).await.unwrap();
    let err = strict.commit_batch().await.unwrap_err();
    assert!(matches!(err, Error::UnmatchedResponse(ref ids) if ids == "42"));
    assert!(!strict.is_batching());
}

#[tokio::test]
async fn test_ids_are_per_session() {
    let first = ScriptedTransport::new().reply(r#"{"jsonrpc":"2.0","result":null,"id":1}"#);
    let second = ScriptedTransport::new().reply(r#"{"jsonrpc":"2.0","result":null,"id":1}"#);

    let mut a = JrpcClient::new(first.clone());
    let mut b = JrpcClient::new(second.clone());
    a.call("x", ()).await.unwrap();
    b.call("x", ()).await.unwrap();

    assert_eq!(first.sent()[0]["id"], 1);
    assert_eq!(second.sent()[0]["id"], 1);
}

#[tokio::test]
async fn test_exchanges_are_audited() {
    let sink = MemorySink::default();
    let transport = ScriptedTransport::new()
        .reply(r#"{"jsonrpc":"2.0","result":19,"id":1}"#)
        .fail("timed out");
    let mut client = ClientBuilder::new(transport)
        .audit_sink(sink.clone())
        .service_name("Billing")
        .build()
        .unwrap();

    client.call("subtract", (42, 23)).await.unwrap();
    assert!(client.call("subtract", (1, 1)).await.is_err());

    let exchanges = sink.exchanges();
    assert_eq!(exchanges.len(), 2);

    assert_eq!(exchanges[0].service, "Billing");
    assert_eq!(
        exchanges[0].request_body,
        r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#
    );
    assert_eq!(exchanges[0].response_body, r#"{"jsonrpc":"2.0","result":19,"id":1}"#);
    assert_eq!(
        exchanges[0].request_headers,
        vec![("Content-Type".to_string(), "application/json".to_string())]
    );
    assert!(exchanges[0].error_message.is_none());

    assert!(exchanges[1].response_body.is_empty());
    assert_eq!(
        exchanges[1].error_message.as_deref(),
        Some("Transport error: timed out")
    );
}
