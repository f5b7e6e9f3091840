//! JSON-RPC gateway against a local mock node.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wallet_shell::config::ProviderConfig;
use wallet_shell::lifecycle::Shutdown;
use wallet_shell::provider::{
    ProviderError, ProviderEvent, ProviderGateway, RpcGateway, RpcMethod, WalletClient,
};

mod common;

const ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn config(primary: String, failovers: Vec<String>) -> ProviderConfig {
    ProviderConfig {
        rpc_url: primary,
        failover_urls: failovers,
        event_poll_interval_ms: 50,
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn test_typed_calls_through_node() {
    let (addr, _) = common::start_rpc_node(|method, _params| match method {
        "eth_chainId" => Ok(json!("0x89")),
        "eth_accounts" => Ok(json!([ACCOUNT])),
        "eth_getBalance" => Ok(json!("0xde0b6b3a7640000")),
        other => Err((-32601, format!("method {other} not found"))),
    })
    .await;

    let gateway = RpcGateway::new(config(format!("http://{addr}"), vec![])).unwrap();
    let client = WalletClient::new(Arc::new(gateway));

    assert_eq!(client.chain_id().await.unwrap(), "0x89");
    // Node wallets never prompt: eth_requestAccounts is answered by eth_accounts.
    let accounts = client.request_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    let balance = client.get_balance(accounts[0]).await.unwrap();
    assert_eq!(balance.to_string(), "1000000000000000000");
}

#[tokio::test]
async fn test_rpc_error_is_not_retried_elsewhere() {
    let (primary, _) = common::start_rpc_node(|_, _| Err((4001, "User denied".to_string()))).await;
    let (failover, failover_hits) = common::start_rpc_node(|_, _| Ok(json!("0x1"))).await;

    let gateway = RpcGateway::new(config(
        format!("http://{primary}"),
        vec![format!("http://{failover}")],
    ))
    .unwrap();

    let err = gateway
        .request(RpcMethod::SendTransaction, json!([{}]))
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::rpc(4001, "User denied"));
    assert_eq!(failover_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failover_on_dead_primary() {
    let dead = common::dead_address().await;
    let (failover, hits) = common::start_rpc_node(|_, _| Ok(json!("0xa"))).await;

    let gateway = RpcGateway::new(config(
        format!("http://{dead}"),
        vec![format!("http://{failover}")],
    ))
    .unwrap();

    let chain: Value = gateway.request(RpcMethod::ChainId, json!([])).await.unwrap();
    assert_eq!(chain, json!("0xa"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_event_watcher_reports_chain_switch() {
    let switched = Arc::new(AtomicBool::new(false));
    let flag = switched.clone();
    let (addr, _) = common::start_rpc_node(move |method, _| match method {
        "eth_accounts" => Ok(json!([ACCOUNT])),
        "eth_chainId" if flag.load(Ordering::SeqCst) => Ok(json!("0xa4b1")),
        "eth_chainId" => Ok(json!("0x1")),
        _ => Ok(Value::Null),
    })
    .await;

    let gateway = RpcGateway::new(config(format!("http://{addr}"), vec![])).unwrap();
    let mut events = gateway.subscribe();
    let shutdown = Shutdown::new();
    let watcher = gateway.spawn_event_watcher(shutdown.subscribe());

    tokio::time::sleep(Duration::from_millis(200)).await;
    switched.store(true, Ordering::SeqCst);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event")
        .unwrap();
    assert_eq!(event, ProviderEvent::ChainChanged("0xa4b1".into()));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher did not stop")
        .unwrap();
}
