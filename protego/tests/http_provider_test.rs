//! JSON-RPC over HTTP provider against a mock node.

use std::sync::Arc;

use ethers::types::Address;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use protego::network::{ensure_chain, ChainSwitch};
use protego::provider::http::TRANSPORT_ERROR;
use protego::provider::METHOD_NOT_FOUND;
use protego::*;

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {"code": code, "message": message}
    }))
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_chain_id_over_http() {
    let server = MockServer::start().await;
    mount(&server, "eth_chainId", rpc_result(json!("0x530"))).await;

    let gateway = ProviderGateway::new(Arc::new(HttpProvider::new(&server.uri())));
    assert_eq!(gateway.chain_id().await.unwrap(), 1328);
}

#[tokio::test]
async fn test_request_accounts_falls_back_to_eth_accounts() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_requestAccounts",
        rpc_error(METHOD_NOT_FOUND, "the method eth_requestAccounts does not exist"),
    )
    .await;
    mount(
        &server,
        "eth_accounts",
        rpc_result(json!(["0x1111111111111111111111111111111111111111"])),
    )
    .await;

    let gateway = ProviderGateway::new(Arc::new(HttpProvider::new(&server.uri())));
    let accounts = gateway.request_accounts().await.unwrap();
    assert_eq!(accounts, vec![Address::repeat_byte(0x11)]);
}

#[tokio::test]
async fn test_rpc_error_object_is_mapped() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", rpc_error(4001, "User denied transaction signature")).await;

    let provider = HttpProvider::new(&server.uri());
    let err = provider
        .request("eth_sendTransaction", json!([{}]))
        .await
        .unwrap_err();
    assert!(err.is_user_rejection());

    let mapped: ProtegoError = err.into();
    assert!(matches!(mapped, ProtegoError::UserRejected(_)));
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(&server.uri());
    let err = provider.request("eth_chainId", json!([])).await.unwrap_err();
    assert_eq!(err.code, TRANSPORT_ERROR);
    assert!(err.message.contains("502"));
}

#[tokio::test]
async fn test_switch_emits_chain_changed() {
    let server = MockServer::start().await;
    mount(&server, "wallet_switchEthereumChain", rpc_result(json!(null))).await;

    let provider = Arc::new(HttpProvider::new(&server.uri()));
    let gateway = ProviderGateway::new(provider.clone());
    let mut sub = gateway.subscribe(&[EventKind::ChainChanged]);
    assert_eq!(provider.listener_count(), 1);

    gateway.switch_chain(1328).await.unwrap();

    assert_eq!(sub.next().await, Some(ProviderEvent::ChainChanged(1328)));
    drop(sub);
    assert_eq!(provider.listener_count(), 0);
}

#[tokio::test]
async fn test_account_change_detected_between_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_accounts"})))
        .respond_with(rpc_result(json!(["0x1111111111111111111111111111111111111111"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "eth_accounts",
        rpc_result(json!(["0x2222222222222222222222222222222222222222"])),
    )
    .await;

    let provider = HttpProvider::new(&server.uri());
    let mut events = provider.events();
    provider.request("eth_accounts", json!([])).await.unwrap();
    provider.request("eth_accounts", json!([])).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        ProviderEvent::AccountsChanged(vec![Address::repeat_byte(0x22)])
    );
}

#[tokio::test]
async fn test_unknown_chain_registered_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_chainId"})))
        .respond_with(rpc_result(json!("0x1")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "eth_chainId", rpc_result(json!("0x530"))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "wallet_switchEthereumChain"})))
        .respond_with(rpc_error(4902, "Unrecognized chain ID"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "wallet_switchEthereumChain", rpc_result(json!(null))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "wallet_addEthereumChain",
            "params": [{
                "chainId": "0x530",
                "chainName": "Sei Testnet",
                "nativeCurrency": {"name": "SEI", "symbol": "SEI", "decimals": 18}
            }]
        })))
        .respond_with(rpc_result(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ProviderGateway::new(Arc::new(HttpProvider::new(&server.uri())));
    let outcome = ensure_chain(&gateway, &protego::config::sei_testnet()).await.unwrap();
    assert_eq!(outcome, ChainSwitch::Registered);
}
