//! End-to-end tests of `NetworkTransport` against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread, then
//! drives every pipeline shape over real loopback HTTP through reqwest.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mock_server::Message;
use netclient_core::{
    CancellationToken, HttpHeaders, NetClient, NetClientError, NetworkConfig, NetworkTransport,
    Url,
};
use serde::Serialize;

#[derive(Serialize)]
struct Greeting {
    firstname: String,
}

/// Start the mock server and return its base URL.
fn start_server() -> Url {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    Url::parse(&format!("http://{addr}")).unwrap()
}

fn network_client() -> (NetClient, NetworkTransport) {
    let transport = NetworkTransport::new().unwrap();
    (NetClient::new(Arc::new(transport.clone())), transport)
}

#[tokio::test]
async fn get_post_delete_round_trips() {
    let base = start_server();
    let (client, _) = network_client();

    let raw = client.get(&base.join("/get").unwrap()).await.unwrap();
    let msg: Message = serde_json::from_slice(&raw).unwrap();
    assert_eq!(msg, Message::new("GET response"));

    let msg: Message = client.get_decoded(&base.join("/get").unwrap()).await.unwrap();
    assert_eq!(msg.message, "GET response");

    let body = Greeting {
        firstname: "James".to_string(),
    };
    let msg: Message = client.post(&base.join("/post").unwrap(), &body).await.unwrap();
    assert_eq!(msg.message, "POST response for James");

    let raw = client.delete(&base.join("/delete").unwrap()).await.unwrap();
    let msg: Message = serde_json::from_slice(&raw).unwrap();
    assert_eq!(msg.message, "DELETE response");
}

#[tokio::test]
async fn non_200_statuses_are_invalid() {
    let base = start_server();
    let (client, _) = network_client();

    for code in [300, 401, 404, 500] {
        let url = base.join(&format!("/status/{code}")).unwrap();
        let err = client.get(&url).await.unwrap_err();
        assert_eq!(err, NetClientError::InvalidServerResponse, "status {code}");
    }

    let ok = base.join("/status/200").unwrap();
    assert!(client.get(&ok).await.is_ok());
}

#[tokio::test]
async fn default_and_caller_headers_reach_the_server() {
    let base = start_server();
    let (client, _) = network_client();
    let url = base.join("/headers").unwrap();

    let echoed: BTreeMap<String, String> = client.get_decoded(&url).await.unwrap();
    assert_eq!(echoed.get("accept").map(String::as_str), Some("application/json"));
    assert_eq!(echoed.get("content-type").map(String::as_str), Some("application/json"));

    let headers = HttpHeaders::from([("Accept".to_string(), "text/plain".to_string())]);
    let echoed: BTreeMap<String, String> =
        client.get_decoded_with_headers(&url, &headers).await.unwrap();
    assert_eq!(echoed.get("accept").map(String::as_str), Some("text/plain"));
    assert_eq!(echoed.get("content-type").map(String::as_str), Some("application/json"));
}

#[tokio::test]
async fn adaptive_send_prefers_regular_endpoint() {
    let base = start_server();
    let (client, _) = network_client();

    let msg: Message = client
        .adaptive_send_decoded(
            &base.join("/regulardata").unwrap(),
            &base.join("/lowdata").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(msg.message, "Regular data response");
}

#[tokio::test]
async fn adaptive_send_falls_back_on_constrained_path() {
    let base = start_server();
    let (client, transport) = network_client();
    transport.network_path().set_constrained(true);

    let msg: Message = client
        .adaptive_send_decoded(
            &base.join("/regulardata").unwrap(),
            &base.join("/lowdata").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(msg.message, "Low data response");
}

#[tokio::test]
async fn plain_requests_ignore_constrained_path() {
    let base = start_server();
    let (client, transport) = network_client();
    transport.network_path().set_constrained(true);

    let msg: Message = client.get_decoded(&base.join("/get").unwrap()).await.unwrap();
    assert_eq!(msg.message, "GET response");
}

#[tokio::test]
async fn refused_connection_is_connectivity_failure() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (client, _) = network_client();
    let url = Url::parse(&format!("http://127.0.0.1:{port}/get")).unwrap();

    let err = client.get(&url).await.unwrap_err();
    assert!(
        matches!(err, NetClientError::ConnectivityFailure { cause: Some(_), .. }),
        "got {err:?}"
    );

    let err = client
        .adaptive_send(&url, &Url::parse(&format!("http://127.0.0.1:{port}/lowdata")).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, NetClientError::ConnectivityFailure { .. }));
}

#[tokio::test]
async fn request_timeout_is_connectivity_failure() {
    let base = start_server();
    let config = NetworkConfig {
        request_timeout: Duration::from_millis(200),
        ..NetworkConfig::default()
    };
    let client = NetClient::new(Arc::new(NetworkTransport::with_config(&config).unwrap()));

    let err = client.get(&base.join("/slow").unwrap()).await.unwrap_err();
    assert!(matches!(err, NetClientError::ConnectivityFailure { .. }), "got {err:?}");
}

#[tokio::test]
async fn cancelling_a_slow_request_stops_it() {
    let base = start_server();
    let (client, _) = network_client();
    let token = CancellationToken::new();
    let client = client.with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.get(&base.join("/slow").unwrap()),
    )
    .await
    .expect("cancellation did not interrupt the request");
    assert_eq!(result.unwrap_err(), NetClientError::Cancelled);
}
