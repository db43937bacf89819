//! Integration tests for the star registry API endpoints

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use starregistry::api::{build_api_router, Node};
use starregistry::blockchain::Blockchain;
use starregistry::clock::ManualClock;
use starregistry::crypto::{KeyPair, Secp256k1Verifier};

const T0: i64 = 1_700_000_000;

fn test_server() -> (TestServer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let blockchain = Blockchain::new(Arc::new(Secp256k1Verifier), clock.clone())
        .expect("Failed to create blockchain");
    let node = Arc::new(Node::new(blockchain));
    let server = TestServer::new(build_api_router(node)).expect("Failed to create test server");
    (server, clock)
}

fn star() -> Value {
    json!({ "dec": "68° 52' 56.9", "ra": "16h 29m 1.0s", "story": "Testing the story 4" })
}

#[tokio::test]
async fn test_system_endpoints() {
    let (server, _) = test_server();

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");

    let response = server.get("/api/chain/height").await;
    assert_eq!(response.status_code(), 200);
    let height: u64 = response.json();
    assert_eq!(height, 0);

    let response = server.get("/api/block/height/0").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["height"], 0);
    assert!(json["hash"].is_string());
    assert!(json["body"].is_string());
    assert!(json.get("previousBlockHash").is_none());

    let response = server.get("/api/block/height/999").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server.get("/api/validate").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["errors"], json!([]));
}

#[tokio::test]
async fn test_register_star_flow() {
    let (server, clock) = test_server();
    let owner = KeyPair::generate();
    let address = owner.address_hex();

    let genesis: Value = server.get("/api/block/height/0").await.json();

    let response = server
        .post("/api/requestValidation")
        .json(&json!({ "address": address }))
        .await;
    assert_eq!(response.status_code(), 200);
    let message = response.json::<Value>()["message"]
        .as_str()
        .expect("message")
        .to_string();
    assert_eq!(message, format!("{}:{}:starRegistry", address, T0));

    clock.advance(30);
    let signature = owner.sign_message(&message);
    let response = server
        .post("/api/submitstar")
        .json(&json!({
            "address": address,
            "message": message,
            "signature": signature,
            "star": star(),
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let block: Value = response.json();
    assert_eq!(block["height"], 1);
    assert_eq!(block["time"], T0 + 30);
    assert_eq!(block["previousBlockHash"], genesis["hash"]);

    let hash = block["hash"].as_str().expect("hash");
    let response = server.get(&format!("/api/block/hash/{}", hash)).await;
    assert_eq!(response.status_code(), 200);
    let fetched: Value = response.json();
    assert_eq!(fetched, block);

    let response = server.get(&format!("/api/blocks/{}", address)).await;
    assert_eq!(response.status_code(), 200);
    let stars: Value = response.json();
    assert_eq!(stars, json!([star()]));

    let json: Value = server.get("/api/stats").await.json();
    assert_eq!(json["challenges_issued"], 1);
    assert_eq!(json["stars_registered"], 1);
    assert_eq!(json["chain_height"], 1);
}

#[tokio::test]
async fn test_rejected_submissions() {
    let (server, clock) = test_server();
    let owner = KeyPair::generate();
    let impostor = KeyPair::generate();
    let address = owner.address_hex();
    let message = format!("{}:{}:starRegistry", address, T0);

    let response = server
        .post("/api/submitstar")
        .json(&json!({
            "address": address,
            "message": message,
            "signature": impostor.sign_message(&message),
            "star": star(),
        }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server
        .post("/api/submitstar")
        .json(&json!({
            "address": address,
            "message": "no-timestamp-here",
            "signature": owner.sign_message("no-timestamp-here"),
            "star": star(),
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    clock.advance(301);
    let response = server
        .post("/api/submitstar")
        .json(&json!({
            "address": address,
            "message": message,
            "signature": owner.sign_message(&message),
            "star": star(),
        }))
        .await;
    assert_eq!(response.status_code(), 401);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("expired"));

    let response = server
        .post("/api/requestValidation")
        .json(&json!({ "address": "  " }))
        .await;
    assert_eq!(response.status_code(), 400);

    let height: u64 = server.get("/api/chain/height").await.json();
    assert_eq!(height, 0);

    let json: Value = server.get("/api/stats").await.json();
    assert_eq!(json["stars_rejected"], 3);
}
