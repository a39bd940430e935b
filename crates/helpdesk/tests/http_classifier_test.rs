//! HTTP classifier gateway against a mock model endpoint.
//!
//! Uses [`wiremock`] so the full request/response path runs without a real
//! model server, then checks how intake absorbs each failure mode.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpdesk::classifier::HttpClassifier;
use ticketing::intake::{IntakeConfig, IntakeEngine};
use ticketing::registry::TeamRegistry;
use ticketing::router::Classifier;
use ticketing::state::{MemoryStore, SharedStore};

fn classifier_for(server: &MockServer) -> HttpClassifier {
    HttpClassifier::new(format!("{}/predict", server.uri()), Duration::from_secs(2)).unwrap()
}

/// Intake over a store with Finance owning Billing plus the fallback team
fn intake_with(classifier: HttpClassifier) -> (IntakeEngine, SharedStore) {
    let store: SharedStore = MemoryStore::new().shared();
    let registry = TeamRegistry::new(store.clone());
    registry.create_team("Finance", Some("Billing")).unwrap();
    registry.create_team("Other", None).unwrap();
    let intake = IntakeEngine::new(store.clone(), Arc::new(classifier), IntakeConfig::default());
    (intake, store)
}

#[tokio::test]
async fn classify_posts_text_and_reads_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({"text": "I was charged twice"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "Billing"})))
        .expect(1)
        .mount(&server)
        .await;

    let label = classifier_for(&server)
        .classify("I was charged twice")
        .await
        .unwrap();
    assert_eq!(label, "Billing");
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let err = classifier_for(&server).classify("hello").await.unwrap_err();
    assert!(err.reason.contains("500"), "reason: {}", err.reason);
    assert!(err.reason.contains("model not loaded"));
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let err = classifier_for(&server).classify("hello").await.unwrap_err();
    assert!(err.reason.contains("parse"), "reason: {}", err.reason);
}

#[tokio::test]
async fn unknown_shape_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"scores": [0.1, 0.9]})))
        .mount(&server)
        .await;

    let err = classifier_for(&server).classify("hello").await.unwrap_err();
    assert!(err.reason.contains("no label"));
}

#[tokio::test]
async fn zero_timeout_means_unbounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "Delivery"}))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let classifier =
        HttpClassifier::new(format!("{}/predict", server.uri()), Duration::ZERO).unwrap();
    assert_eq!(classifier.classify("parcel lost").await.unwrap(), "Delivery");
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    let server = MockServer::start().await;
    let url = format!("{}/predict", server.uri());
    drop(server);

    let classifier = HttpClassifier::new(url, Duration::from_millis(500)).unwrap();
    assert!(classifier.classify("hello").await.is_err());
}

#[tokio::test]
async fn intake_routes_remote_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["Billing"])))
        .mount(&server)
        .await;

    let (intake, store) = intake_with(classifier_for(&server));
    let receipt = intake.ingest("whatsapp:+15550001", "refund please").await.unwrap();

    assert!(receipt.classified);
    assert_eq!(receipt.category, "Billing");
    assert_eq!(receipt.routing_team, "Finance");
    let ticket = store.get_ticket(receipt.ticket_id).unwrap().unwrap();
    assert_eq!(ticket.text, "refund please");
}

#[tokio::test]
async fn intake_survives_classifier_outage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (intake, _store) = intake_with(classifier_for(&server));
    let receipt = intake.ingest("whatsapp:+15550001", "hello?").await.unwrap();

    assert!(!receipt.classified);
    assert_eq!(receipt.category, "Unclassified");
    assert_eq!(receipt.routing_team, "Other");
    assert_eq!(receipt.acknowledgement, IntakeConfig::default().acknowledgement);
}
