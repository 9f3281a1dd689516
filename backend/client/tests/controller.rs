use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use client::{
    ClientError, ContactController,
    ui::{Banner, BannerKind, ContactForm},
};
use contact::{ContactSubmission, messages};
use serde_json::{Value, json};

#[derive(Default)]
struct RecordingForm {
    fields: ContactSubmission,
    submitting: Vec<bool>,
    banners: Vec<Banner>,
    resets: usize,
}

impl RecordingForm {
    fn with(name: &str, email: &str, subject: &str, message: &str) -> Self {
        Self {
            fields: ContactSubmission::new(name, email, subject, message),
            ..Default::default()
        }
    }
}

impl ContactForm for RecordingForm {
    fn fields(&self) -> ContactSubmission {
        self.fields.clone()
    }

    fn reset(&mut self) {
        self.fields = ContactSubmission::default();
        self.resets += 1;
    }

    fn set_submitting(&mut self, submitting: bool) {
        self.submitting.push(submitting);
    }

    fn show_message(&mut self, banner: Banner) {
        self.banners.push(banner);
    }
}

type Received = Arc<Mutex<Vec<Value>>>;

/// Stub relay answering every POST with a fixed status and body.
async fn stub_relay(status: StatusCode, reply: Value) -> (SocketAddr, Received) {
    let received: Received = Arc::default();

    let app = Router::new()
        .route(
            "/send",
            post(
                move |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().unwrap().push(body);
                    (status, Json(reply))
                },
            ),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve stub") });

    (addr, received)
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}/send")
}

#[tokio::test]
async fn sends_trimmed_payload_once_and_clears_form() {
    let (addr, received) = stub_relay(
        StatusCode::OK,
        json!({ "success": true, "message": "ok" }),
    )
    .await;
    let controller = ContactController::new(endpoint(addr));
    let mut form = RecordingForm::with("  Jo ", " jo@x.com ", " Hi! ", " Loved your portfolio work \n");

    let sent = controller.submit(&mut form).await.expect("accepted");
    assert!(sent.success);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let body = &received[0];
    assert_eq!(body["name"], "Jo");
    assert_eq!(body["email"], "jo@x.com");
    assert_eq!(body["subject"], "Hi!");
    assert_eq!(body["message"], "Loved your portfolio work");
    assert_eq!(body["_replyto"], "jo@x.com");
    assert!(body["_subject"].as_str().unwrap().contains("Jo"));

    assert_eq!(form.submitting, vec![true, false]);
    assert_eq!(form.resets, 1);
    assert_eq!(form.fields, ContactSubmission::default());
    assert_eq!(form.banners.len(), 1);
    assert_eq!(form.banners[0].kind, BannerKind::Success);
    assert_eq!(form.banners[0].text, messages::SUCCESS);
    assert_eq!(form.banners[0].dismiss_after.as_secs(), 5);
}

#[tokio::test]
async fn short_name_is_reported_without_network_call() {
    let (addr, received) = stub_relay(StatusCode::OK, json!({})).await;
    let controller = ContactController::new(endpoint(addr));
    let mut form = RecordingForm::with("J", "jo@x.com", "Hi!", "Loved your portfolio work");

    let result = controller.submit(&mut form).await;

    assert!(matches!(result, Err(ClientError::Invalid(_))));
    assert!(received.lock().unwrap().is_empty());
    assert!(form.submitting.is_empty());
    assert_eq!(
        form.banners,
        vec![Banner::error("Nombre inválido (mínimo 2 caracteres).")]
    );
}

#[tokio::test]
async fn first_failed_rule_wins() {
    let controller = ContactController::new("http://127.0.0.1:9/send");
    let cases = [
        (RecordingForm::with("J", "bad", "x", "short"), "Nombre inválido (mínimo 2 caracteres)."),
        (RecordingForm::with("Jo", "bad", "x", "short"), "Email inválido."),
        (RecordingForm::with("Jo", "jo@x.com", "x", "short"), "Asunto inválido (mínimo 3 caracteres)."),
        (RecordingForm::with("Jo", "jo@x.com", "Hi!", "short"), "Mensaje muy corto (mínimo 10 caracteres)."),
        (RecordingForm::with("   ", "jo@x.com", "Hi!", "Loved your portfolio work"), "Nombre inválido (mínimo 2 caracteres)."),
    ];

    for (mut form, expected) in cases {
        let submission = form.fields();
        assert!(!controller.validate(&submission, &mut form));
        assert_eq!(form.banners.len(), 1);
        assert_eq!(form.banners[0].text, expected);
    }
}

#[test]
fn validate_trims_before_checking() {
    let controller = ContactController::new("http://127.0.0.1:9/send");

    let mut form = RecordingForm::default();
    let padded = ContactSubmission::new("J ", " jo@x.com", "Hi!", "Loved your portfolio work");
    assert!(!controller.validate(&padded, &mut form));
    assert_eq!(
        form.banners,
        vec![Banner::error("Nombre inválido (mínimo 2 caracteres).")]
    );

    let mut form = RecordingForm::default();
    let padded = ContactSubmission::new(" Jo ", " jo@x.com ", " Hi! ", " Loved your portfolio work ");
    assert!(controller.validate(&padded, &mut form));
    assert!(form.banners.is_empty());
}

#[tokio::test]
async fn shows_server_error_text_verbatim() {
    let (addr, _) = stub_relay(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "success": false, "message": messages::QUOTA_EXCEEDED }),
    )
    .await;
    let controller = ContactController::new(endpoint(addr));
    let mut form = RecordingForm::with("Jo", "jo@x.com", "Hi!", "Loved your portfolio work");

    let result = controller.submit(&mut form).await;

    match result {
        Err(ClientError::Rejected { status, message }) => {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(message, messages::QUOTA_EXCEEDED);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(form.submitting, vec![true, false]);
    assert_eq!(form.resets, 0);
    assert_eq!(form.banners, vec![Banner::error(messages::QUOTA_EXCEEDED)]);
}

#[tokio::test]
async fn falls_back_to_generic_failure() {
    let (addr, _) = stub_relay(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
    let controller = ContactController::new(endpoint(addr));
    let mut form = RecordingForm::with("Jo", "jo@x.com", "Hi!", "Loved your portfolio work");

    assert!(controller.submit(&mut form).await.is_err());
    assert_eq!(form.banners, vec![Banner::error(messages::SEND_FAILED)]);
}

#[tokio::test]
async fn unreachable_relay_reports_connectivity() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let controller = ContactController::new(endpoint(addr));
    let mut form = RecordingForm::with("Jo", "jo@x.com", "Hi!", "Loved your portfolio work");

    let result = controller.submit(&mut form).await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
    assert_eq!(form.submitting, vec![true, false]);
    assert_eq!(form.resets, 0);
    assert_eq!(form.banners, vec![Banner::error(messages::CONNECTION_FAILED)]);
}
