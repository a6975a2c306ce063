#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{ScriptedDelivery, TestContext, U2_PHONE};
use nps_backend::services::dispatch::execute;
use nps_backend::services::stats::delivery_stats;
use nps_backend::services::webhook::{ingest, WebhookOutcome};
use nps_common::model::send::SendStatus;
use serde_json::{json, Value};

fn receipt(message_id: &str, status: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event": "messages.update",
        "data": { "key": { "id": message_id }, "status": status }
    }))
    .unwrap()
}

#[actix_web::test]
async fn duplicated_receipts_are_idempotent() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();

    let outcome = ingest(&ctx.state, &receipt("wamid-1", "DELIVERY_ACK")).unwrap();
    assert_eq!(outcome, WebhookOutcome { applied: 1, ignored: 0 });
    let first = ctx.sends(&campaign.id).remove(0);
    assert_eq!(first.status, SendStatus::Delivered);
    let delivered_at = first.delivered_at.unwrap();

    let outcome = ingest(&ctx.state, &receipt("wamid-1", "delivered")).unwrap();
    assert_eq!(outcome, WebhookOutcome { applied: 0, ignored: 1 });
    let again = ctx.sends(&campaign.id).remove(0);
    assert_eq!(again.status, SendStatus::Delivered);
    assert_eq!(again.delivered_at, Some(delivered_at));
}

#[actix_web::test]
async fn receipts_never_move_a_send_backwards() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();

    ingest(&ctx.state, &receipt("wamid-1", "read")).unwrap();
    let read = ctx.sends(&campaign.id).remove(0);
    assert_eq!(read.status, SendStatus::Read);
    assert!(read.read_at.is_some());
    assert!(read.delivered_at.is_some());

    for late in ["delivered", "sent", "failed"] {
        ingest(&ctx.state, &receipt("wamid-1", late)).unwrap();
    }
    let after = ctx.sends(&campaign.id).remove(0);
    assert_eq!(after.status, SendStatus::Read);
    assert_eq!(after.read_at, read.read_at);
}

#[actix_web::test]
async fn batches_and_unknown_ids() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1", "u3"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();
    let sends = ctx.sends(&campaign.id);
    let u1_id = sends[0].provider_message_id.clone().unwrap();
    let u3_id = sends[1].provider_message_id.clone().unwrap();

    let body = serde_json::to_vec(&json!({
        "event": "messages.update",
        "data": [
            { "messageId": u1_id, "status": "delivered" },
            { "keyId": u3_id, "status": "played" },
            { "messageId": "wamid-unknown", "status": "read" },
            { "messageId": u1_id, "status": "typing" }
        ]
    }))
    .unwrap();
    let outcome = ingest(&ctx.state, &body).unwrap();
    assert_eq!(outcome, WebhookOutcome { applied: 2, ignored: 2 });

    let sends = ctx.sends(&campaign.id);
    assert_eq!(sends[0].status, SendStatus::Delivered);
    assert_eq!(sends[1].status, SendStatus::Read);

    // Other event types are not receipts.
    let body = serde_json::to_vec(&json!({
        "event": "connection.update",
        "data": { "messageId": u1_id, "status": "read" }
    }))
    .unwrap();
    let outcome = ingest(&ctx.state, &body).unwrap();
    assert_eq!(outcome.applied, 0);
    assert_eq!(ctx.sends(&campaign.id)[0].status, SendStatus::Delivered);
}

#[actix_web::test]
async fn endpoint_always_acknowledges() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();
    let app = init_app!(ctx.state);

    for body in [
        b"not json at all".to_vec(),
        b"{}".to_vec(),
        receipt("wamid-404", "read"),
        receipt("wamid-1", "read"),
    ] {
        let req = test::TestRequest::post()
            .uri("/webhook")
            .insert_header(("content-type", "application/json"))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "success": true }));
    }

    assert_eq!(ctx.sends(&campaign.id)[0].status, SendStatus::Read);
}

#[actix_web::test]
async fn stats_count_sends_cumulatively() {
    let ctx = TestContext::with_delivery(ScriptedDelivery::failing_for(&[U2_PHONE]));
    let campaign = ctx.immediate_campaign(&["u1", "u2", "u3"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();

    let sends = ctx.sends(&campaign.id);
    let u1_id = sends[0].provider_message_id.clone().unwrap();
    let u3_id = sends[2].provider_message_id.clone().unwrap();
    ingest(&ctx.state, &receipt(&u1_id, "read")).unwrap();
    ingest(&ctx.state, &receipt(&u3_id, "delivered")).unwrap();

    let stats = delivery_stats(&ctx.state).unwrap();
    assert_eq!(stats.total_sends, 3);
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.read, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.success_rate, 66.7);
    assert_eq!(stats.responses, 0);

    let app = init_app!(ctx.state);
    let req = test::TestRequest::get().uri("/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["failed"], 1);
}
