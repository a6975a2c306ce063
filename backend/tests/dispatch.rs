mod common;

use chrono::Utc;
use common::{ScriptedDelivery, TestContext, U2_PHONE};
use nps_backend::error::ServiceError;
use nps_backend::services::dispatch::execute;
use nps_backend::services::schedules::{create_campaign, set_status};
use nps_common::model::campaign::{CampaignStatus, RecipientFilter, ScheduleType};
use nps_common::model::send::SendStatus;

#[actix_web::test]
async fn one_failed_delivery_does_not_stop_the_others() {
    let ctx = TestContext::with_delivery(ScriptedDelivery::failing_for(&[U2_PHONE]));
    let campaign = ctx.immediate_campaign(&["u1", "u2", "u3"]);

    let report = execute(&ctx.state, &campaign.id, None).await.unwrap();

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.sent, 2);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.skipped, 0);

    let ids: Vec<_> = report.results.iter().map(|r| r.recipient_id.as_str()).collect();
    assert_eq!(ids, ["u1", "u2", "u3"]);
    assert!(report.results[0].success);
    assert!(report.results[0].provider_message_id.is_some());
    assert!(!report.results[1].success);
    assert!(report.results[1].provider_message_id.is_none());
    assert!(report.results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("not on whatsapp"));
    assert!(report.results[2].success);

    let sends = ctx.sends(&campaign.id);
    assert_eq!(sends.len(), 3);
    assert_eq!(sends[0].status, SendStatus::Sent);
    assert_eq!(sends[1].status, SendStatus::Failed);
    assert!(sends[1].error_message.is_some());
    assert!(sends[1].provider_message_id.is_none());
    assert_eq!(sends[2].status, SendStatus::Sent);

    assert_eq!(ctx.campaign(&campaign.id).success_count, 2);
}

#[actix_web::test]
async fn recipients_without_address_are_skipped() {
    let ctx = TestContext::new();
    // u4 has no phone, u5 is inactive, u9 does not exist.
    let campaign = ctx.immediate_campaign(&["u1", "u4", "u5", "u9"]);

    let report = execute(&ctx.state, &campaign.id, None).await.unwrap();
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.sent, 1);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.skipped, 3);
    assert_eq!(ctx.sends(&campaign.id).len(), 1);
}

#[actix_web::test]
async fn no_contactable_recipient_is_an_error() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u4"]);

    let err = execute(&ctx.state, &campaign.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::NoRecipients));
    assert!(ctx.sends(&campaign.id).is_empty());
}

#[actix_web::test]
async fn unknown_campaign_is_not_found() {
    let ctx = TestContext::new();
    let err = execute(&ctx.state, "missing", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::CampaignNotFound));
}

#[actix_web::test]
async fn paused_campaign_is_not_dispatched() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1"]);
    set_status(&ctx.state, &campaign.id, CampaignStatus::Paused).unwrap();

    let err = execute(&ctx.state, &campaign.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::CampaignNotActive(CampaignStatus::Paused)
    ));
    assert!(ctx.delivery.outbox().is_empty());

    set_status(&ctx.state, &campaign.id, CampaignStatus::Active).unwrap();
    assert!(execute(&ctx.state, &campaign.id, None).await.is_ok());

    // One-shot campaigns complete after their run.
    let err = execute(&ctx.state, &campaign.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::CampaignNotActive(CampaignStatus::Completed)
    ));
}

#[actix_web::test]
async fn override_list_replaces_stored_recipients_without_completing() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1", "u2"]);

    let report = execute(&ctx.state, &campaign.id, Some(vec!["u3".into(), "u3".into()]))
        .await
        .unwrap();
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.results[0].recipient_id, "u3");

    let stored = ctx.campaign(&campaign.id);
    assert_eq!(stored.status, CampaignStatus::Active);
    assert_eq!(stored.success_count, 1);
    assert!(stored.last_executed_at.is_some());
}

#[actix_web::test]
async fn department_filter_adds_active_members() {
    let ctx = TestContext::new();
    let mut req = ctx.schedule_request(&["u3"], ScheduleType::Immediate);
    req.target_filter = Some(RecipientFilter {
        department: Some("sales".into()),
    });
    let campaign = create_campaign(&ctx.state, req, Utc::now()).unwrap();

    let report = execute(&ctx.state, &campaign.id, None).await.unwrap();
    let ids: Vec<_> = report.results.iter().map(|r| r.recipient_id.as_str()).collect();
    // u3 explicitly, then Sales members; u4 has no phone, u5 is inactive and
    // is not returned by the filter at all.
    assert_eq!(ids, ["u3", "u1", "u2"]);
    assert_eq!(report.summary.skipped, 1);
}

#[actix_web::test]
async fn recurring_campaign_advances_next_execution() {
    let ctx = TestContext::new();
    let mut req = ctx.schedule_request(&["u1"], ScheduleType::Recurring);
    req.recurrence_pattern = Some("weekly".into());
    let campaign = create_campaign(&ctx.state, req, Utc::now()).unwrap();

    let before = Utc::now();
    execute(&ctx.state, &campaign.id, None).await.unwrap();

    let stored = ctx.campaign(&campaign.id);
    assert_eq!(stored.status, CampaignStatus::Active);
    let next = stored.next_execution_at.unwrap();
    assert!(next >= before + chrono::Duration::days(7));
    assert!(next <= Utc::now() + chrono::Duration::days(7));
}

#[actix_web::test]
async fn every_send_gets_its_own_token() {
    let ctx = TestContext::new();
    let campaign = ctx.immediate_campaign(&["u1", "u2", "u3"]);
    execute(&ctx.state, &campaign.id, None).await.unwrap();

    let sends = ctx.sends(&campaign.id);
    let conn = ctx.state.db.connect().unwrap();
    for send in &sends {
        let token = nps_backend::db::tokens::get(&conn, &send.token)
            .unwrap()
            .unwrap();
        assert_eq!(token.send_id, send.id);
        assert_eq!(token.context.recipient_id, send.recipient_id);
        assert_eq!(token.context.schedule_id, campaign.id);
        assert!(!token.used);
    }
    assert_ne!(sends[0].token, sends[1].token);
    assert_ne!(sends[1].token, sends[2].token);
}
