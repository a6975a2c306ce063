#![allow(dead_code, unused_macros)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nps_backend::db::{self, Database};
use nps_backend::delivery::{DeliveryClient, DeliveryError};
use nps_backend::services::schedules::create_campaign;
use nps_backend::services::surveys::create_survey;
use nps_backend::state::{AppState, DispatchSettings};
use nps_common::model::campaign::{Campaign, ScheduleType};
use nps_common::model::recipient::Recipient;
use nps_common::model::survey::Survey;
use nps_common::requests::{CreateScheduleRequest, CreateSurveyRequest};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BASE_URL: &str = "https://hr.example.com";

/// Delivery double: fails for the configured numbers, records everything else.
#[derive(Default)]
pub struct ScriptedDelivery {
    fail_for: HashSet<String>,
    outbox: Mutex<Vec<(String, String)>>,
    seq: AtomicUsize,
}

impl ScriptedDelivery {
    pub fn failing_for(numbers: &[&str]) -> Self {
        Self {
            fail_for: numbers.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    /// `(to, body)` of every accepted message.
    pub fn outbox(&self) -> Vec<(String, String)> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for ScriptedDelivery {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DeliveryError> {
        if self.fail_for.contains(to) {
            return Err(DeliveryError::Rejected {
                status: 400,
                body: "number is not on whatsapp".into(),
            });
        }
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.outbox
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(format!("wamid-{}", n))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub delivery: Arc<ScriptedDelivery>,
    pub survey: Survey,
    _dir: TempDir,
}

pub const U1_PHONE: &str = "5511900000001";
pub const U2_PHONE: &str = "5511900000002";
pub const U3_PHONE: &str = "5511900000003";

impl TestContext {
    pub fn new() -> Self {
        Self::with_delivery(ScriptedDelivery::default())
    }

    /// Seeds one survey ("S1") and the directory:
    /// u1..u3 contactable (u1, u2 in Sales, u3 in Ops), u4 without phone,
    /// u5 inactive.
    pub fn with_delivery(delivery: ScriptedDelivery) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("nps.sqlite")).unwrap();
        let delivery = Arc::new(delivery);
        let state = AppState::new(
            db,
            delivery.clone(),
            None,
            DispatchSettings {
                public_base_url: BASE_URL.into(),
                concurrency: 2,
            },
        );

        let survey = create_survey(
            &state,
            CreateSurveyRequest {
                title: "S1 Quarterly pulse".into(),
                description: None,
                question: "How likely are you to recommend working here?".into(),
            },
        )
        .unwrap();

        let conn = state.db.connect().unwrap();
        let people = [
            ("u1", "Ana Souza", Some(U1_PHONE), Some("Sales"), true),
            ("u2", "Bruno Lima", Some(U2_PHONE), Some("Sales"), true),
            ("u3", "Carla Dias", Some(U3_PHONE), Some("Ops"), true),
            ("u4", "Davi Reis", None, Some("Sales"), true),
            ("u5", "Eva Melo", Some("5511900000005"), Some("Sales"), false),
        ];
        for (id, name, phone, department, active) in people {
            db::recipients::upsert(
                &conn,
                &Recipient {
                    id: id.into(),
                    name: name.into(),
                    phone: phone.map(str::to_string),
                    department: department.map(str::to_string),
                    active,
                },
            )
            .unwrap();
        }

        TestContext {
            state,
            delivery,
            survey,
            _dir: dir,
        }
    }

    pub fn schedule_request(&self, users: &[&str], schedule_type: ScheduleType) -> CreateScheduleRequest {
        CreateScheduleRequest {
            survey_id: self.survey.id.clone(),
            name: "Pulse".into(),
            description: None,
            target_users: users.iter().map(|u| u.to_string()).collect(),
            target_filter: None,
            schedule_type,
            scheduled_date: None,
            recurrence_pattern: None,
            created_by: Some("hr-admin".into()),
        }
    }

    pub fn immediate_campaign(&self, users: &[&str]) -> Campaign {
        create_campaign(
            &self.state,
            self.schedule_request(users, ScheduleType::Immediate),
            Utc::now(),
        )
        .unwrap()
    }

    pub fn campaign(&self, id: &str) -> Campaign {
        let conn = self.state.db.connect().unwrap();
        db::campaigns::get(&conn, id).unwrap().unwrap()
    }

    pub fn sends(&self, campaign_id: &str) -> Vec<nps_common::model::send::SendRecord> {
        let conn = self.state.db.connect().unwrap();
        let mut sends = db::sends::list_by_campaign(&conn, campaign_id).unwrap();
        sends.sort_by(|a, b| a.recipient_id.cmp(&b.recipient_id));
        sends
    }
}

pub fn hours_from(base: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    base + chrono::Duration::hours(hours)
}

/// Builds the full application the way `main.rs` does.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .wrap(actix_web::middleware::from_fn(nps_backend::services::preflight))
                .wrap(nps_backend::services::cors_headers())
                .configure(nps_backend::services::configure),
        )
        .await
    };
}
