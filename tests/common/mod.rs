use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use rentwatch::dispatch::DispatchError;
use rentwatch::dispatch::DispatchGateway;
use rentwatch::dispatch::EnqueueResult;
use rentwatch::model::ChannelPreferences;
use rentwatch::model::DispatchRequest;
use rentwatch::model::ListingPayload;
use rentwatch::model::UserModel;
use rentwatch::repository::Repository;
use uuid::Uuid;

pub async fn setup_db() -> (Arc<Repository>, PathBuf) {
    let uuid = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("rentwatch-test-{}.db", uuid));
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());

    let db = Repository::new(&db_url, db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    db.run_migrations().await.expect("Failed to run migrations");

    (Arc::new(db), db_path)
}

pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

#[allow(dead_code)]
pub async fn create_user(db: &Repository, id: i64) -> UserModel {
    let user = UserModel {
        id,
        channel_preferences: sqlx::types::Json(ChannelPreferences {
            telegram_chat_id: Some(format!("chat-{id}")),
            email: None,
            whatsapp_number: None,
        }),
    };
    db.user.replace(&user).await.expect("Failed to create user");
    user
}

/// Minimal valid payload; tests override the fields they care about.
#[allow(dead_code)]
pub fn payload(source: &str, external_id: &str) -> ListingPayload {
    ListingPayload {
        source: source.to_string(),
        external_id: external_id.to_string(),
        url: format!("https://{source}.example/ads/{external_id}"),
        title: format!("Listing {external_id}"),
        city: "Roma".to_string(),
        ..Default::default()
    }
}

// MOCK GATEWAY

/// Programmable dispatch double: records every enqueue attempt and can
/// be flipped to reject.
#[allow(dead_code)]
pub struct RecordingGateway {
    pub requests: Mutex<Vec<DispatchRequest>>,
    accept: AtomicBool,
}

#[allow(dead_code)]
impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            accept: AtomicBool::new(true),
        })
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DispatchGateway for RecordingGateway {
    async fn enqueue(&self, request: &DispatchRequest) -> Result<EnqueueResult, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.accept.load(Ordering::SeqCst) {
            Ok(EnqueueResult::Accepted)
        } else {
            Ok(EnqueueResult::Rejected)
        }
    }
}
