//! Common test utilities shared across registration integration tests
//!
//! This module provides:
//! - A harness wiring the pipeline to an in-memory database, object store
//!   and capture mailer
//! - Fault-injecting wrappers for the store, the object store and the mailer
//! - Form builders

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use morph_blob::{BlobError, MemoryObjectStore, ObjectStore, StoredObject, UploadRequest};
use morph_core::DBDateTime;
use morph_database::test_utils::TestDatabase;
use morph_email::{CaptureMailer, EmailError, Mailer, OutgoingEmail};
use morph_entities::{participants, registrations};
use morph_registration::{
    Attachment, ConfirmationNotifier, DbRegistrationStore, EventDetails, NewParticipant,
    NewRegistration, RegistrationForm, RegistrationPipeline, RegistrationSettings,
    RegistrationStore, StoreError,
};
use sea_orm::{DbErr, EntityTrait, PaginatorTrait};

pub struct Harness {
    pub db: TestDatabase,
    pub store: Arc<DbRegistrationStore>,
    pub objects: MemoryObjectStore,
    pub mailer: CaptureMailer,
    pub pipeline: Arc<RegistrationPipeline>,
}

#[derive(Default)]
pub struct HarnessBuilder {
    store: Option<Box<dyn FnOnce(Arc<DbRegistrationStore>) -> Arc<dyn RegistrationStore>>>,
    objects: Option<Arc<dyn ObjectStore>>,
    mailer: Option<Arc<dyn Mailer>>,
    settings: RegistrationSettings,
}

impl HarnessBuilder {
    /// Put a wrapper around the real store
    pub fn wrap_store(
        mut self,
        wrap: impl FnOnce(Arc<DbRegistrationStore>) -> Arc<dyn RegistrationStore> + 'static,
    ) -> Self {
        self.store = Some(Box::new(wrap));
        self
    }

    pub fn objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn settings(mut self, settings: RegistrationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn build(self) -> Harness {
        let db = TestDatabase::with_migrations()
            .await
            .expect("test database");
        let store = Arc::new(DbRegistrationStore::new(db.connection()));
        let objects = MemoryObjectStore::new();
        let mailer = CaptureMailer::new();

        let pipeline_store: Arc<dyn RegistrationStore> = match self.store {
            Some(wrap) => wrap(store.clone()),
            None => store.clone(),
        };
        let pipeline_objects = self
            .objects
            .unwrap_or_else(|| Arc::new(objects.clone()));
        let pipeline_mailer = self.mailer.unwrap_or_else(|| Arc::new(mailer.clone()));

        let notifier = ConfirmationNotifier::new(
            pipeline_mailer,
            pipeline_store.clone(),
            EventDetails::default(),
            self.settings.notification_timeout,
        );
        let pipeline = Arc::new(RegistrationPipeline::new(
            pipeline_store,
            pipeline_objects,
            notifier,
            self.settings,
        ));

        Harness {
            db,
            store,
            objects,
            mailer,
            pipeline,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn participant_count(&self) -> u64 {
        participants::Entity::find()
            .count(self.db.db.as_ref())
            .await
            .unwrap()
    }

    pub async fn registration_count(&self) -> u64 {
        registrations::Entity::find()
            .count(self.db.db.as_ref())
            .await
            .unwrap()
    }
}

pub fn proof_image() -> Attachment {
    Attachment {
        file_name: "proof.png".into(),
        content_type: Some("image/png".into()),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
    }
}

pub fn participant_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "email": format!("{}@x.com", name.to_lowercase()),
        "phone": "9999999999",
        "collegeName": "WCE",
        "yearOfStudy": 2,
        "dualBoot": true,
    })
}

/// A complete form for the named participants
pub fn form_for(names: &[&str], transaction_id: &str) -> RegistrationForm {
    let participants: Vec<_> = names.iter().map(|n| participant_json(n)).collect();
    RegistrationForm {
        participants: Some(serde_json::Value::Array(participants).to_string()),
        transaction_id: Some(transaction_id.into()),
        referral_code: None,
        transaction_image: Some(proof_image()),
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Object store whose uploads always fail
#[derive(Default)]
pub struct FailingObjectStore {
    pub uploads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload(
        &self,
        _folder: &str,
        _request: UploadRequest,
    ) -> Result<StoredObject, BlobError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Err(BlobError::UploadFailed("connection refused".into()))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        Err(BlobError::NotFound(key.to_string()))
    }
}

/// Mailer whose sends always fail
#[derive(Default)]
pub struct FailingMailer {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EmailError::Transport("421 service not available".into()))
    }

    fn transport_name(&self) -> &'static str {
        "failing"
    }
}

/// Store wrapper that injects failures into the real store
pub struct FaultyStore {
    inner: Arc<DbRegistrationStore>,
    /// Participant inserts that succeed before the rest fail
    participants_before_failure: Option<usize>,
    fail_registration: bool,
    stall_participants: bool,
    stall_registration: bool,
    /// Delay after a registration insert has committed
    registration_ack_delay: Option<Duration>,
    fail_lookup: bool,
    created: AtomicUsize,
    pub discard_calls: AtomicUsize,
    pub discard_fails: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<DbRegistrationStore>) -> Self {
        Self {
            inner,
            participants_before_failure: None,
            fail_registration: false,
            stall_participants: false,
            stall_registration: false,
            registration_ack_delay: None,
            fail_lookup: false,
            created: AtomicUsize::new(0),
            discard_calls: AtomicUsize::new(0),
            discard_fails: AtomicBool::new(false),
        }
    }

    pub fn fail_participants_after(mut self, successes: usize) -> Self {
        self.participants_before_failure = Some(successes);
        self
    }

    pub fn fail_registration(mut self) -> Self {
        self.fail_registration = true;
        self
    }

    pub fn stall_participants(mut self) -> Self {
        self.stall_participants = true;
        self
    }

    pub fn stall_registration(mut self) -> Self {
        self.stall_registration = true;
        self
    }

    /// Commit the registration, then hold the reply back for `delay`
    pub fn acknowledge_registration_after(mut self, delay: Duration) -> Self {
        self.registration_ack_delay = Some(delay);
        self
    }

    pub fn fail_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn with_discard_failure(self) -> Self {
        self.discard_fails.store(true, Ordering::SeqCst);
        self
    }
}

fn injected() -> StoreError {
    StoreError::Database(DbErr::Custom("injected failure".into()))
}

#[async_trait]
impl RegistrationStore for FaultyStore {
    async fn allocate_next_participant_id(&self) -> Result<i32, StoreError> {
        self.inner.allocate_next_participant_id().await
    }

    async fn create_participant(&self, participant: NewParticipant) -> Result<i32, StoreError> {
        if self.stall_participants {
            return std::future::pending().await;
        }
        let attempt = self.created.fetch_add(1, Ordering::SeqCst);
        if self
            .participants_before_failure
            .is_some_and(|successes| attempt >= successes)
        {
            return Err(injected());
        }
        self.inner.create_participant(participant).await
    }

    async fn create_registration(&self, registration: NewRegistration) -> Result<i32, StoreError> {
        if self.fail_registration {
            return Err(injected());
        }
        if self.stall_registration {
            return std::future::pending().await;
        }
        let id = self.inner.create_registration(registration).await?;
        if let Some(delay) = self.registration_ack_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(id)
    }

    async fn get_participant(&self, pid: i32) -> Result<Option<participants::Model>, StoreError> {
        self.inner.get_participant(pid).await
    }

    async fn get_registration(&self, id: i32) -> Result<Option<registrations::Model>, StoreError> {
        self.inner.get_registration(id).await
    }

    async fn find_registration(
        &self,
        transaction_id: &str,
        transaction_image: &str,
    ) -> Result<Option<registrations::Model>, StoreError> {
        if self.fail_lookup {
            return Err(injected());
        }
        self.inner
            .find_registration(transaction_id, transaction_image)
            .await
    }

    async fn discard_participants(&self, pids: &[i32]) -> Result<u64, StoreError> {
        self.discard_calls.fetch_add(1, Ordering::SeqCst);
        if self.discard_fails.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.discard_participants(pids).await
    }

    async fn mark_participant_notified(&self, pid: i32) -> Result<(), StoreError> {
        self.inner.mark_participant_notified(pid).await
    }

    async fn mark_registration_notified(&self, id: i32) -> Result<(), StoreError> {
        self.inner.mark_registration_notified(id).await
    }

    async fn sweep_orphan_participants(
        &self,
        older_than: DBDateTime,
    ) -> Result<Vec<i32>, StoreError> {
        self.inner.sweep_orphan_participants(older_than).await
    }
}
