//! Persistence of participants and registrations

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use morph_core::DBDateTime;
use morph_entities::{counters, participants, registrations};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::validation::ParticipantDescriptor;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Participant {0} not found")]
    ParticipantNotFound(i32),

    #[error("Registration {0} not found")]
    RegistrationNotFound(i32),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college_name: String,
    pub year_of_study: i32,
    pub dual_boot: bool,
}

impl From<ParticipantDescriptor> for NewParticipant {
    fn from(descriptor: ParticipantDescriptor) -> Self {
        Self {
            name: descriptor.name,
            email: descriptor.email,
            phone: descriptor.phone,
            college_name: descriptor.college_name,
            year_of_study: descriptor.year_of_study,
            dual_boot: descriptor.dual_boot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub num_of_participants: i32,
    /// PIDs of participants that already exist
    pub participants: Vec<i32>,
    pub total_amount: i32,
    pub transaction_id: String,
    pub transaction_image: String,
    pub referral_code: Option<String>,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Increment and return the shared participant sequence
    async fn allocate_next_participant_id(&self) -> Result<i32, StoreError>;

    /// Insert a participant under a freshly allocated PID
    async fn create_participant(&self, participant: NewParticipant) -> Result<i32, StoreError>;

    async fn create_registration(&self, registration: NewRegistration) -> Result<i32, StoreError>;

    async fn get_participant(&self, pid: i32)
        -> Result<Option<participants::Model>, StoreError>;

    async fn get_registration(
        &self,
        id: i32,
    ) -> Result<Option<registrations::Model>, StoreError>;

    /// Registration recorded for `transaction_id` with the given proof URL
    async fn find_registration(
        &self,
        transaction_id: &str,
        transaction_image: &str,
    ) -> Result<Option<registrations::Model>, StoreError>;

    /// Delete the given participants, returning how many rows went away
    async fn discard_participants(&self, pids: &[i32]) -> Result<u64, StoreError>;

    async fn mark_participant_notified(&self, pid: i32) -> Result<(), StoreError>;

    async fn mark_registration_notified(&self, id: i32) -> Result<(), StoreError>;

    /// Delete participants created before `older_than` that no registration
    /// references, returning their PIDs
    async fn sweep_orphan_participants(
        &self,
        older_than: DBDateTime,
    ) -> Result<Vec<i32>, StoreError>;
}

/// [`RegistrationStore`] backed by a sea-orm connection
pub struct DbRegistrationStore {
    db: Arc<DatabaseConnection>,
}

impl DbRegistrationStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RegistrationStore for DbRegistrationStore {
    async fn allocate_next_participant_id(&self) -> Result<i32, StoreError> {
        // INSERT .. ON CONFLICT DO UPDATE SET seq = seq + 1 RETURNING seq
        let counter = counters::ActiveModel {
            name: Set(counters::PARTICIPANT_PID.to_string()),
            seq: Set(1),
        };

        let model = counters::Entity::insert(counter)
            .on_conflict(
                OnConflict::column(counters::Column::Name)
                    .value(
                        counters::Column::Seq,
                        Expr::col((counters::Entity, counters::Column::Seq)).add(1),
                    )
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await?;

        Ok(model.seq)
    }

    async fn create_participant(&self, participant: NewParticipant) -> Result<i32, StoreError> {
        let pid = self.allocate_next_participant_id().await?;
        let now = Utc::now();

        let model = participants::ActiveModel {
            pid: Set(pid),
            name: Set(participant.name),
            email: Set(participant.email),
            phone: Set(participant.phone),
            college_name: Set(participant.college_name),
            year_of_study: Set(participant.year_of_study),
            dual_boot: Set(participant.dual_boot),
            mail_sent: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(self.db.as_ref()).await?;
        debug!("Created participant {}", pid);

        Ok(pid)
    }

    async fn create_registration(&self, registration: NewRegistration) -> Result<i32, StoreError> {
        let now = Utc::now();

        let model = registrations::ActiveModel {
            id: NotSet,
            num_of_participants: Set(registration.num_of_participants),
            participants: Set(serde_json::to_value(&registration.participants)?),
            total_amount: Set(registration.total_amount),
            transaction_id: Set(registration.transaction_id),
            transaction_image: Set(registration.transaction_image),
            referral_code: Set(registration.referral_code),
            mail_sent: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(self.db.as_ref()).await?;
        debug!("Created registration {}", inserted.id);

        Ok(inserted.id)
    }

    async fn get_participant(
        &self,
        pid: i32,
    ) -> Result<Option<participants::Model>, StoreError> {
        Ok(participants::Entity::find_by_id(pid)
            .one(self.db.as_ref())
            .await?)
    }

    async fn get_registration(
        &self,
        id: i32,
    ) -> Result<Option<registrations::Model>, StoreError> {
        Ok(registrations::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?)
    }

    async fn find_registration(
        &self,
        transaction_id: &str,
        transaction_image: &str,
    ) -> Result<Option<registrations::Model>, StoreError> {
        Ok(registrations::Entity::find()
            .filter(registrations::Column::TransactionId.eq(transaction_id))
            .filter(registrations::Column::TransactionImage.eq(transaction_image))
            .one(self.db.as_ref())
            .await?)
    }

    async fn discard_participants(&self, pids: &[i32]) -> Result<u64, StoreError> {
        if pids.is_empty() {
            return Ok(0);
        }

        let result = participants::Entity::delete_many()
            .filter(participants::Column::Pid.is_in(pids.iter().copied()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn mark_participant_notified(&self, pid: i32) -> Result<(), StoreError> {
        let result = participants::Entity::update_many()
            .col_expr(participants::Column::MailSent, Expr::value(true))
            .col_expr(participants::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(participants::Column::Pid.eq(pid))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::ParticipantNotFound(pid));
        }
        Ok(())
    }

    async fn mark_registration_notified(&self, id: i32) -> Result<(), StoreError> {
        let result = registrations::Entity::update_many()
            .col_expr(registrations::Column::MailSent, Expr::value(true))
            .col_expr(registrations::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registrations::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::RegistrationNotFound(id));
        }
        Ok(())
    }

    async fn sweep_orphan_participants(
        &self,
        older_than: DBDateTime,
    ) -> Result<Vec<i32>, StoreError> {
        let referenced: HashSet<i32> = registrations::Entity::find()
            .all(self.db.as_ref())
            .await?
            .iter()
            .flat_map(registrations::Model::participant_ids)
            .collect();

        let orphans: Vec<i32> = participants::Entity::find()
            .filter(participants::Column::CreatedAt.lt(older_than))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|participant| participant.pid)
            .filter(|pid| !referenced.contains(pid))
            .collect();

        let removed = self.discard_participants(&orphans).await?;
        if removed > 0 {
            info!("Swept {} orphan participants: {:?}", removed, orphans);
        }

        Ok(orphans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use morph_database::test_utils::TestDatabase;

    async fn store() -> (TestDatabase, DbRegistrationStore) {
        let test_db = TestDatabase::with_migrations().await.unwrap();
        let store = DbRegistrationStore::new(test_db.connection());
        (test_db, store)
    }

    fn bob() -> NewParticipant {
        NewParticipant {
            name: "Bob".into(),
            email: "b@x.com".into(),
            phone: "1".into(),
            college_name: "WCE".into(),
            year_of_study: 2,
            dual_boot: true,
        }
    }

    fn registration_for(pids: Vec<i32>) -> NewRegistration {
        NewRegistration {
            num_of_participants: pids.len() as i32,
            participants: pids,
            total_amount: 0,
            transaction_id: "TXN1".into(),
            transaction_image: "memory://metamorphosis/proof.png".into(),
            referral_code: None,
        }
    }

    #[tokio::test]
    async fn test_counter_starts_at_one_and_increments() {
        let (_db, store) = store().await;
        assert_eq!(store.allocate_next_participant_id().await.unwrap(), 1);
        assert_eq!(store.allocate_next_participant_id().await.unwrap(), 2);
        assert_eq!(store.allocate_next_participant_id().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct() {
        let (_db, store) = store().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.allocate_next_participant_id().await.unwrap()
            }));
        }

        let mut pids = HashSet::new();
        for handle in handles {
            pids.insert(handle.await.unwrap());
        }
        assert_eq!(pids.len(), 20);
        assert_eq!(pids.iter().max(), Some(&20));
    }

    #[tokio::test]
    async fn test_participant_round_trip() {
        let (_db, store) = store().await;
        let pid = store.create_participant(bob()).await.unwrap();

        let participant = store.get_participant(pid).await.unwrap().unwrap();
        assert_eq!(participant.pid, pid);
        assert_eq!(participant.name, "Bob");
        assert_eq!(participant.email, "b@x.com");
        assert_eq!(participant.phone, "1");
        assert_eq!(participant.college_name, "WCE");
        assert_eq!(participant.year_of_study, 2);
        assert!(participant.dual_boot);
        assert!(!participant.mail_sent);
    }

    #[tokio::test]
    async fn test_registration_round_trip() {
        let (_db, store) = store().await;
        let first = store.create_participant(bob()).await.unwrap();
        let second = store.create_participant(bob()).await.unwrap();

        let mut new = registration_for(vec![first, second]);
        new.referral_code = Some("WLUG10".into());
        let id = store.create_registration(new).await.unwrap();

        let registration = store.get_registration(id).await.unwrap().unwrap();
        assert_eq!(registration.num_of_participants, 2);
        assert_eq!(registration.participant_ids(), vec![first, second]);
        assert_eq!(registration.total_amount, 0);
        assert_eq!(registration.transaction_id, "TXN1");
        assert_eq!(registration.referral_code.as_deref(), Some("WLUG10"));
        assert!(!registration.mail_sent);
    }

    #[tokio::test]
    async fn test_missing_rows_are_none() {
        let (_db, store) = store().await;
        assert!(store.get_participant(99).await.unwrap().is_none());
        assert!(store.get_registration(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_registration_matches_transaction_and_image() {
        let (_db, store) = store().await;
        let pid = store.create_participant(bob()).await.unwrap();
        let id = store
            .create_registration(registration_for(vec![pid]))
            .await
            .unwrap();

        let found = store
            .find_registration("TXN1", "memory://metamorphosis/proof.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);

        assert!(store
            .find_registration("TXN1", "memory://metamorphosis/other.png")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_registration("TXN2", "memory://metamorphosis/proof.png")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_discard_participants() {
        let (_db, store) = store().await;
        let keep = store.create_participant(bob()).await.unwrap();
        let drop_a = store.create_participant(bob()).await.unwrap();
        let drop_b = store.create_participant(bob()).await.unwrap();

        assert_eq!(store.discard_participants(&[drop_a, drop_b]).await.unwrap(), 2);
        assert_eq!(store.discard_participants(&[]).await.unwrap(), 0);

        assert!(store.get_participant(keep).await.unwrap().is_some());
        assert!(store.get_participant(drop_a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_discarded_pids_are_not_reused() {
        let (_db, store) = store().await;
        let pid = store.create_participant(bob()).await.unwrap();
        store.discard_participants(&[pid]).await.unwrap();

        let next = store.create_participant(bob()).await.unwrap();
        assert!(next > pid);
    }

    #[tokio::test]
    async fn test_mark_notified() {
        let (_db, store) = store().await;
        let pid = store.create_participant(bob()).await.unwrap();
        let id = store.create_registration(registration_for(vec![pid])).await.unwrap();

        store.mark_participant_notified(pid).await.unwrap();
        store.mark_registration_notified(id).await.unwrap();

        assert!(store.get_participant(pid).await.unwrap().unwrap().mail_sent);
        assert!(store.get_registration(id).await.unwrap().unwrap().mail_sent);
    }

    #[tokio::test]
    async fn test_mark_notified_unknown_rows() {
        let (_db, store) = store().await;
        assert!(matches!(
            store.mark_participant_notified(7).await,
            Err(StoreError::ParticipantNotFound(7))
        ));
        assert!(matches!(
            store.mark_registration_notified(7).await,
            Err(StoreError::RegistrationNotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_unreferenced_participants() {
        let (_db, store) = store().await;
        let referenced = store.create_participant(bob()).await.unwrap();
        let orphan = store.create_participant(bob()).await.unwrap();
        store
            .create_registration(registration_for(vec![referenced]))
            .await
            .unwrap();

        // Nothing is older than an hour ago
        let swept = store
            .sweep_orphan_participants(Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert!(swept.is_empty());

        let swept = store
            .sweep_orphan_participants(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(swept, vec![orphan]);

        assert!(store.get_participant(referenced).await.unwrap().is_some());
        assert!(store.get_participant(orphan).await.unwrap().is_none());
    }
}
