//! The registration intake pipeline
//!
//! `Validating -> Uploading -> PersistingParticipants ->
//! PersistingRegistration -> NotifyingDetached -> Done`. Any stage before
//! notification can fail; failures after the upload undo what was written.

use std::future::Future;
use std::sync::Arc;

use morph_blob::{ObjectStore, StoredObject, UploadRequest};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{RegistrationError, Stage};
use crate::notifications::{ConfirmationNotifier, RosterEntry};
use crate::settings::RegistrationSettings;
use crate::store::{NewParticipant, NewRegistration, RegistrationStore, StoreError};
use crate::validation::{self, RegistrationForm};

/// What a successful registration produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub registration_id: i32,
    /// PIDs in submission order
    pub participant_ids: Vec<i32>,
    /// URL of the uploaded payment proof
    pub transaction_image: String,
}

pub struct RegistrationPipeline {
    store: Arc<dyn RegistrationStore>,
    objects: Arc<dyn ObjectStore>,
    notifier: ConfirmationNotifier,
    settings: RegistrationSettings,
}

impl RegistrationPipeline {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        objects: Arc<dyn ObjectStore>,
        notifier: ConfirmationNotifier,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            store,
            objects,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Register everyone in `form`.
    ///
    /// Returns once the registration is durable. Confirmation emails are
    /// still being sent when this returns.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        debug!(stage = %Stage::Validating, "Registration received");
        let submission = validation::validate(form, self.settings.max_payload_bytes)?;
        for diagnostic in &submission.diagnostics {
            warn!(transaction_id = %submission.transaction_id, "{}", diagnostic);
        }

        let deadline = Instant::now() + self.settings.request_timeout;

        debug!(stage = %Stage::Uploading, "Uploading transaction image");
        let image = submission.image;
        let upload = UploadRequest::new(image.file_name, image.content_type, image.bytes);
        let stored = bounded(
            deadline,
            Stage::Uploading,
            self.objects.upload(&self.settings.upload_folder, upload),
        )
        .await?
        .map_err(|e| {
            error!("Transaction image upload failed: {}", e);
            RegistrationError::UploadFailed(e)
        })?;

        debug!(
            stage = %Stage::PersistingParticipants,
            "Creating {} participants",
            submission.participants.len()
        );
        let mut roster = Vec::with_capacity(submission.participants.len());
        for descriptor in submission.participants {
            let name = descriptor.name.clone();
            let email = descriptor.email.clone();
            let created = bounded(
                deadline,
                Stage::PersistingParticipants,
                self.store.create_participant(NewParticipant::from(descriptor)),
            )
            .await;

            match created {
                Ok(Ok(pid)) => roster.push(RosterEntry { pid, name, email }),
                Ok(Err(e)) => return Err(self.abort(&roster, &stored, e).await),
                Err(timed_out) => {
                    return Err(self.abort_timed_out(&roster, &stored, timed_out).await)
                }
            }
        }
        let participant_ids: Vec<i32> = roster.iter().map(|entry| entry.pid).collect();

        debug!(stage = %Stage::PersistingRegistration, "Creating registration");
        let transaction_id = submission.transaction_id;
        let registration = NewRegistration {
            num_of_participants: participant_ids.len() as i32,
            participants: participant_ids.clone(),
            total_amount: 0,
            transaction_id: transaction_id.clone(),
            transaction_image: stored.url.clone(),
            referral_code: submission.referral_code,
        };
        let registration_id = match bounded(
            deadline,
            Stage::PersistingRegistration,
            self.store.create_registration(registration),
        )
        .await
        {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => return Err(self.abort(&roster, &stored, e).await),
            // The insert may have committed before the deadline cut it off
            Err(timed_out) => match self.recover_registration(&transaction_id, &stored).await {
                Recovery::Landed(id) => {
                    warn!(registration_id = id, "Registration committed after its deadline");
                    id
                }
                Recovery::Absent => {
                    return Err(self.abort_timed_out(&roster, &stored, timed_out).await)
                }
                Recovery::Unknown => {
                    error!(
                        orphans = ?participant_ids,
                        image = %stored.key,
                        "{}, leaving participants for the orphan sweep",
                        timed_out
                    );
                    return Err(timed_out);
                }
            },
        };

        debug!(
            stage = %Stage::NotifyingDetached,
            registration_id,
            "Dispatching confirmations"
        );
        // Detached: the handle is dropped and the outcome only reaches the log
        drop(self.notifier.dispatch(registration_id, roster));

        info!(
            registration_id,
            participants = ?participant_ids,
            "Registration successful"
        );
        debug!(stage = %Stage::Done, registration_id, "Registration complete");

        Ok(RegistrationReceipt {
            registration_id,
            participant_ids,
            transaction_image: stored.url,
        })
    }

    async fn abort(
        &self,
        roster: &[RosterEntry],
        stored: &StoredObject,
        cause: StoreError,
    ) -> RegistrationError {
        error!("Persisting registration failed: {}", cause);
        self.compensate(roster, stored).await;
        RegistrationError::PersistenceFailed(cause)
    }

    async fn abort_timed_out(
        &self,
        roster: &[RosterEntry],
        stored: &StoredObject,
        timed_out: RegistrationError,
    ) -> RegistrationError {
        error!("{}", timed_out);
        self.compensate(roster, stored).await;
        timed_out
    }

    /// Look up a registration whose insert outlived the request deadline
    async fn recover_registration(
        &self,
        transaction_id: &str,
        stored: &StoredObject,
    ) -> Recovery {
        let lookup = self.store.find_registration(transaction_id, &stored.url);
        match timeout(self.settings.request_timeout, lookup).await {
            Ok(Ok(Some(registration))) => Recovery::Landed(registration.id),
            Ok(Ok(None)) => Recovery::Absent,
            Ok(Err(e)) => {
                error!("Failed to look up timed out registration: {}", e);
                Recovery::Unknown
            }
            Err(_) => {
                error!("Timed out looking up timed out registration");
                Recovery::Unknown
            }
        }
    }

    /// Undo the writes of a failed submission, best effort.
    ///
    /// Runs on its own clock since the request deadline may have passed.
    /// Whatever survives is left for the orphan sweep.
    async fn compensate(&self, roster: &[RosterEntry], stored: &StoredObject) {
        let pids: Vec<i32> = roster.iter().map(|entry| entry.pid).collect();
        let limit = self.settings.request_timeout;

        match timeout(limit, self.store.discard_participants(&pids)).await {
            Ok(Ok(removed)) => debug!("Discarded {} participants", removed),
            Ok(Err(e)) => error!(orphans = ?pids, "Failed to discard participants: {}", e),
            Err(_) => error!(orphans = ?pids, "Timed out discarding participants"),
        }

        match timeout(limit, self.objects.delete(&stored.key)).await {
            Ok(Ok(())) => debug!("Deleted transaction image {}", stored.key),
            Ok(Err(e)) => error!("Failed to delete transaction image {}: {}", stored.key, e),
            Err(_) => error!("Timed out deleting transaction image {}", stored.key),
        }
    }
}

/// Whether a timed out registration insert was committed
enum Recovery {
    Landed(i32),
    Absent,
    Unknown,
}

/// Await `work` until `deadline`, reporting a timeout in `stage`
async fn bounded<T>(
    deadline: Instant,
    stage: Stage,
    work: impl Future<Output = T>,
) -> Result<T, RegistrationError> {
    timeout_at(deadline, work)
        .await
        .map_err(|_| RegistrationError::Timeout(stage))
}
