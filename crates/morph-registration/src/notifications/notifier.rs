//! Detached fan-out of confirmation emails

use std::sync::Arc;
use std::time::Duration;

use morph_email::{EmailError, Mailer, OutgoingEmail};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::template::render_confirmation;
use crate::settings::EventDetails;
use crate::store::RegistrationStore;

/// One registered participant, as needed for a confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub pid: i32,
    pub name: String,
    pub email: String,
}

/// Outcome of one [`ConfirmationNotifier::dispatch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub registration_id: i32,
    pub delivered: Vec<i32>,
    pub failed: Vec<i32>,
}

impl NotificationSummary {
    pub fn all_delivered(&self, expected: usize) -> bool {
        self.failed.is_empty() && self.delivered.len() == expected && expected > 0
    }
}

#[derive(Clone)]
pub struct ConfirmationNotifier {
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn RegistrationStore>,
    event: Arc<EventDetails>,
    timeout: Duration,
}

impl ConfirmationNotifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn RegistrationStore>,
        event: EventDetails,
        timeout: Duration,
    ) -> Self {
        Self {
            mailer,
            store,
            event: Arc::new(event),
            timeout,
        }
    }

    /// Send the confirmation to `recipient`, listing everyone in `roster`.
    pub async fn send(
        &self,
        recipient: &RosterEntry,
        roster: &[RosterEntry],
    ) -> Result<(), EmailError> {
        let html = render_confirmation(
            &self.event,
            &recipient.name,
            roster.iter().map(|entry| entry.name.as_str()),
        );

        let email = OutgoingEmail::new(
            recipient.email.clone(),
            Some(recipient.name.clone()),
            self.event.welcome(),
            html,
        );

        self.mailer.send(&email).await
    }

    /// Notify every participant of `registration_id` in the background.
    ///
    /// Each send is bounded by the notification timeout. Delivered
    /// participants get their `mail_sent` flag; the registration gets its flag
    /// once everyone was reached. Failures only reach the log. Callers may
    /// drop the handle.
    pub fn dispatch(
        &self,
        registration_id: i32,
        roster: Vec<RosterEntry>,
    ) -> JoinHandle<NotificationSummary> {
        let notifier = self.clone();
        tokio::spawn(async move {
            notifier
                .notify_all(registration_id, Arc::new(roster))
                .await
        })
    }

    async fn notify_all(
        &self,
        registration_id: i32,
        roster: Arc<Vec<RosterEntry>>,
    ) -> NotificationSummary {
        let mut tasks = JoinSet::new();
        for index in 0..roster.len() {
            let notifier = self.clone();
            let roster = roster.clone();
            tasks.spawn(async move {
                let recipient = &roster[index];
                let send = notifier.send(recipient, &roster);
                let outcome = match tokio::time::timeout(notifier.timeout, send).await {
                    Ok(result) => result,
                    Err(_) => Err(EmailError::Timeout(notifier.timeout.as_secs())),
                };
                (recipient.pid, outcome)
            });
        }

        let mut summary = NotificationSummary {
            registration_id,
            ..Default::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((pid, Ok(()))) => {
                    debug!("Confirmation delivered to participant {}", pid);
                    if let Err(e) = self.store.mark_participant_notified(pid).await {
                        warn!("Failed to flag participant {} as notified: {}", pid, e);
                    }
                    summary.delivered.push(pid);
                }
                Ok((pid, Err(e))) => {
                    warn!(registration_id, pid, "Confirmation email not delivered: {}", e);
                    summary.failed.push(pid);
                }
                Err(e) => {
                    warn!(registration_id, "Confirmation task aborted: {}", e);
                }
            }
        }

        if summary.all_delivered(roster.len()) {
            if let Err(e) = self.store.mark_registration_notified(registration_id).await {
                warn!(
                    "Failed to flag registration {} as notified: {}",
                    registration_id, e
                );
            }
        }

        info!(
            registration_id,
            delivered = summary.delivered.len(),
            failed = summary.failed.len(),
            "Confirmation emails processed"
        );

        summary
    }
}
