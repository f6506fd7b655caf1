//! Confirmation emails sent after a successful registration

mod notifier;
mod template;

pub use notifier::{ConfirmationNotifier, NotificationSummary, RosterEntry};
pub use template::{escape_html, render_confirmation};
