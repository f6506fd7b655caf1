//! Registration intake for the Metamorphosis event
//!
//! A submission is validated, its payment proof is uploaded, the participants
//! and their registration are persisted, and confirmation emails are sent in
//! the background. Failures after the upload are compensated so that no
//! half-written registration survives.

pub mod error;
pub mod handlers;
pub mod notifications;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod validation;

pub use error::{RegistrationError, Stage};
pub use handlers::{configure_routes, AppState, RegistrationApiDoc};
pub use notifications::{ConfirmationNotifier, NotificationSummary, RosterEntry};
pub use pipeline::{RegistrationPipeline, RegistrationReceipt};
pub use settings::{EventDetails, RegistrationSettings};
pub use store::{
    DbRegistrationStore, NewParticipant, NewRegistration, RegistrationStore, StoreError,
};
pub use validation::{
    Attachment, FieldDiagnostic, ParticipantDescriptor, RegistrationForm, ValidatedSubmission,
};
