//! Email transports

mod capture;
mod smtp;
mod traits;

use std::sync::Arc;

use tracing::warn;

pub use capture::CaptureMailer;
pub use smtp::SmtpMailer;
pub use traits::*;

use crate::config::SmtpConfig;
use crate::errors::EmailError;

/// Build the transport described by `config`, falling back to capture mode
/// when no relay host is configured.
pub fn mailer_from_config(config: &SmtpConfig) -> Result<Arc<dyn Mailer>, EmailError> {
    if !config.is_configured() {
        warn!("No SMTP host configured, confirmation emails will be captured and logged only");
        return Ok(Arc::new(CaptureMailer::new()));
    }

    Ok(Arc::new(SmtpMailer::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsMode;

    #[test]
    fn test_unconfigured_selects_capture() {
        let mailer = mailer_from_config(&SmtpConfig::default()).unwrap();
        assert_eq!(mailer.transport_name(), "capture");
    }

    #[tokio::test]
    async fn test_configured_selects_smtp() {
        let config = SmtpConfig {
            host: Some("localhost".into()),
            from_address: Some("events@wcewlug.org".into()),
            tls_mode: TlsMode::None,
            ..Default::default()
        };
        let mailer = mailer_from_config(&config).unwrap();
        assert_eq!(mailer.transport_name(), "smtp");
    }
}
