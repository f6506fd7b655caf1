//! SMTP transport built on lettre

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters, TlsParametersBuilder},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use super::traits::{parse_address, Mailer, OutgoingEmail};
use crate::config::{SmtpConfig, TlsMode};
use crate::errors::EmailError;

/// Delivers messages through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let host = config
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| EmailError::Configuration("SMTP host is required".into()))?
            .to_string();

        let sender = config.sender_address().ok_or_else(|| {
            EmailError::Configuration("a sender address or SMTP username is required".into())
        })?;
        let from = Mailbox::new(config.from_name.clone(), parse_address(sender)?);

        let builder = match config.tls_mode {
            TlsMode::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host).port(config.port)
            }
            TlsMode::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
                    .port(config.port)
                    .tls(Tls::Required(tls_parameters(&host)?))
            }
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&host)?
                .port(config.port)
                .tls(Tls::Wrapper(tls_parameters(&host)?)),
        };

        let builder = match config.credentials() {
            Some((username, password)) => builder.credentials(Credentials::new(username, password)),
            None => builder,
        };

        debug!(
            "SMTP transport for {}:{} ({})",
            host, config.port, config.tls_mode
        );

        Ok(Self {
            transport: builder.build(),
            from,
            host,
        })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.from
    }

    /// Assemble the MIME message for `email`
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(email.recipient()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())?)
    }
}

/// Local relays commonly run with self-signed certificates
fn tls_parameters(host: &str) -> Result<TlsParameters, EmailError> {
    let local = host == "localhost" || host == "127.0.0.1";
    Ok(TlsParametersBuilder::new(host.to_string())
        .dangerous_accept_invalid_certs(local)
        .dangerous_accept_invalid_hostnames(local)
        .build()?)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = self.build_message(email)?;

        debug!("Sending '{}' to {} via {}", email.subject, email.to_address, self.host);

        self.transport.send(message).await?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "smtp"
    }
}
