use crate::{attachment, Error, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use upkeep_core::recipients::normalize_addresses;
use upkeep_core::{Mailer, OutgoingEmail, SmtpSettings};

const FALLBACK_TEXT: &str = "This email contains HTML content.";
const EMPTY_HTML: &str = "<html><body>(empty)</body></html>";

/// SMTP delivery of multipart (plain + HTML) messages.
#[derive(Clone)]
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// `"Sender Name <from>"` when a sender name is configured.
    fn from_mailbox(&self) -> Result<Mailbox> {
        let address = self.settings.from.trim().parse::<Address>()?;
        Ok(Mailbox::new(self.settings.sender_name.clone(), address))
    }

    /// Build the message. Fails before any network I/O on empty recipient
    /// lists, unparsable addresses and missing attachments.
    pub async fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let to = normalize_addresses(&email.to);
        let cc = normalize_addresses(&email.cc);
        let bcc = normalize_addresses(&email.bcc);

        if to.is_empty() && cc.is_empty() && bcc.is_empty() {
            return Err(Error::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(self.from_mailbox()?)
            .subject(email.subject.as_str());

        for address in &to {
            builder = builder.to(address.parse::<Mailbox>()?);
        }
        for address in &cc {
            builder = builder.cc(address.parse::<Mailbox>()?);
        }
        for address in &bcc {
            builder = builder.bcc(address.parse::<Mailbox>()?);
        }
        if let Some(reply_to) = email.reply_to.as_deref().filter(|r| !r.trim().is_empty()) {
            builder = builder.reply_to(reply_to.trim().parse::<Mailbox>()?);
        }

        let text = email
            .text
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| FALLBACK_TEXT.to_string());
        let html = if email.html.is_empty() {
            EMPTY_HTML.to_string()
        } else {
            email.html.clone()
        };
        let alternative = MultiPart::alternative_plain_html(text, html);

        let body = if email.attachments.is_empty() {
            alternative
        } else {
            let mut mixed = MultiPart::mixed().multipart(alternative);
            for path in email.attachments.iter().filter(|p| !p.as_os_str().is_empty()) {
                mixed = mixed.singlepart(attachment::load(path).await?);
            }
            mixed
        };

        Ok(builder.multipart(body)?)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let host = self.settings.host.as_str();

        let builder = if self.settings.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let mut builder = builder
            .port(self.settings.port)
            .timeout(Some(Duration::from_secs(self.settings.timeout_secs)));

        if let Some((user, password)) = self.settings.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), password.to_string()));
        }

        Ok(builder.build())
    }

    /// Send and return the number of envelope recipients (To + Cc + Bcc).
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<usize> {
        let message = self.build_message(email).await?;
        let recipients = message.envelope().to().len();

        let mailer = self.transport()?;
        mailer.send(message).await?;

        tracing::info!(
            "Email sent: subject={:?} recipients={}",
            email.subject,
            recipients
        );

        Ok(recipients)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> upkeep_core::Result<usize> {
        Ok(self.send_email(email).await?)
    }
}
