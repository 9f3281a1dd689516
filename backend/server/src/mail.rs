//! # Mail dispatch
//!
//! Hands one composed notification to the host mail transport.
//!
//! - Default: the host `sendmail` binary, the same facility a plain web host offers
//! - With `SMTP_HOST`: a local or remote SMTP relay, optional credentials
//!
//! A send is attempted exactly once. There is no queue and no retry.
use async_trait::async_trait;
use lettre::{
    Address, AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    address::AddressError,
    message::{Mailbox, header::ContentType},
    transport::{sendmail, smtp, smtp::authentication::Credentials},
};
use thiserror::Error;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::SmtpConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport failed: {0}")]
    Smtp(#[from] smtp::Error),

    #[error("sendmail transport failed: {0}")]
    Sendmail(#[from] sendmail::Error),
}

#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct OutboundMail {
    pub to: String,
    pub from_name: String,
    pub from_domain: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

impl OutboundMail {
    pub fn to_message(&self) -> Result<Message, MailError> {
        let from = Mailbox::new(
            Some(self.from_name.clone()),
            Address::new("noreply", &self.from_domain)?,
        );

        let message = Message::builder()
            .from(from)
            .reply_to(Mailbox::new(None, self.reply_to.parse()?))
            .to(Mailbox::new(None, self.to.parse()?))
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(self.html.clone())?;

        Ok(message)
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn transport_tag(&self) -> &'static str;

    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError>;
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Sendmail(AsyncSendmailTransport<Tokio1Executor>),
}

pub struct LettreMailer {
    transport: Transport,
}

impl LettreMailer {
    pub fn new(smtp: Option<&SmtpConfig>) -> Self {
        let transport = match smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "Using SMTP relay");

                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp.host.as_str())
                        .port(smtp.port);

                if let (Some(user), Some(password)) = (&smtp.user, &smtp.password) {
                    builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
                }

                Transport::Smtp(builder.build())
            }
            None => Transport::Sendmail(AsyncSendmailTransport::<Tokio1Executor>::new()),
        };

        Self { transport }
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    fn transport_tag(&self) -> &'static str {
        match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::Sendmail(_) => "sendmail",
        }
    }

    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        let message = mail.to_message()?;

        match &self.transport {
            Transport::Smtp(transport) => {
                transport.send(message).await?;
            }
            Transport::Sendmail(transport) => {
                transport.send(message).await?;
            }
        }

        Ok(())
    }
}
