//! Outgoing notifications.

use std::fmt::Debug;

use axum::async_trait;
use gaam_shared::account::Status;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials as SmtpCredentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{account::otp::Code, config, Error};

/// Whether a failed delivery fails the operation that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Failures are logged and dropped.
    BestEffort,
    /// Failures propagate to the caller.
    MustSucceed,
}

/// Login details carried by a notification.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A notification sent to an account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A registration was stored and waits for review.
    RegistrationReceived { name: String },
    /// A registration was decided.
    StatusChange {
        name: String,
        status: Status,
        /// Present on approval.
        credentials: Option<Credentials>,
        notes: Option<String>,
    },
    /// A one-time login code.
    Otp { name: String, code: Code },
    /// An admin account was created.
    AdminCredentials {
        name: String,
        credentials: Credentials,
    },
}

impl Notification {
    #[inline]
    pub fn delivery(&self) -> Delivery {
        match self {
            Notification::Otp { .. } => Delivery::MustSucceed,
            Notification::RegistrationReceived { .. }
            | Notification::StatusChange { .. }
            | Notification::AdminCredentials { .. } => Delivery::BestEffort,
        }
    }

    /// A short name for logs, free of secrets.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::RegistrationReceived { .. } => "registration received",
            Notification::StatusChange { .. } => "status change",
            Notification::Otp { .. } => "otp",
            Notification::AdminCredentials { .. } => "admin credentials",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::RegistrationReceived { .. } => "Your registration was received".to_owned(),
            Notification::StatusChange { status, .. } => {
                format!("Your registration is {}", status.to_string().to_lowercase())
            }
            Notification::Otp { .. } => "Your login code".to_owned(),
            Notification::AdminCredentials { .. } => "Your admin account".to_owned(),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::RegistrationReceived { name } => format!(
                "Dear {name},\n\nYour registration was received and will be reviewed by an admin of your gaam. \
                 You will get another email once it has been decided."
            ),
            Notification::StatusChange {
                name,
                status,
                credentials,
                notes,
            } => {
                let mut body = format!(
                    "Dear {name},\n\nYour registration is now {}.",
                    status.to_string().to_lowercase()
                );
                if let Some(Credentials { username, password }) = credentials {
                    body.push_str(&format!(
                        "\n\nUsername: {username}\nPassword: {password}\n\n\
                         Members log in with a one-time code sent to this address."
                    ));
                }
                if let Some(notes) = notes {
                    body.push_str(&format!("\n\nNotes from the reviewer:\n{notes}"));
                }
                body
            }
            Notification::Otp { name, code } => format!(
                "Dear {name},\n\nYour login code is: \n\n{code}\n\nIt expires in {} minutes.",
                crate::account::otp::Otp::TTL_MINUTES
            ),
            Notification::AdminCredentials {
                name,
                credentials: Credentials { username, password },
            } => format!(
                "Dear {name},\n\nAn admin account was created for you.\n\n\
                 Username: {username}\nPassword: {password}"
            ),
        }
    }
}

/// Delivers notifications.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &lettre::Address, notification: &Notification) -> Result<(), Error>;
}

/// Sends a notification, honoring its [`Delivery`].
///
/// # Errors
///
/// - Errors only if a [`Delivery::MustSucceed`] notification failed.
pub async fn notify(
    mailer: &dyn Mailer,
    to: &lettre::Address,
    notification: Notification,
) -> Result<(), Error> {
    let result = mailer.send(to, &notification).await;
    match (result, notification.delivery()) {
        (Ok(()), _) => Ok(()),
        (Err(err), Delivery::BestEffort) => {
            tracing::warn!(
                "dropping {} notification to {to}: {err}",
                notification.kind()
            );
            Ok(())
        }
        (Err(err), Delivery::MustSucceed) => {
            tracing::error!(
                "error sending {} notification to {to}: {err}",
                notification.kind()
            );
            Err(err)
        }
    }
}

/// A mailer sending through an smtp relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &config::Smtp) -> Result<Self, Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)?
            .port(config.port)
            .credentials(SmtpCredentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: Mailbox::new(Some(config.sender_name.clone()), config.address.clone()),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &lettre::Address, notification: &Notification) -> Result<(), Error> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to.clone()))
            .subject(notification.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body())?;
        self.transport.send(msg).await?;
        Ok(())
    }
}

/// A mailer that only logs what it would send.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &lettre::Address, notification: &Notification) -> Result<(), Error> {
        tracing::info!(
            "{} notification to {to}: {}",
            notification.kind(),
            notification.subject()
        );
        Ok(())
    }
}
