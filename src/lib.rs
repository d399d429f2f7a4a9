use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Router};
use gaam_shared::{account::Status, Id};
use lettre::transport::smtp;
use rand::Rng;
use serde::Serialize;

pub mod config;

pub mod account;
pub mod gaam;
pub mod handle;
pub mod mail;
pub mod session;
pub mod store;

/// Workflow and http tests.
#[cfg(test)]
mod tests;

use config::Config;
use mail::Mailer;
use session::Sessions;
use store::{Conflict, Store};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("permission denied")]
    Forbidden,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account not found")]
    AccountNotFound,
    #[error("gaam not found ({resolved} of {requested} requested gaams exist)")]
    GaamNotFound { requested: usize, resolved: usize },
    #[error("an account with this email or username already exists")]
    DuplicateAccount,
    #[error("registration status cannot change from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("account is not affiliated with a gaam")]
    MissingGaamAssignment,
    #[error("a one-time password is required, request one by email")]
    OtpRequired,
    #[error("the one-time password is incorrect")]
    InvalidOtp,
    #[error("the one-time password has expired, request a new one")]
    OtpExpired,
    #[error("registration is waiting for verification by an admin")]
    PendingVerification,
    #[error("registration has been rejected")]
    RegistrationRejected,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(Conflict),

    #[error("not logged in")]
    NotLoggedIn,
    #[error("non-ascii header value: {0}")]
    HeaderNonAscii(axum::http::header::ToStrError),
    #[error("auth headers are not valid AccountId and Token values")]
    InvalidAuthHeader,

    #[error("address error: {0}")]
    EmailAddress(lettre::address::AddressError),
    #[error("email message error: {0}")]
    Lettre(lettre::error::Error),
    #[error("failed to send email")]
    Smtp(smtp::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("failed to encode record: {0}")]
    TomlSer(toml::ser::Error),
    #[error("failed to decode record: {0}")]
    TomlDe(toml::de::Error),
}

impl Error {
    pub fn to_status_code(&self) -> StatusCode {
        match self {
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::InvalidCredentials
            | Error::OtpRequired
            | Error::InvalidOtp
            | Error::OtpExpired
            | Error::PendingVerification
            | Error::RegistrationRejected
            | Error::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Error::AccountNotFound | Error::GaamNotFound { .. } => StatusCode::NOT_FOUND,
            Error::DuplicateAccount | Error::InvalidTransition { .. } | Error::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Error::MissingGaamAssignment => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Validation(_)
            | Error::HeaderNonAscii(_)
            | Error::InvalidAuthHeader
            | Error::EmailAddress(_) => StatusCode::BAD_REQUEST,
            Error::Lettre(_) | Error::Smtp(_) => StatusCode::BAD_GATEWAY,
            Error::PasswordHash(_) | Error::Io(_) | Error::TomlSer(_) | Error::TomlDe(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    #[inline]
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorInfo {
            error: String,
        }
        let status = self.to_status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (
            status,
            axum::Json(ErrorInfo {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Implements `From<T>` for [`Error`].
macro_rules! impl_from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(
            impl From<$t> for $crate::Error {
                #[inline]
                fn from(err: $t) -> Self {
                    Self::$v(err)
                }
            }
        )*
    };
}

impl_from! {
    Conflict => Conflict,
    axum::http::header::ToStrError => HeaderNonAscii,
    lettre::address::AddressError => EmailAddress,
    lettre::error::Error => Lettre,
    smtp::Error => Smtp,
    argon2::password_hash::Error => PasswordHash,
    std::io::Error => Io,
    toml::ser::Error => TomlSer,
    toml::de::Error => TomlDe,
}

/// Shared state of every request handler.
#[derive(Clone)]
pub struct Global {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub sessions: Arc<Sessions>,
    pub config: Arc<Config>,
}

impl Global {
    /// Builds the state described by `config`.
    ///
    /// Opens the on-disk store if a data directory is configured and
    /// picks the smtp mailer if an smtp section is present.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let store: Arc<dyn Store> = match config.store.data_dir {
            Some(ref dir) => Arc::new(store::MemoryStore::open(dir)?),
            None => Arc::new(store::MemoryStore::new()),
        };
        let mailer: Arc<dyn Mailer> = match config.smtp {
            Some(ref smtp) => Arc::new(mail::SmtpMailer::new(smtp)?),
            None => {
                tracing::warn!("no smtp section configured, notifications will only be logged");
                Arc::new(mail::LogMailer)
            }
        };
        Ok(Self {
            store,
            mailer,
            sessions: Arc::new(Sessions::new(config.session.expire_hours)),
            config: Arc::new(config),
        })
    }
}

/// Generates a new record id.
pub fn new_id() -> Id {
    const LEN: usize = 24;
    let mut rng = rand::thread_rng();
    let mut raw = String::with_capacity(LEN + 1);
    raw.push('c');
    for _ in 0..LEN {
        raw.push(char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'));
    }
    Id::new_unchecked(raw)
}

/// Construct a router.
pub fn router(global: Global) -> Router {
    Router::new()
        // account
        .route("/api/account/register", post(handle::account::register))
        .route("/api/account/request-otp", post(handle::account::request_otp))
        .route("/api/account/login", post(handle::account::login))
        .route("/api/account/logout", post(handle::account::logout))
        .route("/api/account/self", post(handle::account::self_info))
        // gaam
        .route("/api/gaam/list", post(handle::gaam::list))
        // management
        .route(
            "/api/manage/registrations",
            post(handle::manage::registrations),
        )
        .route("/api/manage/review", post(handle::manage::review))
        .route("/api/manage/assignments", post(handle::manage::assignments))
        .route(
            "/api/manage/assignments/set",
            post(handle::manage::set_assignments),
        )
        .route("/api/manage/gaam/create", post(handle::manage::create_gaam))
        .route("/api/manage/admin/create", post(handle::manage::create_admin))
        .with_state(global)
}
