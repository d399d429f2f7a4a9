//! Http client for the gaam registration backend.

pub mod raw;

pub use gaam_shared::{
    account::{AccountInfo, Role, Status},
    gaam::GaamInfo,
    Id, Page,
};

/// Where and how requests are sent.
pub struct Context {
    req_client: reqwest::Client,
    url_prefix: String,
}

impl Context {
    /// Creates a context sending requests to `url_prefix`, such as
    /// `http://127.0.0.1:8080`.
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            req_client: reqwest::Client::new(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_owned(),
        }
    }
}

/// A logged-in session, sent along with authenticated requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Id,
    pub token: String,
}

impl Session {
    fn headers(&self) -> anyhow::Result<reqwest::header::HeaderMap> {
        let mut map = reqwest::header::HeaderMap::new();
        map.insert("AccountId", self.account.as_str().parse()?);
        map.insert("Token", self.token.parse()?);
        Ok(map)
    }
}
