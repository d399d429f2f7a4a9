use gaam_shared::account::{
    handle::{LoginDescriptor, LoginResult, RegisterDescriptor, RegisterResult, RequestOtpDescriptor},
    AccountInfo,
};
use reqwest::{RequestBuilder, Response};

use super::parse_json;
use crate::Session;

/// Submits a member registration under a gaam.
pub struct Register {
    pub full_name: String,
    pub email: String,
    pub gaam: String,
}

#[async_trait::async_trait]
impl super::Request for Register {
    type Output = RegisterResult;
    const URL_SUFFIX: &'static str = "/api/account/register";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.json(&RegisterDescriptor {
            full_name: self.full_name.clone(),
            email: self.email.parse()?,
            gaam: self.gaam.clone(),
        }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

/// Asks for a one-time login code by username or email.
pub struct RequestOtp {
    pub identifier: String,
}

#[async_trait::async_trait]
impl super::Request for RequestOtp {
    type Output = ();
    const URL_SUFFIX: &'static str = "/api/account/request-otp";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.json(&RequestOtpDescriptor {
            identifier: self.identifier.clone(),
        }))
    }

    async fn parse_res(&mut self, _response: Response) -> anyhow::Result<Self::Output> {
        Ok(())
    }
}

/// Logs in with a password (admins) or a one-time code (members).
pub struct Login {
    pub identifier: String,
    pub password: Option<String>,
    pub otp: Option<String>,
}

impl Login {
    /// The session this login opened.
    pub fn session(result: &LoginResult) -> Session {
        Session {
            account: result.account.id.clone(),
            token: result.token.clone(),
        }
    }
}

#[async_trait::async_trait]
impl super::Request for Login {
    type Output = LoginResult;
    const URL_SUFFIX: &'static str = "/api/account/login";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.json(&LoginDescriptor {
            identifier: self.identifier.clone(),
            password: self.password.clone(),
            otp: self.otp.clone(),
        }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

pub struct Logout {
    pub session: Session,
}

#[async_trait::async_trait]
impl super::Request for Logout {
    type Output = ();
    const URL_SUFFIX: &'static str = "/api/account/logout";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.headers()?))
    }

    async fn parse_res(&mut self, _response: Response) -> anyhow::Result<Self::Output> {
        Ok(())
    }
}

/// Reads the logged-in account.
pub struct SelfInfo {
    pub session: Session,
}

#[async_trait::async_trait]
impl super::Request for SelfInfo {
    type Output = AccountInfo;
    const URL_SUFFIX: &'static str = "/api/account/self";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.headers()?))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}
