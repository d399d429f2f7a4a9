//! Requests of the admin console. Every one of them needs a session.

use gaam_shared::{
    account::{
        handle::manage::{CreateAdminDescriptor, ListRegistrationsDescriptor, ReviewDescriptor},
        AccountInfo, Role, Status,
    },
    gaam::{
        handle::{AdminGaamsDescriptor, CreateGaamDescriptor, SetAssignmentsDescriptor},
        GaamInfo,
    },
    Page,
};
use reqwest::{RequestBuilder, Response};

use super::parse_json;
use crate::Session;

pub struct ListRegistrations {
    pub session: Session,
    pub status: Option<Status>,
    pub gaam: Option<String>,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

#[async_trait::async_trait]
impl super::Request for ListRegistrations {
    type Output = Page<AccountInfo>;
    const URL_SUFFIX: &'static str = "/api/manage/registrations";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.headers()?)
            .json(&ListRegistrationsDescriptor {
                status: self.status,
                gaam: self.gaam.clone(),
                page: self.page,
                limit: self.limit,
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

/// Approves or rejects a pending registration.
pub struct Review {
    pub session: Session,
    pub target: String,
    pub decision: Status,
    pub notes: Option<String>,
}

#[async_trait::async_trait]
impl super::Request for Review {
    type Output = AccountInfo;
    const URL_SUFFIX: &'static str = "/api/manage/review";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.headers()?).json(&ReviewDescriptor {
            target: self.target.clone(),
            decision: self.decision,
            notes: self.notes.clone(),
        }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

/// Reads the gaams assigned to a gaam admin.
pub struct Assignments {
    pub session: Session,
    pub admin: String,
}

#[async_trait::async_trait]
impl super::Request for Assignments {
    type Output = Vec<GaamInfo>;
    const URL_SUFFIX: &'static str = "/api/manage/assignments";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.headers()?)
            .json(&AdminGaamsDescriptor {
                admin: self.admin.clone(),
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

/// Replaces the gaams assigned to a gaam admin.
pub struct SetAssignments {
    pub session: Session,
    pub admin: String,
    pub gaams: Vec<String>,
}

#[async_trait::async_trait]
impl super::Request for SetAssignments {
    type Output = Vec<GaamInfo>;
    const URL_SUFFIX: &'static str = "/api/manage/assignments/set";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.headers()?)
            .json(&SetAssignmentsDescriptor {
                admin: self.admin.clone(),
                gaams: self.gaams.clone(),
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

pub struct CreateGaam {
    pub session: Session,
    pub name: String,
    pub admin: Option<String>,
}

#[async_trait::async_trait]
impl super::Request for CreateGaam {
    type Output = GaamInfo;
    const URL_SUFFIX: &'static str = "/api/manage/gaam/create";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.headers()?)
            .json(&CreateGaamDescriptor {
                name: self.name.clone(),
                admin: self.admin.clone(),
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}

pub struct CreateAdmin {
    pub session: Session,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[async_trait::async_trait]
impl super::Request for CreateAdmin {
    type Output = AccountInfo;
    const URL_SUFFIX: &'static str = "/api/manage/admin/create";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.headers()?)
            .json(&CreateAdminDescriptor {
                full_name: self.full_name.clone(),
                email: self.email.parse()?,
                role: self.role,
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        parse_json(response).await
    }
}
