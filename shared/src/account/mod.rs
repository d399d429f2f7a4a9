pub mod handle;

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

/// The role of an account, fixed at creation.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unrestricted administrator, scoped to every gaam.
    SuperAdmin,
    /// Administrator scoped to the gaams assigned to it.
    GaamAdmin,
    /// A regular registrant.
    Member,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::GaamAdmin => "GAAM_ADMIN",
            Role::Member => "MEMBER",
        })
    }
}

/// Approval status of an account.
///
/// Only meaningful for members; admins are created approved.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Pending => "PENDING",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
        })
    }
}

/// The public view of an account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: Id,
    pub full_name: String,
    pub email: lettre::Address,
    pub username: String,
    pub role: Role,
    pub status: Status,
    /// The gaam this account registered under.
    pub gaam: Option<Id>,
    pub verified_at: Option<DateTime<Utc>>,
    /// The admin that decided the registration.
    pub verified_by: Option<Id>,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
