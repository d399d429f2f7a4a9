use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountInfo, Status};
use crate::Id;

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterDescriptor {
    pub full_name: String,
    pub email: lettre::Address,
    /// Raw gaam id, validated by the server.
    pub gaam: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResult {
    pub id: Id,
    pub username: String,
    pub status: Status,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RequestOtpDescriptor {
    /// Username or email.
    pub identifier: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LoginDescriptor {
    /// Username or email.
    pub identifier: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResult {
    pub token: String,
    pub expire_at: Option<DateTime<Utc>>,
    pub account: AccountInfo,
}

pub mod manage {
    use serde::{Deserialize, Serialize};

    use crate::account::{Role, Status};

    #[derive(Serialize, Deserialize, Debug)]
    pub struct ListRegistrationsDescriptor {
        #[serde(default)]
        pub status: Option<Status>,
        /// Raw gaam id to narrow the listing to.
        #[serde(default)]
        pub gaam: Option<String>,
        #[serde(default = "default_page")]
        pub page: usize,
        #[serde(default = "default_limit")]
        pub limit: usize,
    }

    impl Default for ListRegistrationsDescriptor {
        fn default() -> Self {
            Self {
                status: None,
                gaam: None,
                page: default_page(),
                limit: default_limit(),
            }
        }
    }

    fn default_page() -> usize {
        1
    }

    fn default_limit() -> usize {
        10
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct ReviewDescriptor {
        /// Raw id of the member account under review.
        pub target: String,
        pub decision: Status,
        #[serde(default)]
        pub notes: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct CreateAdminDescriptor {
        pub full_name: String,
        pub email: lettre::Address,
        pub role: Role,
    }
}

