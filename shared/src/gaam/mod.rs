pub mod handle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

/// The public view of a gaam.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GaamInfo {
    pub id: Id,
    pub name: String,
    pub slug: String,
    /// Legacy single-admin reference.
    ///
    /// Read-only projection of the assignment set, kept for older clients.
    pub admin: Option<Id>,
    pub created_at: DateTime<Utc>,
}
