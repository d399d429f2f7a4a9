use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct CreateGaamDescriptor {
    pub name: String,
    /// Raw id of an initial admin.
    #[serde(default)]
    pub admin: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetAssignmentsDescriptor {
    /// Raw id of the gaam admin.
    pub admin: String,
    /// Raw gaam ids. Values without a plausible id shape are dropped.
    #[serde(default)]
    pub gaams: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AdminGaamsDescriptor {
    /// Raw id of the gaam admin.
    pub admin: String,
}
