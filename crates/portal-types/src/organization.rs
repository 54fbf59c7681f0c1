//! Client organization (member company) types

use serde::{Deserialize, Serialize};

/// Organization identifier (`members.id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub i32);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MemberId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Client company that agents are placed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: MemberId,
    /// Company name
    #[serde(rename = "company")]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub logo: Option<String>,
    pub service: Option<String>,
    pub status: Option<String>,
    pub badge_color: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub website: Vec<String>,
}

impl Organization {
    /// Organization with only an id and a name
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            phone: None,
            logo: None,
            service: None,
            status: None,
            badge_color: None,
            country: None,
            website: Vec::new(),
        }
    }
}
