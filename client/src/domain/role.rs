//! Account roles recognised by the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of account roles.
///
/// The role decides which signup and login fields are required and which
/// backend endpoint variant is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Cattle owner, identified by an Aadhaar number.
    Farmer,
    /// Veterinarian, identified by email.
    Vet,
    /// Animal shelter, identified by email.
    Shelter,
}

impl Role {
    /// Every role in the order the role selector lists them.
    pub const ALL: [Self; 3] = [Self::Farmer, Self::Vet, Self::Shelter];

    /// Lowercase wire name used in request bodies and endpoint paths.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Vet => "vet",
            Self::Shelter => "shelter",
        }
    }

    /// Human label shown in the role selector.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Farmer => "Farmer",
            Self::Vet => "Veterinarian",
            Self::Shelter => "Shelter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'; expected farmer, vet or shelter")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "farmer" => Ok(Self::Farmer),
            "vet" | "veterinarian" => Ok(Self::Vet),
            "shelter" => Ok(Self::Shelter),
            _ => Err(UnknownRole(value.to_owned())),
        }
    }
}
