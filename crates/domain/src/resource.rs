use std::fmt::{Display, Formatter};
use std::str::FromStr;

use dirsweep_core::AppError;
use serde::{Deserialize, Serialize};

/// Directory object kinds that support soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectoryResourceType {
    /// Application registration.
    Application,
    /// Service principal (enterprise application or agent identity).
    ServicePrincipal,
    /// User account, including agent users.
    User,
    /// Microsoft 365 or security group.
    Group,
}

impl DirectoryResourceType {
    /// Returns the stable transport value for this resource type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::ServicePrincipal => "servicePrincipal",
            Self::User => "user",
            Self::Group => "group",
        }
    }

    /// Returns the collection segment that owns live objects of this type.
    #[must_use]
    pub fn collection_path(&self) -> &'static str {
        match self {
            Self::Application => "applications",
            Self::ServicePrincipal => "servicePrincipals",
            Self::User => "users",
            Self::Group => "groups",
        }
    }

    /// Returns all known resource types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[DirectoryResourceType] = &[
            DirectoryResourceType::Application,
            DirectoryResourceType::ServicePrincipal,
            DirectoryResourceType::User,
            DirectoryResourceType::Group,
        ];

        ALL
    }
}

impl Display for DirectoryResourceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for DirectoryResourceType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource_type| resource_type.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                AppError::Validation(format!("unknown directory resource type '{value}'"))
            })
    }
}
