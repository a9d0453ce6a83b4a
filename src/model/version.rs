//! Value objects shared by several entity kinds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::ResourceType;
use crate::identity::ResourceId;

/// A version string plus its lifecycle dates.
///
/// Equality is structural: the string and all three dates must match, two
/// absent dates are equal, and two present dates are equal iff they are the
/// same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_from: Option<DateTime<Utc>>,
}

impl Version {
    /// A version with no lifecycle dates.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn available_from(mut self, at: DateTime<Utc>) -> Self {
        self.available_from = Some(at);
        self
    }

    #[must_use]
    pub fn deprecated_from(mut self, at: DateTime<Utc>) -> Self {
        self.deprecated_from = Some(at);
        self
    }

    #[must_use]
    pub fn terminated_from(mut self, at: DateTime<Utc>) -> Self {
        self.terminated_from = Some(at);
        self
    }
}

/// Interface technology of an API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiType {
    #[default]
    Unknown,
    Other,
    #[serde(rename = "GraphQL")]
    GraphQl,
    #[serde(rename = "GRPC")]
    Grpc,
    #[serde(rename = "OpenAPI")]
    OpenApi,
}

impl ApiType {
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::Other,
        Self::GraphQl,
        Self::Grpc,
        Self::OpenApi,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Other => "Other",
            Self::GraphQl => "GraphQL",
            Self::Grpc => "GRPC",
            Self::OpenApi => "OpenAPI",
        }
    }

    /// Parses a display name; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed pointer to any stored entity, as listed by a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub resource_id: ResourceId,
    pub resource_type: ResourceType,
}

impl ResourceRef {
    #[must_use]
    pub const fn new(resource_type: ResourceType, resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            resource_type,
        }
    }
}
