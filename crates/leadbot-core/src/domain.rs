//! Enumerations shared between persistence, HTTP, and the intelligence pipeline.

use serde::{Deserialize, Serialize};

/// Lifecycle of a contact (lead) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    New,
    InProgress,
    Resolved,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [Self::New, Self::InProgress, Self::Resolved];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    /// Parse the database / query-string representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Operator-driven transitions. Resolved contacts may be reopened, but
    /// nothing moves back to `new`.
    #[must_use]
    pub fn can_transition_to(self, next: ContactStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::InProgress | Self::Resolved)
                | (Self::InProgress | Self::Resolved, Self::InProgress | Self::Resolved)
        ) && self != next
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category picked on the public contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryCategory {
    General,
    Sales,
    Partnership,
    Support,
    Careers,
    Press,
}

impl InquiryCategory {
    pub const ALL: [InquiryCategory; 6] = [
        Self::General,
        Self::Sales,
        Self::Partnership,
        Self::Support,
        Self::Careers,
        Self::Press,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Sales => "sales",
            Self::Partnership => "partnership",
            Self::Support => "support",
            Self::Careers => "careers",
            Self::Press => "press",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl std::fmt::Display for InquiryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse sales-readiness of a chat visitor: tier1 is hot, tier3 is cold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Tier1,
    Tier2,
    Tier3,
}

impl PriorityTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
            Self::Tier3 => "tier3",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tier1" => Some(Self::Tier1),
            "tier2" => Some(Self::Tier2),
            "tier3" => Some(Self::Tier3),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Tier1 => "hot",
            Self::Tier2 => "warm",
            Self::Tier3 => "cold",
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
