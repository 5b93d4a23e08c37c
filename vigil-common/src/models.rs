//! Report model shared by the hub API and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MIN_URGENCY: u32 = 1;
pub const MAX_URGENCY: u32 = 10;
/// Reports at or above this urgency count as urgent
pub const URGENT_THRESHOLD: u32 = 8;

/// Kind of corruption being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bribery,
    Embezzlement,
    Fraud,
    Nepotism,
    Extortion,
    AbuseOfPower,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Bribery,
        Category::Embezzlement,
        Category::Fraud,
        Category::Nepotism,
        Category::Extortion,
        Category::AbuseOfPower,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bribery => "bribery",
            Category::Embezzlement => "embezzlement",
            Category::Fraud => "fraud",
            Category::Nepotism => "nepotism",
            Category::Extortion => "extortion",
            Category::AbuseOfPower => "abuse_of_power",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown category: {}", s)))
    }
}

/// Triage status of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Investigating,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 5] = [
        ReportStatus::Pending,
        ReportStatus::UnderReview,
        ReportStatus::Investigating,
        ReportStatus::Resolved,
        ReportStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::UnderReview => "under_review",
            ReportStatus::Investigating => "investigating",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    /// Still awaiting a decision
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ReportStatus::Pending | ReportStatus::UnderReview | ReportStatus::Investigating
        )
    }

    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Rejected)
                | (UnderReview, Investigating)
                | (UnderReview, Resolved)
                | (UnderReview, Rejected)
                | (Investigating, Resolved)
                | (Investigating, Rejected)
        )
    }

    /// Validate a transition, returning the new status
    pub fn transition_to(&self, next: ReportStatus) -> Result<ReportStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ReportStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown status: {}", s)))
    }
}

/// A stored incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: ReportStatus,
    pub urgency_level: u32,
    pub location: String,
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn is_urgent(&self) -> bool {
        self.urgency_level >= URGENT_THRESHOLD
    }
}

/// Citizen submission body for `POST /api/reports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub urgency_level: u32,
    pub location: String,
    #[serde(default)]
    pub anonymous: bool,
}

impl NewReport {
    /// Field validation; returns the submission with text fields trimmed
    pub fn validate(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        self.description = self.description.trim().to_string();

        if self.title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::InvalidInput(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if self.location.is_empty() {
            return Err(Error::InvalidInput("location must not be empty".to_string()));
        }
        if !(MIN_URGENCY..=MAX_URGENCY).contains(&self.urgency_level) {
            return Err(Error::InvalidInput(format!(
                "urgencyLevel must be between {} and {}",
                MIN_URGENCY, MAX_URGENCY
            )));
        }
        Ok(self)
    }

    /// Build the stored report, status `pending`
    pub fn into_report(self, now: DateTime<Utc>) -> Report {
        Report {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            status: ReportStatus::Pending,
            urgency_level: self.urgency_level,
            location: self.location,
            anonymous: self.anonymous,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Staff body for `PATCH /api/reports/:id/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ReportStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> NewReport {
        NewReport {
            title: "  Bribe requested at permit office ".to_string(),
            description: String::new(),
            category: Category::Bribery,
            urgency_level: 7,
            location: "Nairobi".to_string(),
            anonymous: true,
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let report = submission().validate().unwrap();
        assert_eq!(report.title, "Bribe requested at permit office");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut empty_title = submission();
        empty_title.title = "   ".to_string();
        assert!(matches!(empty_title.validate(), Err(Error::InvalidInput(_))));

        let mut no_location = submission();
        no_location.location = String::new();
        assert!(no_location.validate().is_err());

        let mut too_urgent = submission();
        too_urgent.urgency_level = 11;
        assert!(too_urgent.validate().is_err());

        let mut zero_urgency = submission();
        zero_urgency.urgency_level = 0;
        assert!(zero_urgency.validate().is_err());

        let mut long_title = submission();
        long_title.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn test_into_report_starts_pending() {
        let now = Utc::now();
        let report = submission().validate().unwrap().into_report(now);
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.created_at, now);
        assert!(!report.is_urgent());
    }

    #[test]
    fn test_status_transitions() {
        use ReportStatus::*;
        assert!(Pending.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Investigating));
        assert!(Investigating.can_transition_to(Resolved));
        assert!(!Pending.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(UnderReview));

        let err = Resolved.transition_to(Investigating).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition: resolved -> investigating");
    }

    #[test]
    fn test_enum_string_round_trip_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        for status in ReportStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("teleportation".parse::<Category>().is_err());
    }

    #[test]
    fn test_new_report_wire_format() {
        let body: NewReport = serde_json::from_str(
            r#"{"title":"t","category":"abuse_of_power","urgencyLevel":3,"location":"Kisumu"}"#,
        )
        .unwrap();
        assert_eq!(body.category, Category::AbuseOfPower);
        assert!(!body.anonymous);
    }
}
