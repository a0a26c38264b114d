// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Record Status
//!
//! The status vocabulary shared by Letters of Interest and Applications, plus
//! the [`RecordRef`] value object used wherever a workflow artifact (history
//! row, notification intent, event) points back at the record it describes.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Status and record-reference value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::application::ApplicationId;
use crate::domain::loi::LoiId;

/// Lifecycle status of a grant record.
///
/// `InfoRequested` is only reachable by Applications; the transition table in
/// [`crate::domain::transitions`] decides which edges exist per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Draft,
    Submitted,
    UnderReview,
    InfoRequested,
    Approved,
    Declined,
    Withdrawn,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 7] = [
        RecordStatus::Draft,
        RecordStatus::Submitted,
        RecordStatus::UnderReview,
        RecordStatus::InfoRequested,
        RecordStatus::Approved,
        RecordStatus::Declined,
        RecordStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::InfoRequested => "INFO_REQUESTED",
            Self::Approved => "APPROVED",
            Self::Declined => "DECLINED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    /// Approved, declined and withdrawn records accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined | Self::Withdrawn)
    }

    /// A decided record carries a foundation decision that can be released.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown record status: {}", s))
    }
}

/// The two record types the workflow engine moves between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    LetterOfInterest,
    Application,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LetterOfInterest => f.write_str("letter of interest"),
            Self::Application => f.write_str("application"),
        }
    }
}

/// Final outcome a reviewer records on an LOI or Application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Declined,
}

impl Decision {
    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Approved => RecordStatus::Approved,
            Self::Declined => RecordStatus::Declined,
        }
    }
}

/// Reference to a single LOI or Application record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RecordRef {
    LetterOfInterest(LoiId),
    Application(ApplicationId),
}

impl RecordRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::LetterOfInterest(_) => EntityKind::LetterOfInterest,
            Self::Application(_) => EntityKind::Application,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LetterOfInterest(id) => write!(f, "loi:{}", id),
            Self::Application(id) => write!(f, "application:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_roundtrip() {
        for status in RecordStatus::ALL {
            assert_eq!(status.as_str().parse::<RecordStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&RecordStatus::InfoRequested).unwrap();
        assert_eq!(json, "\"INFO_REQUESTED\"");
    }

    #[test]
    fn test_terminal_and_decided() {
        assert!(RecordStatus::Withdrawn.is_terminal());
        assert!(!RecordStatus::Withdrawn.is_decided());
        assert!(RecordStatus::Approved.is_decided());
        assert!(!RecordStatus::UnderReview.is_terminal());
    }
}
