//! Approval lifecycle statuses and the workflow steps derived from them.
//!
//! An approval moves through [`ApprovalStatus`] values; the coarse
//! [`WorkflowStep`] is never stored independently of the status, it is
//! always recomputed with [`ApprovalStatus::step`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Status
-------------------------------------------------------------------------- */

/// Lifecycle status of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    PendingReview,
    InReview,
    ChangesRequested,
    Approved,
    Rejected,
    Published,
    Archived,
}

impl ApprovalStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ApprovalStatus; 8] = [
        ApprovalStatus::Draft,
        ApprovalStatus::PendingReview,
        ApprovalStatus::InReview,
        ApprovalStatus::ChangesRequested,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
        ApprovalStatus::Published,
        ApprovalStatus::Archived,
    ];

    /// Canonical text form, as stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "DRAFT",
            ApprovalStatus::PendingReview => "PENDING_REVIEW",
            ApprovalStatus::InReview => "IN_REVIEW",
            ApprovalStatus::ChangesRequested => "CHANGES_REQUESTED",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
            ApprovalStatus::Published => "PUBLISHED",
            ApprovalStatus::Archived => "ARCHIVED",
        }
    }

    /// The workflow step this status belongs to.
    pub fn step(self) -> WorkflowStep {
        match self {
            ApprovalStatus::Draft => WorkflowStep::Creation,
            ApprovalStatus::PendingReview
            | ApprovalStatus::InReview
            | ApprovalStatus::ChangesRequested => WorkflowStep::Review,
            ApprovalStatus::Approved | ApprovalStatus::Rejected => WorkflowStep::Approval,
            ApprovalStatus::Published | ApprovalStatus::Archived => WorkflowStep::Publication,
        }
    }

    /// Published and archived approvals only leave their state through a
    /// fresh `DRAFT` cycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, ApprovalStatus::Published | ApprovalStatus::Archived)
    }

    /// Check that an approval currently in `self` may move to `next`.
    pub fn validate_transition(self, next: ApprovalStatus) -> Result<(), CoreError> {
        if self.is_terminal() && next != ApprovalStatus::Draft {
            return Err(CoreError::Validation(format!(
                "Approval is {self}; it can only be reopened as {}",
                ApprovalStatus::Draft
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApprovalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ApprovalStatus::ALL.iter().map(|s| s.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid approval status '{s}'. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for ApprovalStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/* --------------------------------------------------------------------------
Step
-------------------------------------------------------------------------- */

/// Coarse workflow phase derived from an [`ApprovalStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    Creation,
    Review,
    Approval,
    Publication,
}

impl WorkflowStep {
    /// Every step, in workflow order.
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Creation,
        WorkflowStep::Review,
        WorkflowStep::Approval,
        WorkflowStep::Publication,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStep::Creation => "CREATION",
            WorkflowStep::Review => "REVIEW",
            WorkflowStep::Approval => "APPROVAL",
            WorkflowStep::Publication => "PUBLICATION",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStep {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid workflow step '{s}'")))
    }
}

impl TryFrom<String> for WorkflowStep {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Derive the workflow step from raw status text.
///
/// Total over all input: text that is not a known status maps to
/// [`WorkflowStep::Creation`].
pub fn step_for_status(status: &str) -> WorkflowStep {
    status
        .parse::<ApprovalStatus>()
        .map(ApprovalStatus::step)
        .unwrap_or(WorkflowStep::Creation)
}

/// Check a caller-supplied step against the one derived from `status`.
pub fn validate_step(status: ApprovalStatus, step: Option<WorkflowStep>) -> Result<(), CoreError> {
    match step {
        Some(step) if step != status.step() => Err(CoreError::Validation(format!(
            "Step {step} does not match status {status} (expected {})",
            status.step()
        ))),
        _ => Ok(()),
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn step_partition_covers_every_status() {
        use ApprovalStatus::*;
        use WorkflowStep::*;

        let expected = [
            (Draft, Creation),
            (PendingReview, Review),
            (InReview, Review),
            (ChangesRequested, Review),
            (Approved, Approval),
            (Rejected, Approval),
            (Published, Publication),
            (Archived, Publication),
        ];
        for (status, step) in expected {
            assert_eq!(status.step(), step, "{status}");
            assert_eq!(step_for_status(status.as_str()), step, "{status}");
        }
    }

    #[test]
    fn unknown_status_text_maps_to_creation() {
        assert_eq!(step_for_status("SOMETHING_NEW"), WorkflowStep::Creation);
        assert_eq!(step_for_status(""), WorkflowStep::Creation);
        assert_eq!(step_for_status("published"), WorkflowStep::Creation);
    }

    #[test]
    fn status_text_round_trips() {
        for status in ApprovalStatus::ALL {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
    }

    #[test]
    fn invalid_status_is_a_validation_error() {
        let err = "LIMBO".parse::<ApprovalStatus>().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("LIMBO"));
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ApprovalStatus::ChangesRequested).unwrap();
        assert_eq!(json, "\"CHANGES_REQUESTED\"");

        let step: WorkflowStep = serde_json::from_str("\"PUBLICATION\"").unwrap();
        assert_eq!(step, WorkflowStep::Publication);
    }

    #[test]
    fn only_published_and_archived_are_terminal() {
        let terminal: Vec<_> = ApprovalStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![ApprovalStatus::Published, ApprovalStatus::Archived]);
    }

    #[test]
    fn terminal_status_only_reopens_as_draft() {
        let published = ApprovalStatus::Published;
        assert!(published.validate_transition(ApprovalStatus::Draft).is_ok());
        assert_matches!(
            published.validate_transition(ApprovalStatus::InReview),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            ApprovalStatus::Archived.validate_transition(ApprovalStatus::Published),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn non_terminal_status_accepts_any_transition() {
        for next in ApprovalStatus::ALL {
            assert!(ApprovalStatus::InReview.validate_transition(next).is_ok());
        }
    }

    #[test]
    fn mismatched_step_is_rejected() {
        assert!(validate_step(ApprovalStatus::PendingReview, Some(WorkflowStep::Review)).is_ok());
        assert!(validate_step(ApprovalStatus::PendingReview, None).is_ok());
        assert_matches!(
            validate_step(ApprovalStatus::PendingReview, Some(WorkflowStep::Approval)),
            Err(CoreError::Validation(_))
        );
    }
}
