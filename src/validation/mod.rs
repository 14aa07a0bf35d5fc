//! Ordering Validator
//!
//! Two deliberately separate rule sets over the same layer vocabulary:
//! - insertion-time: may this kind be placed into the current architecture
//! - submission-time: is this whole architecture trainable
//!
//! The submission rules are narrower than the insertion rules (they do not
//! look at `Conv1x1` or `BatchNorm` after a `Dense`). Keep them apart.

mod insertion;
mod submission;

pub use insertion::can_insert;
pub use submission::validate_for_training;

use crate::error::NetArchError;

/// Outcome of an ordering rule check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject { reason: String },
}

impl Verdict {
    pub fn reject(reason: impl Into<String>) -> Self {
        Verdict::Reject {
            reason: reason.into(),
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Accept => None,
            Verdict::Reject { reason } => Some(reason),
        }
    }

    /// Convert a rejection into a [`NetArchError::Structural`]
    pub fn into_structural(self) -> crate::Result<()> {
        match self {
            Verdict::Accept => Ok(()),
            Verdict::Reject { reason } => Err(NetArchError::Structural { reason }),
        }
    }

    /// Convert a rejection into a [`NetArchError::SubmissionValidation`]
    pub fn into_submission(self) -> crate::Result<()> {
        match self {
            Verdict::Accept => Ok(()),
            Verdict::Reject { reason } => Err(NetArchError::SubmissionValidation { reason }),
        }
    }
}
