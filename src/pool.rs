//! Pending-transaction pool: claims awaiting commitment with their ordered scores.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// One transaction as submitted: a claim label opens a new group, a number
/// appends a score to the open group. JSON form is a bare string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    OpenClaim(String),
    AddScore(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingClaim {
    pub label: String,
    pub scores: Vec<f64>,
}

/// Ordered list of `(label, scores)` groups. Labels may repeat; the open
/// claim is always the most recently opened group.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    claims: Vec<PendingClaim>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_claim(&mut self, label: impl Into<String>) {
        self.claims.push(PendingClaim {
            label: label.into(),
            scores: Vec::new(),
        });
    }

    pub fn add_score(&mut self, value: f64) -> Result<(), LedgerError> {
        if !value.is_finite() {
            return Err(LedgerError::InvalidScore(value));
        }
        let open = self.claims.last_mut().ok_or(LedgerError::NoOpenClaim)?;
        open.scores.push(value);
        Ok(())
    }

    pub fn submit(&mut self, submission: Submission) -> Result<(), LedgerError> {
        match submission {
            Submission::OpenClaim(label) => {
                self.open_claim(label);
                Ok(())
            }
            Submission::AddScore(value) => self.add_score(value),
        }
    }

    /// Take every group in insertion order, leaving the pool empty with no open claim.
    pub fn drain_in_order(&mut self) -> Vec<PendingClaim> {
        std::mem::take(&mut self.claims)
    }

    pub fn open_label(&self) -> Option<&str> {
        self.claims.last().map(|c| c.label.as_str())
    }

    pub fn pending(&self) -> &[PendingClaim] {
        &self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
