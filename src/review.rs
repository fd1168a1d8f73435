//! External review lookup for claim labels.
//!
//! The third-party fact-check service lives outside this crate; the ledger only
//! sees the [`ReviewService`] contract, which never fails.

use serde::{Serialize, Serializer};
use std::collections::HashMap;

pub const NO_REVIEW_FOUND: &str = "No review found";
pub const NO_CLAIM_ENTERED: &str = "There is no claim entered";

/// Outcome of a review lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    /// Textual ratings, one per review found.
    Ratings(Vec<String>),
    NotFound,
    NoClaim,
}

impl Serialize for Review {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Review::Ratings(r) => r.serialize(serializer),
            Review::NotFound => serializer.serialize_str(NO_REVIEW_FOUND),
            Review::NoClaim => serializer.serialize_str(NO_CLAIM_ENTERED),
        }
    }
}

pub trait ReviewService: Send + Sync {
    fn retrieve_review(&self, claim: &str) -> Review;
}

/// Lookup used when no review backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineReviews;

impl ReviewService for OfflineReviews {
    fn retrieve_review(&self, claim: &str) -> Review {
        if claim.trim().is_empty() {
            Review::NoClaim
        } else {
            Review::NotFound
        }
    }
}

/// In-memory label -> ratings table.
#[derive(Debug, Clone, Default)]
pub struct FixtureReviews {
    ratings: HashMap<String, Vec<String>>,
}

impl FixtureReviews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, claim: impl Into<String>, ratings: &[&str]) -> Self {
        self.ratings
            .insert(claim.into(), ratings.iter().map(|r| r.to_string()).collect());
        self
    }
}

impl ReviewService for FixtureReviews {
    fn retrieve_review(&self, claim: &str) -> Review {
        if claim.trim().is_empty() {
            return Review::NoClaim;
        }
        match self.ratings.get(claim) {
            Some(r) if !r.is_empty() => Review::Ratings(r.clone()),
            _ => Review::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_reviews_use_sentinels() {
        assert_eq!(OfflineReviews.retrieve_review(""), Review::NoClaim);
        assert_eq!(OfflineReviews.retrieve_review("sky is green"), Review::NotFound);
    }

    #[test]
    fn fixture_reviews_return_ratings() {
        let svc = FixtureReviews::new().with("coronavirus is a hoax", &["False", "Pants on Fire"]);
        assert_eq!(
            svc.retrieve_review("coronavirus is a hoax"),
            Review::Ratings(vec!["False".into(), "Pants on Fire".into()])
        );
        assert_eq!(svc.retrieve_review("unknown"), Review::NotFound);
        assert_eq!(svc.retrieve_review("  "), Review::NoClaim);
    }

    #[test]
    fn review_serializes_as_list_or_sentinel() {
        let json = serde_json::to_value(Review::Ratings(vec!["False".into()])).unwrap();
        assert_eq!(json, serde_json::json!(["False"]));
        let json = serde_json::to_value(Review::NotFound).unwrap();
        assert_eq!(json, serde_json::json!(NO_REVIEW_FOUND));
        let json = serde_json::to_value(Review::NoClaim).unwrap();
        assert_eq!(json, serde_json::json!(NO_CLAIM_ENTERED));
    }
}
