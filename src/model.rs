//! Data model for committed blocks and their display records.

use serde::{Serialize, Serializer};
use std::fmt;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::crypto::fingerprint;
use crate::review::Review;

/// Textual marker stored in the genesis block's `transactions` field.
pub const GENESIS_TRANSACTIONS: &str = "genesis";

/// What a block commits to: nothing (genesis) or the Merkle root of one claim's scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transactions {
    Genesis,
    MerkleRoot(String),
}

impl fmt::Display for Transactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transactions::Genesis => f.write_str(GENESIS_TRANSACTIONS),
            Transactions::MerkleRoot(root) => f.write_str(root),
        }
    }
}

impl Serialize for Transactions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Claim metadata shown alongside a block. Not part of the fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct News {
    /// Claim label.
    pub value: String,
    pub review: Review,
    pub mean: f64,
    pub variance: f64,
    #[serde(rename = "standardDeviation")]
    pub standard_deviation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockNews {
    /// Genesis carries no claim; serialized as `""`.
    None,
    Claim(News),
}

impl BlockNews {
    pub fn as_claim(&self) -> Option<&News> {
        match self {
            BlockNews::None => None,
            BlockNews::Claim(n) => Some(n),
        }
    }
}

impl Serialize for BlockNews {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNews::None => serializer.serialize_str(""),
            BlockNews::Claim(n) => n.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// 0 for genesis, then +1 per block.
    pub index: u64,
    /// Captured at creation; hashed as stored.
    pub timestamp: String,
    pub transactions: Transactions,
    /// Fingerprint of the preceding block ("" for genesis).
    pub previous_hash: String,
    pub news: BlockNews,
    /// Set by the miner.
    pub nonce: u64,
    /// Assigned only once the block is appended with a valid proof.
    pub hash: Option<String>,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        transactions: Transactions,
        previous_hash: impl Into<String>,
        news: BlockNews,
    ) -> Self {
        Self {
            index,
            timestamp: timestamp.into(),
            transactions,
            previous_hash: previous_hash.into(),
            news,
            nonce: 0,
            hash: None,
        }
    }

    /// Unmined genesis block with the given timestamp.
    pub fn genesis(timestamp: impl Into<String>) -> Self {
        Self::new(0, timestamp, Transactions::Genesis, "", BlockNews::None)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_empty() && self.transactions == Transactions::Genesis
    }

    /// Fingerprint of the hashed fields.
    /// Included: index, timestamp, transactions, previous_hash, nonce (in that order).
    pub fn compute_fingerprint(&self) -> String {
        let transactions = self.transactions.to_string();
        fingerprint(&[
            self.index.to_string().as_bytes(),
            self.timestamp.as_bytes(),
            transactions.as_bytes(),
            self.previous_hash.as_bytes(),
            self.nonce.to_string().as_bytes(),
        ])
    }

    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            index: self.index,
            timestamp: self.timestamp.clone(),
            transactions: self.transactions.to_string(),
            previous_hash: self.previous_hash.clone(),
            nonce: self.nonce,
            hash: self.hash.clone(),
            news: self.news.clone(),
        }
    }
}

/// Plain display/export shape of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: String,
    pub transactions: String,
    pub previous_hash: String,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub news: BlockNews,
}

/// RFC3339 timestamp of the current UTC instant.
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_AT_NONCE_0: &str =
        "d73700745cf9f04132a7e05a79265e870f784c28641f679cc163017517e1ba65";

    #[test]
    fn genesis_fingerprint_matches_fixture() {
        let block = Block::genesis("01-01-2020");
        assert_eq!(block.compute_fingerprint(), GENESIS_AT_NONCE_0);
        assert_eq!(block.compute_fingerprint(), block.compute_fingerprint());
    }

    #[test]
    fn nonce_changes_fingerprint_news_does_not() {
        let mut block = Block::genesis("01-01-2020");
        let before = block.compute_fingerprint();

        block.news = BlockNews::Claim(News {
            value: "claim".into(),
            review: Review::NotFound,
            mean: 1.0,
            variance: 0.0,
            standard_deviation: 0.0,
        });
        assert_eq!(block.compute_fingerprint(), before);

        block.hash = Some("ignored".into());
        assert_eq!(block.compute_fingerprint(), before);

        block.nonce = 1;
        assert_ne!(block.compute_fingerprint(), before);
    }

    #[test]
    fn genesis_record_shape() {
        let record = Block::genesis("01-01-2020").to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 0,
                "news": "",
                "nonce": 0,
                "previous_hash": "",
                "timestamp": "01-01-2020",
                "transactions": "genesis",
            })
        );
    }

    #[test]
    fn claim_record_carries_news_bundle_and_hash() {
        let mut block = Block::new(
            1,
            "t",
            Transactions::MerkleRoot("abc".into()),
            "prev",
            BlockNews::Claim(News {
                value: "claim".into(),
                review: Review::Ratings(vec!["False".into()]),
                mean: 3.5,
                variance: 3.5,
                standard_deviation: 3.5_f64.sqrt(),
            }),
        );
        block.hash = Some("000f".into());

        let json = serde_json::to_value(block.to_record()).unwrap();
        assert_eq!(json["hash"], "000f");
        assert_eq!(json["transactions"], "abc");
        assert_eq!(json["news"]["value"], "claim");
        assert_eq!(json["news"]["review"], serde_json::json!(["False"]));
        assert_eq!(json["news"]["mean"], 3.5);
        assert!(json["news"].get("standardDeviation").is_some());
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let ts = now_timestamp();
        assert!(OffsetDateTime::parse(&ts, &Rfc3339).is_ok(), "{ts}");
    }
}
