//! The ledger: genesis, append, mining passes over the pool, and forks.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppendError, ForkSelectorError, LedgerError};
use crate::merkle::aggregate;
use crate::model::{now_timestamp, Block, BlockNews, BlockRecord, News, Transactions};
use crate::pool::{PendingClaim, Submission, TransactionPool};
use crate::pow::{Miner, DEFAULT_DIFFICULTY};
use crate::review::{OfflineReviews, ReviewService};

/// Which state `Ledger::fork` copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkSelector {
    Latest,
    Whole,
    All,
    /// Keep blocks `0..=n`.
    UpTo(u64),
}

impl FromStr for ForkSelector {
    type Err = ForkSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" => Ok(ForkSelector::Latest),
            "whole" => Ok(ForkSelector::Whole),
            "all" => Ok(ForkSelector::All),
            other => other
                .parse::<u64>()
                .map(ForkSelector::UpTo)
                .map_err(|_| ForkSelectorError(s.to_string())),
        }
    }
}

/// A claim dropped from a mining pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedClaim {
    pub label: String,
    pub error: LedgerError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    /// The pool was empty.
    NothingToMine,
    Mined {
        /// Indices of the blocks appended in this pass, in claim order.
        committed: Vec<u64>,
        skipped: Vec<SkippedClaim>,
    },
}

impl MineOutcome {
    /// Index of the last block appended by the pass, if any.
    pub fn last_index(&self) -> Option<u64> {
        match self {
            MineOutcome::NothingToMine => None,
            MineOutcome::Mined { committed, .. } => committed.last().copied(),
        }
    }
}

/// Ordered block sequence (genesis at 0) plus the pool of pending claims.
#[derive(Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
    pool: TransactionPool,
    miner: Miner,
    review: Arc<dyn ReviewService>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("blocks", &self.blocks)
            .field("pool", &self.pool)
            .field("miner", &self.miner)
            .finish_non_exhaustive()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY, Arc::new(OfflineReviews))
    }
}

impl Ledger {
    pub fn new(difficulty: usize, review: Arc<dyn ReviewService>) -> Self {
        Self::with_genesis_timestamp(difficulty, review, now_timestamp())
    }

    /// Like [`Ledger::new`] but with a fixed genesis timestamp.
    pub fn with_genesis_timestamp(
        difficulty: usize,
        review: Arc<dyn ReviewService>,
        timestamp: impl Into<String>,
    ) -> Self {
        let mut ledger = Self {
            blocks: Vec::new(),
            pool: TransactionPool::new(),
            miner: Miner::new(difficulty),
            review,
        };
        ledger.create_genesis(timestamp.into());
        ledger
    }

    fn create_genesis(&mut self, timestamp: String) {
        let mut genesis = Block::genesis(timestamp);
        let proof = self.miner.mine(&mut genesis);
        genesis.hash = Some(proof);
        info!(hash = genesis.hash.as_deref().unwrap_or_default(), "genesis block created");
        self.blocks.push(genesis);
    }

    pub fn tip(&self) -> &Block {
        // genesis is pushed in the constructor and blocks never shrink
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Committed blocks excluding genesis.
    pub fn chain_length(&self) -> usize {
        self.blocks.len() - 1
    }

    pub fn difficulty(&self) -> usize {
        self.miner.difficulty()
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn open_claim(&mut self, label: impl Into<String>) {
        self.pool.open_claim(label);
    }

    pub fn add_score(&mut self, value: f64) -> Result<(), LedgerError> {
        self.pool.add_score(value)
    }

    pub fn submit(&mut self, submission: Submission) -> Result<(), LedgerError> {
        self.pool.submit(submission)
    }

    /// Append `block` with `proof` as its hash. Checks linkage to the tip,
    /// then the proof. Nothing changes on error.
    pub fn try_append_block(&mut self, mut block: Block, proof: String) -> Result<(), AppendError> {
        let tip_hash = self.tip().hash.as_deref().unwrap_or_default();
        if block.previous_hash != tip_hash {
            return Err(AppendError::LinkageMismatch {
                expected: tip_hash.to_string(),
                found: block.previous_hash,
            });
        }
        if !self.miner.is_valid_proof(&block, &proof) {
            return Err(AppendError::InvalidProof);
        }
        block.hash = Some(proof);
        self.blocks.push(block);
        Ok(())
    }

    pub fn append_block(&mut self, block: Block, proof: String) -> bool {
        self.try_append_block(block, proof).is_ok()
    }

    /// Unmined block for `claim` linked to the current tip.
    fn candidate_for(&self, claim: &PendingClaim) -> Result<Block, LedgerError> {
        let agg = aggregate(&claim.scores)?;
        let review = self.review.retrieve_review(&claim.label);
        let tip = self.tip();
        Ok(Block::new(
            tip.index + 1,
            now_timestamp(),
            Transactions::MerkleRoot(agg.root_hash),
            tip.hash.clone().unwrap_or_default(),
            BlockNews::Claim(News {
                value: claim.label.clone(),
                review,
                mean: agg.mean,
                variance: agg.variance,
                standard_deviation: agg.standard_deviation,
            }),
        ))
    }

    /// Drain the pool and commit one block per claim, in the order the claims
    /// were opened. Claims that cannot be aggregated are skipped.
    pub fn mine(&mut self) -> MineOutcome {
        if self.pool.is_empty() {
            return MineOutcome::NothingToMine;
        }

        let mut committed = Vec::new();
        let mut skipped = Vec::new();
        for claim in self.pool.drain_in_order() {
            let mut block = match self.candidate_for(&claim) {
                Ok(b) => b,
                Err(e) => {
                    warn!(claim = %claim.label, error = %e, "skipping claim");
                    skipped.push(SkippedClaim { label: claim.label, error: e });
                    continue;
                }
            };
            let proof = self.miner.mine(&mut block);
            let index = block.index;
            match self.try_append_block(block, proof) {
                Ok(()) => {
                    info!(index, claim = %claim.label, "block committed");
                    committed.push(index);
                }
                Err(e) => {
                    error!(index, claim = %claim.label, error = %e, "freshly mined block rejected");
                }
            }
        }

        MineOutcome::Mined { committed, skipped }
    }

    /// Independent deep copy of the ledger, optionally truncated to `0..=n`.
    pub fn fork(&self, selector: ForkSelector) -> Ledger {
        let mut copy = self.clone();
        if let ForkSelector::UpTo(n) = selector {
            let keep = usize::try_from(n)
                .ok()
                .and_then(|n| n.checked_add(1))
                .unwrap_or(usize::MAX);
            copy.blocks.truncate(keep.max(1));
        }
        copy
    }

    /// Re-check genesis shape, linkage, difficulty and fingerprints of every block.
    pub fn validate_chain(&self) -> Vec<String> {
        let mut errors = vec![];

        for (i, b) in self.blocks.iter().enumerate() {
            if i > 0 {
                let prev = &self.blocks[i - 1];
                if Some(&b.previous_hash) != prev.hash.as_ref() {
                    errors.push(format!("block {} previous_hash mismatch", b.index));
                }
                if b.index != prev.index + 1 {
                    errors.push(format!("block {} index out of sequence", b.index));
                }
            } else if !b.is_genesis() {
                errors.push("block 0 is not a genesis block".to_string());
            }

            match &b.hash {
                Some(h) if self.miner.is_valid_proof(b, h) => {}
                Some(_) => errors.push(format!("block {} hash invalid", b.index)),
                None => errors.push(format!("block {} has no hash", b.index)),
            }
        }

        errors
    }

    pub fn records(&self) -> Vec<BlockRecord> {
        self.blocks.iter().map(Block::to_record).collect()
    }

    pub fn records_after_genesis(&self) -> Vec<BlockRecord> {
        self.blocks.iter().skip(1).map(Block::to_record).collect()
    }
}
