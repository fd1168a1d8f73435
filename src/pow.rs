//! Proof-of-work: nonce search and proof validation.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::crypto::{has_zero_prefix, FINGERPRINT_HEX_LEN};
use crate::model::Block;

/// Default count of leading zero hex characters.
pub const DEFAULT_DIFFICULTY: usize = 3;

/// Nonce attempts between checks of the stop flag in `mine_cancellable`.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Miner {
    difficulty: usize,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

impl Miner {
    /// Difficulty is capped at the fingerprint length; a longer zero prefix
    /// could never be met.
    pub fn new(difficulty: usize) -> Self {
        if difficulty > FINGERPRINT_HEX_LEN {
            warn!(requested = difficulty, cap = FINGERPRINT_HEX_LEN, "difficulty clamped");
        }
        Self {
            difficulty: difficulty.min(FINGERPRINT_HEX_LEN),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Reset the nonce to 0 and count up until the fingerprint meets the
    /// difficulty. Unbounded: returns only once a solution is found.
    pub fn mine(&self, block: &mut Block) -> String {
        block.nonce = 0;
        let mut computed = block.compute_fingerprint();
        while !has_zero_prefix(&computed, self.difficulty) {
            block.nonce += 1;
            computed = block.compute_fingerprint();
        }
        debug!(index = block.index, nonce = block.nonce, hash = %computed, "proof of work found");
        computed
    }

    /// Same search as [`Miner::mine`], polling `stop` every
    /// [`CANCEL_POLL_INTERVAL`] attempts. None if stopped first; the block's
    /// nonce is then left at the last attempt.
    pub fn mine_cancellable(&self, block: &mut Block, stop: &AtomicBool) -> Option<String> {
        block.nonce = 0;
        loop {
            if block.nonce % CANCEL_POLL_INTERVAL == 0 && stop.load(Ordering::Relaxed) {
                debug!(index = block.index, nonce = block.nonce, "proof of work cancelled");
                return None;
            }
            let computed = block.compute_fingerprint();
            if has_zero_prefix(&computed, self.difficulty) {
                debug!(index = block.index, nonce = block.nonce, hash = %computed, "proof of work found");
                return Some(computed);
            }
            block.nonce += 1;
        }
    }

    /// True iff `candidate` meets the difficulty and equals a fresh
    /// fingerprint of the block as it stands now.
    pub fn is_valid_proof(&self, block: &Block, candidate: &str) -> bool {
        has_zero_prefix(candidate, self.difficulty) && candidate == block.compute_fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn difficulty_two_fixture() {
        let mut block = Block::genesis("01-01-2020");
        let hash = Miner::new(2).mine(&mut block);
        assert_eq!(block.nonce, 1128);
        assert_eq!(
            hash,
            "00eddca60c19374852bebd291a7ec6baaf3bbeb4bcb4737edca7974150567c3f"
        );
        assert!(Miner::new(2).is_valid_proof(&block, &hash));
    }

    #[test]
    fn default_difficulty_fixture() {
        let miner = Miner::default();
        let mut block = Block::genesis("01-01-2020");
        let hash = miner.mine(&mut block);
        assert_eq!(block.nonce, 2516);
        assert_eq!(
            hash,
            "0000deda8b27f37bedbfad1c5ba76da4514af379bdb5ec5b7900d1323480e637"
        );
        assert!(hash.starts_with("000"));
        assert_eq!(hash, block.compute_fingerprint());

        // reproducible given the same nonce
        let mut again = Block::genesis("01-01-2020");
        again.nonce = 2516;
        assert_eq!(again.compute_fingerprint(), hash);
    }

    #[test]
    fn mining_restarts_from_zero() {
        let miner = Miner::new(2);
        let mut block = Block::genesis("01-01-2020");
        block.nonce = 999_999;
        miner.mine(&mut block);
        assert_eq!(block.nonce, 1128);
    }

    #[test]
    fn stale_proof_is_rejected_after_mutation() {
        let miner = Miner::new(2);
        let mut block = Block::genesis("01-01-2020");
        let hash = miner.mine(&mut block);
        block.timestamp = "02-01-2020".into();
        assert!(!miner.is_valid_proof(&block, &hash));
    }

    #[test]
    fn matching_fingerprint_without_prefix_is_rejected() {
        let miner = Miner::new(3);
        let block = Block::genesis("01-01-2020");
        let fp = block.compute_fingerprint();
        assert!(!fp.starts_with("000"));
        assert!(!miner.is_valid_proof(&block, &fp));
    }

    #[test]
    fn cancellable_search_finds_same_nonce() {
        let miner = Miner::new(2);
        let mut block = Block::genesis("01-01-2020");
        let stop = AtomicBool::new(false);
        let hash = miner.mine_cancellable(&mut block, &stop).unwrap();
        assert_eq!(block.nonce, 1128);
        assert!(miner.is_valid_proof(&block, &hash));
    }

    #[test]
    fn difficulty_is_capped_at_fingerprint_length() {
        assert_eq!(Miner::new(65).difficulty(), FINGERPRINT_HEX_LEN);
        assert_eq!(Miner::new(usize::MAX).difficulty(), FINGERPRINT_HEX_LEN);
        assert_eq!(Miner::new(5).difficulty(), 5);
        assert!(has_zero_prefix(&"0".repeat(64), Miner::new(65).difficulty()));
    }

    #[test]
    fn cancellable_search_stops_mid_search() {
        let miner = Miner::new(FINGERPRINT_HEX_LEN);
        let mut block = Block::genesis("01-01-2020");
        let stop = Arc::new(AtomicBool::new(false));

        let flag = stop.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::Relaxed);
        });

        assert_eq!(miner.mine_cancellable(&mut block, &stop), None);
        stopper.join().unwrap();
        assert!(block.nonce > 0);
        assert_eq!(block.nonce % CANCEL_POLL_INTERVAL, 0);
    }

    #[test]
    fn cancellable_search_honours_stop_flag() {
        let miner = Miner::new(64);
        let mut block = Block::genesis("01-01-2020");
        let stop = AtomicBool::new(true);
        assert_eq!(miner.mine_cancellable(&mut block, &stop), None);
    }
}
