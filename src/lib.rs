//! Append-only ledger that commits batches of claim evaluation scores into
//! proof-of-work blocks, one block per claim, each carrying the Merkle root
//! and sample statistics of its scores.

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod merkle;
pub mod model;
pub mod pool;
pub mod pow;
pub mod review;
pub mod routes;

pub use chain::{ForkSelector, Ledger, MineOutcome, SkippedClaim};
pub use error::{AppendError, LedgerError};
pub use model::{Block, BlockNews, BlockRecord, News, Transactions};
pub use pool::{Submission, TransactionPool};
pub use pow::Miner;
pub use review::{Review, ReviewService};
