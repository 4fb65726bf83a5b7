//! Tea Swarm library surface.
//!
//! Batch automation for the Tea Sepolia testnet: runs one selected on-chain
//! action (transfer, stake, claim, withdraw, daily transfers) across many
//! accounts, each optionally routed through its own HTTP proxy. The
//! scheduler bounds concurrency, isolates per-account faults and enforces a
//! wall-clock timeout per task; see `scheduler` and `executor`.

pub mod account;
pub mod error;
pub mod executor;
pub mod proxy;
pub mod rpc;
pub mod scheduler;
pub mod task;
pub mod utils;

pub mod config {
    pub mod chains;
}
