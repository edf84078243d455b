//! Poolstore - client-side state for stability pool deposits, withdrawals and rewards
//! Built with Domain-Driven Design principles

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod shared;

// Re-export main types for convenience
pub use domain::execution::TransactionRunner;
pub use domain::pool::{FlowOutcome, PoolCollectionStore, PoolState, PoolStore};
pub use domain::session::UserStore;
pub use infrastructure::{PoolRegistry, SimulatedChain};
