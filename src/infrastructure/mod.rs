//! Infrastructure layer - concrete backends for the domain traits

pub mod pool_registry;
pub mod simulated_chain;

pub use pool_registry::PoolRegistry;
pub use simulated_chain::{Fault, SentTx, SimulatedChain, SimulatedPool};
