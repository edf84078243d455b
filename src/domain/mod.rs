//! Domain layer - chain capabilities, transaction submission, session and pool stores

pub mod chain;
pub mod execution;
pub mod pool;
pub mod session;
