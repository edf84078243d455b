//! Session domain - wallet connection state

mod user_store;

pub use user_store::UserStore;
