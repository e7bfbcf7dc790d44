//! Ledger module containing entry storage and the reconciliation session

pub mod core;
pub mod store;

pub use core::*;
pub use store::*;
