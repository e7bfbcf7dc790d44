//! Reconciliation of a bank statement against the books
//!
//! The engine pairs equal entries automatically; whatever is left over can be
//! grouped by hand into many-to-many [`EntryMatch`]es and committed once their
//! amounts agree.

pub mod engine;
pub mod entry_match;
pub mod result;

pub use engine::*;
pub use entry_match::*;
pub use result::*;
