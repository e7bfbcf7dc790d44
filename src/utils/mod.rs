//! Utility modules

pub mod money;
pub mod validation;

pub use money::*;
pub use validation::*;
