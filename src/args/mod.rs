//! From raw process arguments to a typed handler input
//!
//! Raw tokens are standardized, classified left to right against the merged
//! specs of the command tree, then validated into an [`input::InputObject`].

pub mod classify;
pub mod coerce;
pub mod input;
pub mod standardize;
