//! Core grounding for lifted planning tasks.
//!
//! Turns the parser's typed symbol tables into a ground model: the
//! static/fluent classification ([`classify`]), the state-variable index
//! ([`index::VariableIndex`]), the compiled initial state ([`init`]) and the
//! constraint catalog ([`constraints`]).

pub mod classify;
pub mod config;
pub mod constraints;
pub mod error;
pub mod ground;
pub mod index;
pub mod init;
pub mod objects;
pub mod symbols;
pub mod task;

pub use error::{GroundError, GroundResult};
pub use ground::GroundModel;
