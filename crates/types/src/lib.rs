//! Shared value types for the jsonsift query engine.
//!
//! A query produces values together with their [`Location`] inside the
//! queried document. Both live here so that consumers can name them without
//! depending on the parser or evaluator.

pub mod located;
pub mod location;

pub use located::LocatedValue;
pub use location::{Location, LocationStep, quote_member_name};
