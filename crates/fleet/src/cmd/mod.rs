//! Command implementations for the Fleet CLI

pub mod serve;
pub mod tail;
