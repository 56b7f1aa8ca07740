//! Consensus module - consensus kinds and the aggregation rules they imply

mod kind;

pub use kind::*;
