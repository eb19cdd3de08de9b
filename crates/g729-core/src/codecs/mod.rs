//! Codec implementations

pub mod g729;
