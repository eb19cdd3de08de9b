//! Shared helpers for the codec wrappers

pub mod validation;
