//! Common types used across the FalconX client library.

pub mod common;

pub use common::*;
