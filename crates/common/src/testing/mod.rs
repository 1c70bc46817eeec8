//! Test utilities shared across the crate and exported to host applications

pub mod mocks;

pub use mocks::{FailingStore, MockConnectivity, MockHttpInvoker};
