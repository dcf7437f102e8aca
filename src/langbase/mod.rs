//! Langbase API client and the text generation seam.

mod client;
mod generator;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use client::LangbaseClient;
pub use generator::{GenerationRequest, Generator, Stage};
#[cfg(test)]
pub use generator::MockGenerator;
pub use types::*;
