//! Core business logic for humap.

pub mod services;

pub use services::*;
