//! Source merge orchestration.

pub mod service;
