//! Benchmark and regression harness for external graph/rat simulators:
//! best-of-N timing, output verification, reference caching, and scoring.

pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod settings;
pub mod suite;
pub mod verify;
