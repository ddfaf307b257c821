//! Scheduler layer for the orchestrator
//!
//! Watches submitted builds by re-reading their pipeline runs at a fixed
//! interval until they reach a terminal phase.

pub mod poller;

pub use poller::{BuildPoller, PollOutcome};
