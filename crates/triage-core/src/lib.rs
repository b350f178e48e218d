//! Run-scoped review pipeline core.
//!
//! A run (UUID) fans out over 12 model variants; each (run, variant) pair
//! walks a fixed pull → describe → judge state machine whose artifacts live
//! in a file-based store. The [`service::ReviewService`] facade is the
//! boundary a transport layer talks to.

pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod providers;
pub mod registry;
pub mod service;
pub mod stages;
pub mod storage;
pub mod summary;
