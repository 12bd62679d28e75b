//! kubecis - cluster introspection and check selection for CIS Kubernetes benchmarks
//!
//! This library answers the questions a benchmark run needs before any check
//! executes: which Kubernetes version is running (and so which benchmark
//! applies), which roles this node holds, and which checks the user selected.

pub mod api;
pub mod cli;
pub mod config;
pub mod controls;
pub mod filter;
pub mod mapping;
pub mod plan;
pub mod procfs;
pub mod roles;
pub mod version;
