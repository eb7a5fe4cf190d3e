//! Network management module
//!
//! Every cluster gets its own labelled network.

pub mod config;

pub use config::{ClusterNetwork, NetworkDriver};
