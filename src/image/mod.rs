//! Image management module
//!
//! Moves images from the local engine into the containerd store of
//! cluster nodes, so they can run without a registry.

pub mod import;

pub use import::{import_images, tarball_name};
