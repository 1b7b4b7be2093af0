//! End-to-end tests of the Fabric8 Console CD pipeline
//!
//! The tests log into the web console, verify that the services of the
//! CD pipeline are running, create a project from an archetype, and wait
//! until Jenkins built it successfully. Cluster, browser, and build
//! server are reached through the [`Cluster`], [`Browser`], and
//! [`BuildServer`] traits.

pub mod assertions;
pub mod browser;
pub mod config;
pub mod console;
pub mod error;
pub mod forge;
pub mod jenkins;
pub mod kube;
pub mod prelude;
pub mod wait;

pub use self::browser::Browser;
pub use self::error::{Error, Result};
pub use self::jenkins::BuildServer;
pub use self::kube::Cluster;
