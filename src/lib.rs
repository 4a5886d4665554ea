//! sitesync - pulls a CMS installation's production content over SSH
//!
//! One-shot operator tool: reads a YAML run configuration, optionally
//! satisfies an HTTP gatekeeper, then pulls the database dump and uploaded
//! files for every site of a remote Drupal or WordPress installation into
//! a local working copy.

pub mod cms;
pub mod config;
pub mod envfile;
pub mod error;
pub mod export;
pub mod files;
pub mod remote;
pub mod sync;
pub mod webauth;

pub use error::{Error, Result};
