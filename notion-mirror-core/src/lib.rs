#![doc = "notion-mirror-core: core pipeline for notion-mirror."]

//! This crate holds the whole pull pipeline: the rate-limited, paginated view
//! of the workspace, the recursive outline walk, the layout strategies that
//! decide where pages land, and the image cache. The CLI crate only loads
//! configuration and wires the concrete clients in.
//!
//! # Usage
//! Build a [`config::PullConfig`], pick a [`contract::WorkspaceApi`]
//! (normally [`notion::NotionClient`]) and call [`pull::pull`].

pub mod classify;
pub mod config;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod images;
pub mod layout;
pub mod markdown;
pub mod notion;
pub mod pull;
pub mod rate_limit;
pub mod stale;

pub use error::{Error, Result};
