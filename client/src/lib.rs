//! LifeTag registry client library.
//!
//! Layers follow a hexagonal split: `domain` owns the rules and ports,
//! `outbound` implements the ports over HTTP and the filesystem, `inbound`
//! drives the domain from the command line and `config` loads settings.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
