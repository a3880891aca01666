//! NFVIS CLI
//!
//! Command-line interface for declaring bridges, networks, VLANs, system
//! settings, deployments and image packages on an NFVIS appliance.

pub mod commands;
pub mod output;
