//! NFVIS Reconciliation Engine
//!
//! Brings bridges, networks, VLANs, system settings, VM deployments and
//! image packages on an NFVIS appliance to a declared state, issuing the
//! smallest change needed and reporting what happened.

pub mod client;
pub mod declaration;
pub mod index;
pub mod reconciler;
pub mod report;
pub mod resources;

pub use client::{ApiRequest, ApiResponse, HttpClient, ResourceClient};
pub use declaration::{parse_declarations, reconcile_declaration, Declaration, DesiredSpec};
pub use index::ResourceIndex;
pub use reconciler::{ReconcileOptions, Reconciler};
pub use report::{Failure, OutcomeReporter};
pub use resources::MergePolicy;
