//! Service discovery and transport contracts for the gantry gateway.
//!
//! This crate defines the two collaborator seams the gateway core depends on:
//!
//! - **`Registry`**: maps a realm (plus a set of already-tried instance ids)
//!   to one live downstream instance.
//! - **`Instance`**: one concrete downstream endpoint, able to perform a
//!   single HTTP call.
//!
//! It also ships the two stock implementations the gateway binary wires up:
//!
//! - [`HttpInstance`]: a reqwest-backed instance that surfaces connection
//!   failures with a machine-readable transient cause code.
//! - [`StaticRegistry`]: round-robin selection over a statically configured
//!   realm → instance map, honoring exclusions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Dispatcher     │────▶│   Registry       │
//! │   (gantry-       │     │   (trait)        │
//! │    resolver)     │     └────────┬─────────┘
//! └──────────────────┘              │
//!                          ┌────────▼─────────┐
//!                          │  Instance        │
//!                          │  (trait)         │
//!                          └────────┬─────────┘
//!                                   │ HTTP
//!                          ┌────────▼─────────┐
//!                          │  Downstream      │
//!                          │  service         │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gantry_registry::{HttpInstance, Instance, InstanceQuery, Registry, StaticRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = StaticRegistry::new();
//! registry.register("orders", Arc::new(HttpInstance::new("orders-1", "http://10.0.0.1:3000")));
//! registry.register("orders", Arc::new(HttpInstance::new("orders-2", "http://10.0.0.2:3000")));
//!
//! let instance = registry.next(&InstanceQuery::new("orders")).await?;
//! println!("selected {}", instance.id());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod instance;
pub mod registry;
pub mod transport;

pub use error::{InstanceError, RegistryError, TransientCause};
pub use transport::HttpInstance;
pub use instance::{
    Instance, InstanceId, InstanceResponse, OutboundBody, RequestOptions, ResponseBody,
};
pub use registry::{ExclusionSet, InstanceQuery, Registry, StaticRegistry};

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockInstance, MockRegistry, RecordedCall};
