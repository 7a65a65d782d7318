//! Identity resolution and failover dispatch for the gantry gateway.
//!
//! This crate is the gateway's decision core. For every inbound request it:
//!
//! 1. Resolves the caller's identity by forwarding the credential token to a
//!    configured authentication realm ([`IdentityResolver::resolve_authentication`]).
//! 2. Optionally checks that the identity may execute the requested operation
//!    against an access realm ([`IdentityResolver::resolve_access`]).
//! 3. Forwards the original request to an instance of the realm named by the
//!    first path segment, failing over to untried instances on transient
//!    transport errors ([`Dispatcher::dispatch`]).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  gantry-gateway  │
//! │  (axum surface)  │
//! └────────┬─────────┘
//!          │ resolve(request)            dispatch(identity)
//! ┌────────▼─────────┐         ┌──────────────────────────┐
//! │ IdentityResolver │         │       Dispatcher         │
//! │  authn → access  │         │  select → attempt → ...  │
//! └────────┬─────────┘         └────────────┬─────────────┘
//!          │                                │
//!          └────────────┬───────────────────┘
//!                ┌──────▼───────┐
//!                │   Registry   │
//!                │   (trait)    │
//!                └──────────────┘
//! ```
//!
//! Both stages and the dispatcher speak to downstream services exclusively
//! through the [`gantry_registry::Registry`] and [`gantry_registry::Instance`]
//! contracts; nothing here owns a socket.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod request;
pub mod resolver;

pub use config::{AccessConfig, AuthenticationConfig, ResolverConfig};
pub use dispatch::Dispatcher;
pub use encoding::BodyEncoding;
pub use error::{GatewayError, Result};
pub use request::ProxyRequest;
pub use resolver::{Identity, IdentityResolver};
