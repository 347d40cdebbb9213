//! Tower layers for mounting pipeline stages into an HTTP client stack
//!
//! ## Available Layers
//!
//! - [`PolicyLayer`] - Runs any [`Policy`](crate::Policy) (e.g. [`LoggingPolicy`](crate::LoggingPolicy),
//!   [`CurlPolicy`](crate::CurlPolicy)) around an inner HTTP service

mod policy;

pub use policy::{PolicyLayer, PolicyService};
