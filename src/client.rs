//! REST API clients for the Agylia portal.
//!
//! - [`PortalClient`] - user activity and signature validation

mod portal;

pub use portal::{PortalClient, PortalConfig};
