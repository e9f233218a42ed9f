//! Transport backends
//!
//! Each destination protocol is a [`Transport`] built by a
//! [`TransportFactory`]. Factories live in a [`BackendRegistry`] keyed by
//! the profile's `method`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shipment::transport::builtin_backends;
//!
//! let backends = builtin_backends();
//! let factory = backends.resolve("local")?;
//! let mut transport = factory.create(context);
//! transport.initialize().await?;
//! ```

mod local;
mod traits;

pub use local::LocalTransport;
pub use traits::{Transport, TransportContext, TransportError, TransportFactory};

use std::sync::Arc;

use crate::registry::Registry;

pub type BackendRegistry = Registry<dyn TransportFactory>;

/// Registry holding the backends shipped with this crate
pub fn builtin_backends() -> BackendRegistry {
    let local: Arc<dyn TransportFactory> = Arc::new(|context: TransportContext| {
        Box::new(LocalTransport::new(context)) as Box<dyn Transport>
    });
    BackendRegistry::new("backend").with("local", local)
}
