//! cvdfleet-client: HTTP access to the provisioning control plane
//!
//! Exposes the [`ProvisioningBackend`] trait the orchestration core calls
//! through, plus [`HttpBackend`], the reqwest implementation of it.
//!
//! # Example
//!
//! ```no_run
//! use cvdfleet_client::{HttpBackend, ProvisioningBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new("http://localhost:8080")?;
//!
//! // List hosts in a zone
//! let hosts = backend.list_hosts("us-central1-b").await?;
//! for host in hosts.hosts {
//!     println!("{}", host.name);
//! }
//!
//! // Poll an operation by its wait URL
//! let op = backend.get_operation("/v1/zones/us-central1-b/operations/op-1").await?;
//! println!("done: {}", op.done);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod traits;

pub use error::{BackendError, Result};
pub use http::HttpBackend;
pub use traits::ProvisioningBackend;
