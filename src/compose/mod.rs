//! Typed model of docker compose files.
//!
//! Compose allows several spellings for ports, volumes and environment variables. This
//! module accepts all of them on input and always writes the canonical long form:
//!
//! ```
//! use mc_docker_manager::compose::ComposeDocument;
//!
//! let doc = ComposeDocument::from_yaml_str(
//!     "services:\n  mc:\n    ports: [\"25565:25565\"]\n    environment: [EULA=TRUE]\n",
//! )
//! .unwrap();
//! let mc = doc.service("mc").unwrap();
//! assert_eq!(mc.ports.as_ref().unwrap()[0].published.as_deref(), Some("25565"));
//! assert_eq!(mc.environment.as_ref().unwrap()["EULA"], "TRUE");
//! ```

mod document;
pub mod environment;
mod error;
mod port;
pub(crate) mod scalar;
mod service;
mod volume;

pub use document::ComposeDocument;
pub use environment::Environment;
pub use error::{Error, Result};
pub use port::PortMapping;
pub use service::{ServiceMap, ServiceSpec};
pub use volume::{VolumeMapping, VolumeType};
