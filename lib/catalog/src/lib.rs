//! VDI provisioning workflows.
//!
//! Two workflows built from the engine in `hyperprov-workflow`:
//!
//! - [`create_vdi`]: create a VM from a template, boot it from an ISO, spread
//!   it to another node when the cluster has more than one, then reconfigure
//!   and restart it
//! - [`clone_vdi`]: clone a golden image and start the clone

mod action;
pub mod clone;
pub mod create;
pub mod error;
pub mod keys;
pub mod request;
pub mod template;

pub use clone::clone_vdi;
pub use create::create_vdi;
pub use error::RequestError;
pub use request::ProvisionRequest;
pub use template::{BootIso, VmTemplate};
