//! tfstate-lookup - Terraform state address lookup
//!
//! A library for reading Terraform state files and resolving resource
//! addresses such as `module.app.aws_instance.web["a"].private_ip` to the
//! attribute values they name.

pub mod backends;
pub mod object;
pub mod query;
pub mod terraform;

mod error;

pub use backends::{BackendConfig, BackendError, BackendRegistry, StateFetcher};
pub use error::{Result, TfstateError};
pub use object::Object;
pub use query::{Query, QueryError};
pub use terraform::{Address, DEFAULT_WORKSPACE, TfState};
