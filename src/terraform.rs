mod address;
mod state;

pub use address::Address;
pub use state::{DEFAULT_WORKSPACE, ENVIRONMENT_FILE, MAX_BACKEND_REDIRECTS, TfState};
