use std::path::{Path, PathBuf};

use clap::Parser;

/// Candidate state files, in lookup order, when `--state` is not given.
pub const DEFAULT_STATE_FILES: [&str; 2] = ["terraform.tfstate", ".terraform/terraform.tfstate"];

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the tfstate file
    #[arg(short, long, env = "TFSTATE_LOOKUP_STATE")]
    pub state: Option<PathBuf>,

    /// Workspace to read from the state's backend
    #[arg(short, long, env = "TF_WORKSPACE")]
    pub workspace: Option<String>,

    /// Print the result as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Resource address to look up; lists all addresses when omitted
    pub address: Option<String>,
}

impl Cli {
    pub fn state_file(&self) -> PathBuf {
        self.state.clone().unwrap_or_else(default_state_file)
    }
}

/// The first of [`DEFAULT_STATE_FILES`] that exists, or the first one.
pub fn default_state_file() -> PathBuf {
    DEFAULT_STATE_FILES
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .unwrap_or_else(|| Path::new(DEFAULT_STATE_FILES[0]))
        .to_path_buf()
}
