mod cli;

use std::io::IsTerminal;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use tfstate_lookup::{BackendRegistry, TfState};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.state_file();
    let registry = BackendRegistry::default();

    tracing::debug!(path = %path.display(), "reading state");
    let state =
        TfState::read_file_with_workspace(&path, cli.workspace.as_deref(), &registry).await?;

    let Some(address) = cli.address.as_deref() else {
        for name in state.list()? {
            println!("{name}");
        }
        return Ok(());
    };

    let object = state.lookup(address)?;
    if !cli.json {
        println!("{object}");
    } else if std::io::stdout().is_terminal() {
        println!("{}", object.to_json_pretty());
    } else {
        println!("{}", object.to_json());
    }

    Ok(())
}
