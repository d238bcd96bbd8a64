use clap::Parser;
use color_eyre::Result;
use content_crew::{Cli, run};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    run(Cli::parse()).await
}
