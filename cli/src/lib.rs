use std::io::{BufRead, Write, stdin, stdout};

use color_eyre::{Result, eyre::bail};
use content_engine::{
    Pipeline,
    artifacts::UserRequest,
    config::{Config, Credentials, config_path, load_config, save_config},
};
use log::info;

pub mod cli;
mod opener;
mod progress;

pub use cli::Cli;
pub use progress::{ProgressPrinter, print_summary};

pub async fn run(cli: Cli) -> Result<()> {
    let mut cfg = load_config(cli.config.as_deref())?;
    apply_overrides(&mut cfg, &cli);

    if cli.init_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => config_path()?,
        };
        save_config(&path, &cfg)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let credentials = Credentials::from_env()?;
    let pipeline = Pipeline::bootstrap(&cfg, &credentials)?;
    let request = match cli.request {
        Some(request) => UserRequest::try_new(request)?,
        None => read_request(&mut stdin().lock(), &mut stdout())?,
    };
    info!("Request: {request}");

    let mut printer = ProgressPrinter::new(stdout());
    let output = pipeline
        .run(request, &mut |progress| printer.observe(progress))
        .await?;
    print_summary(&mut stdout(), &output)?;

    if cfg.open_result {
        if let Some(path) = &output.assembled.image_path {
            opener::open_best_effort(path);
        }
    }
    Ok(())
}

/// Command line flags win over the config file.
pub fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.output_dir {
        cfg.output_dir = dir.clone();
    }
    if let Some(font) = &cli.font {
        cfg.font_path = Some(font.clone());
    }
    if cli.text_only {
        cfg.compose_image = false;
    }
    if cli.no_open {
        cfg.open_result = false;
    }
}

pub fn read_request(input: &mut impl BufRead, prompt: &mut impl Write) -> Result<UserRequest> {
    write!(prompt, "What should the crew create? ")?;
    prompt.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("No request given");
    }
    UserRequest::try_new(line)
}
