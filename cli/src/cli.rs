use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Turns one content request into copy and a captioned image")]
pub struct Cli {
    /// What to create. Read from stdin when left out
    pub request: Option<String>,

    /// Config file to use instead of the default one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// TrueType font for the caption
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Skip downloading and captioning the image
    #[arg(long)]
    pub text_only: bool,

    /// Don't open the saved image
    #[arg(long)]
    pub no_open: bool,

    /// Write the effective settings to the config file and exit
    #[arg(long, conflicts_with = "request")]
    pub init_config: bool,
}
