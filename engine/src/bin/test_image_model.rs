use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use content_engine::{
    config::{Credentials, DEFAULT_IMAGE_MODEL},
    image_model::{
        ImageFetcher, ImageModel, ImageQuality, ImageSize, fetch::HttpImageFetcher,
        open_ai_images::OpenAIImages,
    },
    open_ai::DEFAULT_API_BASE,
};

#[derive(clap::Parser)]
struct Arg {
    description: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    model: String,
    #[arg(long, value_enum, default_value_t)]
    size: ImageSize,
    #[arg(long, value_enum, default_value_t)]
    quality: ImageQuality,
    #[arg(long, default_value = "output.png")]
    out: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    let Arg {
        description,
        model,
        size,
        quality,
        out,
    } = Arg::parse();

    let creds = Credentials::from_env()?;
    let client = reqwest::Client::new();
    let imgmod = OpenAIImages::new(
        client.clone(),
        creds.api_key().to_string(),
        DEFAULT_API_BASE,
        model,
    )
    .with_size(size)
    .with_quality(quality);

    let image = imgmod.generate(&description).await?;
    println!("Image URL: {}", image.url);
    if let Some(revised) = &image.revised_prompt {
        println!("Revised prompt: {revised}");
    }

    let bytes = HttpImageFetcher::new(client).fetch(&image.url).await?;
    std::fs::write(&out, &bytes)?;
    println!("Saved {}, {} bytes", out.display(), bytes.len());

    Ok(())
}
