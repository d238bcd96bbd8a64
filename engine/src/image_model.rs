use std::pin::Pin;

use bytes::Bytes;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod fetch;
pub mod open_ai_images;

pub use fetch::HttpImageFetcher;
pub use open_ai_images::OpenAIImages;

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    #[strum(to_string = "1024x1024")]
    #[value(name = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    #[strum(to_string = "1792x1024")]
    #[value(name = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    #[strum(to_string = "1024x1792")]
    #[value(name = "1024x1792")]
    Portrait,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Standard,
    Hd,
}

/// What an image model hands back: a reference to the image, not its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    /// Some models rewrite the prompt before generating
    pub revised_prompt: Option<String>,
}

pub trait ImageModel {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedImage>> + Send + 'a>>;

    fn model(&self) -> &str;
}

pub trait ImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>>;
}
