use crate::{
    image_model::{ImageFetcher, ImageModel},
    llm::LLM,
};

pub mod artifacts;
pub mod compose;
pub mod config;
pub mod error;
pub mod image_model;
pub mod llm;
pub mod open_ai;
pub mod output;
pub mod pipeline;
pub mod stages;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineOutput};

pub type LLMBox = Box<dyn LLM + Send + Sync>;
pub type ImgModBox = Box<dyn ImageModel + Send + Sync>;
pub type FetcherBox = Box<dyn ImageFetcher + Send + Sync>;
