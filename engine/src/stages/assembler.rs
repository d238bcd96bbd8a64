use std::path::PathBuf;

use chrono::Local;
use color_eyre::Result;
use indoc::{formatdoc, indoc};
use log::info;

use super::{DeltaSink, Stage, generate_text, run_stage};
use crate::{
    artifacts::{AssembledOutput, ClarifiedSpec, CreatorResult, KeyMessage, UserRequest},
    compose::{self, FONT_SIZE},
    image_model::ImageFetcher,
    llm::{LLM, Request},
    output::{self, DEFAULT_OUTPUT_DIR},
};

const STAGE: Stage = Stage::Assembler;

const SYSTEM: &str = indoc! {"
    You are an assembler agent. You receive everything the team produced for
    one piece of content and combine it into a final content document in
    Markdown with these sections:

    # Title
    ## Key Message
    ## Visual
    (what the image shows and where it is linked)
    ## Body Copy
    (two or three short paragraphs built on the brief)
    ## Usage Notes
    (audience, tone, suggested channels)

    Use the key message verbatim. Answer with the document only.
"};

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// `false` keeps the text document only
    pub compose_image: bool,
    pub output_dir: PathBuf,
    /// Tried in order before falling back to the built-in font
    pub font_candidates: Vec<PathBuf>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            compose_image: true,
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            font_candidates: compose::font::font_candidates(None),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyInputs<'a> {
    pub request: &'a UserRequest,
    pub spec: &'a ClarifiedSpec,
    pub key_message: &'a KeyMessage,
    pub creator: &'a CreatorResult,
}

pub async fn assemble(
    llm: &dyn LLM,
    fetcher: &dyn ImageFetcher,
    inputs: AssemblyInputs<'_>,
    options: &AssemblyOptions,
    on_delta: DeltaSink<'_>,
) -> Result<AssembledOutput> {
    run_stage(STAGE, async {
        let AssemblyInputs {
            request,
            spec,
            key_message,
            creator,
        } = inputs;

        let user_message = formatdoc! {"
            Original request:
            {request}

            Brief:
            {spec}

            Key message:
            {key_message}

            Image prompt:
            {prompt}

            Image:
            {url}
        ",
            prompt = creator.prompt_used,
            url = creator.image_reference,
        };

        let req = Request::new(SYSTEM, user_message).with_max_tokens(1200);
        let text_content = generate_text(llm, STAGE, req, on_delta).await?;

        let image_path = if options.compose_image {
            let bytes = fetcher.fetch(&creator.image_reference).await?;
            let font = compose::load_font(&options.font_candidates, FONT_SIZE);
            let composed = compose::compose(&bytes, key_message.as_str(), font.as_ref())?;
            Some(output::save_png(&composed, &options.output_dir, &Local::now())?)
        } else {
            info!("Image composition disabled, keeping the text document only");
            None
        };

        Ok(AssembledOutput {
            text_content,
            image_path,
        })
    })
    .await
}
