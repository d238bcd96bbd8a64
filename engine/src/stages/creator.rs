use color_eyre::Result;
use indoc::{formatdoc, indoc};
use log::info;

use super::{DeltaSink, Stage, generate_text, run_stage};
use crate::{
    artifacts::{ClarifiedSpec, CreatorResult},
    image_model::ImageModel,
    llm::{LLM, Request},
};

const STAGE: Stage = Stage::Creator;

const SYSTEM: &str = indoc! {"
    You are a creator agent who writes prompts for an image generation model.
    Turn the brief you receive into one optimized image prompt: describe the
    subject, composition, lighting, colors and style concretely. Leave room
    at the bottom of the image, a caption will be placed below it later.
    Do not ask for any text or lettering inside the image.

    Answer with the prompt only, no preamble, at most 120 words.
"};

pub async fn create(
    llm: &dyn LLM,
    imgmod: &dyn ImageModel,
    spec: &ClarifiedSpec,
    on_delta: DeltaSink<'_>,
) -> Result<CreatorResult> {
    run_stage(STAGE, async {
        let user_message = formatdoc! {"
            Brief:
            {spec}
        "};

        let req = Request::new(SYSTEM, user_message).with_max_tokens(300);
        let prompt = generate_text(llm, STAGE, req, on_delta).await?;

        info!("Requesting image from {}", imgmod.model());
        let image = imgmod.generate(&prompt).await?;

        Ok(CreatorResult {
            prompt_used: prompt,
            image_reference: image.url,
            revised_prompt: image.revised_prompt,
        })
    })
    .await
}
