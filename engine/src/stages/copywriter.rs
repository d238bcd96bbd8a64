use color_eyre::Result;
use indoc::{formatdoc, indoc};

use super::{DeltaSink, Stage, generate_text, run_stage};
use crate::{
    artifacts::{ClarifiedSpec, CreatorResult, KeyMessage},
    llm::{LLM, Request},
};

const STAGE: Stage = Stage::Copywriter;

const SYSTEM: &str = indoc! {"
    You are a copywriter. Given a creative brief and the image that was made
    for it, write exactly one key message: a single short sentence that states
    the value proposition and works as a caption under the image.

    Answer with that one sentence only, at most 15 words, without quotes.
"};

pub async fn write_copy(
    llm: &dyn LLM,
    spec: &ClarifiedSpec,
    creator: &CreatorResult,
    on_delta: DeltaSink<'_>,
) -> Result<KeyMessage> {
    run_stage(STAGE, async {
        let CreatorResult {
            prompt_used,
            image_reference,
            ..
        } = creator;

        let user_message = formatdoc! {"
            Brief:
            {spec}

            Image prompt:
            {prompt_used}

            Image:
            {image_reference}
        "};

        let req = Request::new(SYSTEM, user_message).with_max_tokens(60);
        let text = generate_text(llm, STAGE, req, on_delta).await?;
        Ok(KeyMessage::from_model_output(text))
    })
    .await
}
