use color_eyre::Result;
use log::{debug, error, info};
use strum::{Display, EnumIter};

use crate::{
    PipelineError,
    llm::{self, LLM, Request},
};

mod assembler;
mod clarity;
mod copywriter;
mod creator;

pub use assembler::{AssemblyInputs, AssemblyOptions, assemble};
pub use clarity::clarify;
pub use copywriter::write_copy;
pub use creator::create;

/// The four steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Stage {
    Clarity,
    Creator,
    Copywriter,
    Assembler,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Clarity => Some(Stage::Creator),
            Stage::Creator => Some(Stage::Copywriter),
            Stage::Copywriter => Some(Stage::Assembler),
            Stage::Assembler => None,
        }
    }
}

/// Receives streamed text while a stage waits for the model.
pub type DeltaSink<'a> = &'a mut dyn FnMut(&str);

/// One text-generation call whose trimmed answer must not be empty.
async fn generate_text(
    llm: &dyn LLM,
    stage: Stage,
    req: Request,
    on_delta: DeltaSink<'_>,
) -> Result<String> {
    debug!("{stage} request for {}:\n{req:#?}", llm.model());
    let completion = llm::complete(llm, req, on_delta).await?;
    info!(
        "{stage} used {} input and {} output tokens",
        completion.input_tokens, completion.output_tokens
    );

    let text = completion.content.trim();
    if text.is_empty() {
        return Err(PipelineError::EmptyOutput { stage }.into());
    }
    Ok(text.to_string())
}

/// Runs the body of a stage, logs the outcome and puts the stage name on its
/// error.
async fn run_stage<T>(stage: Stage, body: impl Future<Output = Result<T>>) -> Result<T> {
    info!("{stage} stage started");
    match body.await {
        Ok(value) => {
            info!("{stage} stage finished");
            Ok(value)
        }
        Err(e) => {
            error!("{stage} stage failed: {e}");
            Err(e.wrap_err(format!("{stage} stage failed")))
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::testing::{Reply, ScriptedLLM};

    #[test]
    fn stages_chain_in_declaration_order() {
        let order: Vec<Stage> = Stage::iter().collect();
        for pair in order.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::Assembler.next(), None);
    }

    #[tokio::test]
    async fn blank_answer_is_empty_output() {
        let llm = ScriptedLLM::new([Reply::text(" \n\t ")]);
        let err = generate_text(&llm, Stage::Creator, Request::new("s", "u"), &mut |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyOutput {
                stage: Stage::Creator
            })
        ));
    }

    #[tokio::test]
    async fn failed_stage_is_named_in_the_error() {
        let err = run_stage::<()>(Stage::Copywriter, async {
            Err(PipelineError::Render("x".into()).into())
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Copywriter stage failed");
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }
}
