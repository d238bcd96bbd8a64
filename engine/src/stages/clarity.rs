use color_eyre::Result;
use indoc::{formatdoc, indoc};

use super::{DeltaSink, Stage, generate_text, run_stage};
use crate::{
    artifacts::{ClarifiedSpec, UserRequest},
    llm::{LLM, Request},
};

const STAGE: Stage = Stage::Clarity;

const SYSTEM: &str = indoc! {"
    You are a clarity agent on a small creative team. You receive a short,
    often vague request for a piece of visual marketing content. Rewrite it
    as a clear brief for the rest of the team:

    - the subject and what it must show, using the requester's own key terms
    - the target audience
    - the tone and visual style
    - any constraints that are implied by the request

    Answer with the brief only, in at most 150 words. Do not ask questions,
    make reasonable assumptions instead.
"};

pub async fn clarify(
    llm: &dyn LLM,
    request: &UserRequest,
    on_delta: DeltaSink<'_>,
) -> Result<ClarifiedSpec> {
    run_stage(STAGE, async {
        let user_message = formatdoc! {"
            Here is the request:
            {request}
        "};

        let req = Request::new(SYSTEM, user_message).with_max_tokens(400);
        let text = generate_text(llm, STAGE, req, on_delta).await?;
        Ok(ClarifiedSpec::new(text))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        PipelineError,
        testing::{Reply, ScriptedLLM},
    };

    #[tokio::test]
    async fn clarifies_the_request() {
        let llm = ScriptedLLM::new([Reply::text(
            "  A clean scientific diagram of an antibody binding its target molecule. \n",
        )]);
        let request = UserRequest::try_new("a molecule diagram for a new antibody drug").unwrap();

        let spec = clarify(&llm, &request, &mut |_| {}).await.unwrap();

        assert!(spec.as_str().contains("antibody"));
        assert!(!spec.as_str().ends_with('\n'));

        let requests = llm.requests();
        let [sent] = &requests[..] else {
            panic!("expected exactly one request");
        };
        assert_eq!(sent.system.as_deref(), Some(SYSTEM));
        assert_eq!(sent.max_tokens, Some(400));
        assert!(sent.user.contains("a molecule diagram for a new antibody drug"));
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let llm = ScriptedLLM::new([Reply::Fail(503)]);
        let request = UserRequest::try_new("a poster").unwrap();

        let err = clarify(&llm, &request, &mut |_| {}).await.unwrap_err();

        assert_eq!(err.to_string(), "Clarity stage failed");
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Transport { .. })
        ));
    }
}
