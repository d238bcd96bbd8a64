use std::fmt;

use color_eyre::Result;
use log::{error, info};
use reqwest::Client;

use crate::{
    FetcherBox, ImgModBox, LLMBox, PipelineError,
    artifacts::{AssembledOutput, ClarifiedSpec, CreatorResult, KeyMessage, UserRequest},
    compose::font::font_candidates,
    config::{Config, Credentials},
    image_model::{fetch::HttpImageFetcher, open_ai_images::OpenAIImages},
    llm::open_ai_chat::OpenAIChat,
    stages::{self, AssemblyInputs, AssemblyOptions, Stage},
};

/// Where a run currently is. Every state is entered at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Running(Stage),
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn advance(self) -> Self {
        match self {
            PipelineState::Start => PipelineState::Running(Stage::Clarity),
            PipelineState::Running(stage) => match stage.next() {
                Some(next) => PipelineState::Running(next),
                None => PipelineState::Done,
            },
            terminal => terminal,
        }
    }

    pub fn fail(self) -> Self {
        match self {
            PipelineState::Running(stage) => PipelineState::Failed(stage),
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Start => write!(f, "start"),
            PipelineState::Running(stage) => write!(f, "running {stage}"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed(stage) => write!(f, "failed in {stage}"),
        }
    }
}

/// What the observer of a run gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    StateChanged(PipelineState),
    TextDelta(&'a str),
    StageFinished { stage: Stage, output: &'a str },
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub request: UserRequest,
    pub spec: ClarifiedSpec,
    pub creator: CreatorResult,
    pub key_message: KeyMessage,
    pub assembled: AssembledOutput,
}

pub struct Pipeline {
    llm: LLMBox,
    imgmod: ImgModBox,
    fetcher: FetcherBox,
    assembly: AssemblyOptions,
}

impl Pipeline {
    pub fn new(
        llm: LLMBox,
        imgmod: ImgModBox,
        fetcher: FetcherBox,
        assembly: AssemblyOptions,
    ) -> Self {
        Self {
            llm,
            imgmod,
            fetcher,
            assembly,
        }
    }

    /// Builds the OpenAI backed clients. Nothing is sent over the network here.
    pub fn bootstrap(config: &Config, credentials: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("content_crew/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("couldn't build HTTP client: {e}")))?;
        let api_key = credentials.api_key().to_string();

        let llm = OpenAIChat::new(
            client.clone(),
            api_key.clone(),
            &config.api_base,
            &config.text_model,
        );
        let imgmod = OpenAIImages::new(client.clone(), api_key, &config.api_base, &config.image_model);
        let fetcher = HttpImageFetcher::new(client);
        let assembly = AssemblyOptions {
            compose_image: config.compose_image,
            output_dir: config.output_dir.clone(),
            font_candidates: font_candidates(config.font_path.as_deref()),
        };
        info!(
            "Using {} for text and {} for images",
            config.text_model, config.image_model
        );

        Ok(Self::new(
            Box::new(llm),
            Box::new(imgmod),
            Box::new(fetcher),
            assembly,
        ))
    }

    pub fn assembly_options(&self) -> &AssemblyOptions {
        &self.assembly
    }

    /// Runs all stages in order. The first failing stage ends the run, the
    /// observer then sees `Failed` with that stage.
    pub async fn run(
        &self,
        request: UserRequest,
        observer: &mut dyn FnMut(Progress<'_>),
    ) -> Result<PipelineOutput> {
        let mut state = PipelineState::Start;
        let result = self.run_stages(request, &mut state, observer).await;

        state = match result {
            Ok(_) => state.advance(),
            Err(_) => state.fail(),
        };
        match &result {
            Ok(_) => info!("Pipeline {state}"),
            Err(e) => error!("Pipeline {state}: {e}"),
        }
        observer(Progress::StateChanged(state));
        result
    }

    async fn run_stages(
        &self,
        request: UserRequest,
        state: &mut PipelineState,
        observer: &mut dyn FnMut(Progress<'_>),
    ) -> Result<PipelineOutput> {
        let llm = &*self.llm;

        enter(state, observer);
        let spec = stages::clarify(llm, &request, &mut |d| observer(Progress::TextDelta(d))).await?;
        observer(Progress::StageFinished {
            stage: Stage::Clarity,
            output: spec.as_str(),
        });

        enter(state, observer);
        let creator = stages::create(llm, &*self.imgmod, &spec, &mut |d| {
            observer(Progress::TextDelta(d))
        })
        .await?;
        observer(Progress::StageFinished {
            stage: Stage::Creator,
            output: &creator.image_reference,
        });

        enter(state, observer);
        let key_message = stages::write_copy(llm, &spec, &creator, &mut |d| {
            observer(Progress::TextDelta(d))
        })
        .await?;
        observer(Progress::StageFinished {
            stage: Stage::Copywriter,
            output: key_message.as_str(),
        });

        enter(state, observer);
        let inputs = AssemblyInputs {
            request: &request,
            spec: &spec,
            key_message: &key_message,
            creator: &creator,
        };
        let assembled = stages::assemble(llm, &*self.fetcher, inputs, &self.assembly, &mut |d| {
            observer(Progress::TextDelta(d))
        })
        .await?;
        observer(Progress::StageFinished {
            stage: Stage::Assembler,
            output: &assembled.text_content,
        });

        Ok(PipelineOutput {
            request,
            spec,
            creator,
            key_message,
            assembled,
        })
    }
}

fn enter(state: &mut PipelineState, observer: &mut dyn FnMut(Progress<'_>)) {
    *state = state.advance();
    observer(Progress::StateChanged(*state));
}
