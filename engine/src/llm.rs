use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt};

use crate::PipelineError;

pub mod open_ai_chat;
pub use open_ai_chat::OpenAIChat;

pub trait LLM {
    fn send_request_stream(&self, req: Request) -> LLMStream<'_>;
    fn model(&self) -> &str;
}

pub type LLMStream<'a> = Pin<Box<dyn Stream<Item = Result<ResponseFragment>> + Send + 'a>>;

#[derive(Debug)]
pub enum ResponseFragment {
    TextDelta(String),
    MessageComplete(TextCompletion),
}

#[derive(Debug)]
pub struct Request {
    pub system: Option<String>,
    pub messages: Vec<InputMessage>,
    pub max_tokens: Option<usize>,
}

impl Request {
    pub fn new(system: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            messages: vec![InputMessage::user(user_message.into())],
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: String,
}

impl InputMessage {
    pub fn user(user_message: String) -> InputMessage {
        Self {
            role: Role::User,
            content: user_message,
        }
    }

    pub fn assistant(assistant_message: String) -> InputMessage {
        Self {
            role: Role::Assistant,
            content: assistant_message,
        }
    }
}

/// The complete answer to one text-generation request.
#[derive(Debug, Clone)]
pub struct TextCompletion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Drives a response stream to completion, handing every text delta to
/// `on_delta` on the way.
pub async fn complete(
    llm: &dyn LLM,
    req: Request,
    on_delta: &mut dyn FnMut(&str),
) -> Result<TextCompletion> {
    let mut stream = llm.send_request_stream(req);
    let mut completion = None;

    while let Some(fragment) = stream.try_next().await? {
        match fragment {
            ResponseFragment::TextDelta(t) => on_delta(&t),
            ResponseFragment::MessageComplete(c) => completion = Some(c),
        }
    }

    Ok(completion.ok_or_else(|| {
        PipelineError::malformed("chat completions", "stream ended before the message completed")
    })?)
}
