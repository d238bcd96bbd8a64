use async_stream::try_stream;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;

use super::{LLM, LLMStream, Request, ResponseFragment, Role, TextCompletion};
use crate::{PipelineError, open_ai};

mod sse_parser;

const ENDPOINT: &str = "chat completions";

#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: Client,
    api_key: String,
    url: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(
        client: Client,
        api_key: String,
        api_base: &str,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            url: open_ai::endpoint_url(api_base, "chat/completions"),
            model: model.into(),
        }
    }
}

impl LLM for OpenAIChat {
    fn send_request_stream(&self, req: Request) -> LLMStream<'_> {
        let body = ChatCompletionRequest::new(&self.model, req);

        Box::pin(try_stream! {
            debug!("Chat request to {}:\n{body:#?}", self.url);
            let res = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| PipelineError::transport(ENDPOINT, e))?;
            let res = open_ai::ensure_success(ENDPOINT, res).await?;

            let mut stream = res.bytes_stream();
            let mut parser = sse_parser::Parser::default();
            let mut full_text = String::new();
            let mut input_tokens = 0usize;
            let mut output_tokens = 0usize;

            let mut ended = false;

            while !ended {
                let events = match stream.next().await {
                    Some(chunk) => {
                        let chunk = chunk.map_err(|e| PipelineError::transport(ENDPOINT, e))?;
                        parser.process(chunk)?
                    }
                    None => {
                        ended = true;
                        parser.parse_remaining()?.into_iter().collect()
                    }
                };

                for event in events {
                    use sse_parser::Event::*;
                    match event {
                        Chunk(chunk) => {
                            if let Some(usage) = chunk.usage {
                                input_tokens = usage.prompt_tokens;
                                output_tokens = usage.completion_tokens;
                            }

                            for choice in chunk.choices {
                                let Some(content) = choice.delta.content else {
                                    continue;
                                };
                                if content.is_empty() {
                                    continue;
                                }
                                full_text.push_str(&content);
                                yield ResponseFragment::TextDelta(content);
                            }
                        }

                        Done => {
                            yield ResponseFragment::MessageComplete(TextCompletion {
                                content: full_text.clone(),
                                input_tokens,
                                output_tokens,
                            });
                            return;
                        }

                        Error(err) => {
                            Err(PipelineError::transport(ENDPOINT, err))?;
                        }

                        Unknown(raw) => {
                            info!("Unknown stream event:\n{raw:#?}");
                        }
                    }
                }
            }

            Err(PipelineError::malformed(ENDPOINT, "stream ended without [DONE]"))?;
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

//
// ===== OpenAI wire types =====
//

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
    stream_options: StreamOptions,
}

impl ChatCompletionRequest {
    fn new(model: &str, req: Request) -> Self {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);

        if let Some(system) = req.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }

        messages.extend(req.messages.into_iter().map(|msg| ChatMessage {
            role: match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: msg.content,
        }));

        Self {
            model: model.to_string(),
            messages,
            max_tokens: req.max_tokens,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionChunk {
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChunkChoice {
    pub delta: Delta,
}

#[derive(Debug, Deserialize)]
pub(super) struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}
