//! Scripted stand-ins for the service clients.

use std::{
    collections::VecDeque,
    io::Cursor,
    pin::Pin,
    sync::{Arc, Mutex},
};

use async_stream::try_stream;
use bytes::Bytes;
use color_eyre::Result;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use crate::{
    PipelineError,
    image_model::{GeneratedImage, ImageFetcher, ImageModel},
    llm::{LLM, LLMStream, Request, ResponseFragment, TextCompletion},
    open_ai::OpenAIApiError,
};

pub enum Reply {
    Text(String),
    /// The service answers with this HTTP status
    Fail(u16),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub user: String,
    pub max_tokens: Option<usize>,
}

/// Answers requests with queued replies, streamed word by word. Clones share
/// the queue and the request log.
#[derive(Clone)]
pub struct ScriptedLLM {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedLLM {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LLM for ScriptedLLM {
    fn send_request_stream(&self, req: Request) -> LLMStream<'_> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: req.system.clone(),
            user: req
                .messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            max_tokens: req.max_tokens,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left");

        Box::pin(try_stream! {
            match reply {
                Reply::Text(text) => {
                    for word in text.split_inclusive(' ') {
                        yield ResponseFragment::TextDelta(word.to_string());
                    }
                    yield ResponseFragment::MessageComplete(TextCompletion {
                        output_tokens: text.split_whitespace().count(),
                        content: text,
                        input_tokens: 42,
                    });
                }
                Reply::Fail(status) => {
                    Err(PipelineError::transport(
                        "chat completions",
                        OpenAIApiError::from_status(status, "scripted failure"),
                    ))?;
                }
            }
        })
    }

    fn model(&self) -> &str {
        "scripted-llm"
    }
}

#[derive(Clone)]
pub struct ScriptedImageModel {
    outcome: Result<String, u16>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedImageModel {
    pub fn succeeding(url: &str) -> Self {
        Self {
            outcome: Ok(url.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            outcome: Err(status),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ImageModel for ScriptedImageModel {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedImage>> + Send + 'a>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Box::pin(async move {
            match &self.outcome {
                Ok(url) => Ok(GeneratedImage {
                    url: url.clone(),
                    revised_prompt: None,
                }),
                Err(status) => Err(PipelineError::transport(
                    "image generation",
                    OpenAIApiError::from_status(*status, "scripted failure"),
                )
                .into()),
            }
        })
    }

    fn model(&self) -> &str {
        "scripted-image-model"
    }
}

#[derive(Clone)]
pub struct StaticFetcher {
    outcome: Result<Vec<u8>, u16>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self {
            outcome: Ok(bytes),
            requested: Arc::default(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            outcome: Err(status),
            requested: Arc::default(),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ImageFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send + 'a>> {
        self.requested.lock().unwrap().push(url.to_string());
        Box::pin(async move {
            match &self.outcome {
                Ok(bytes) => Ok(Bytes::from(bytes.clone())),
                Err(status) => Err(PipelineError::ResourceFetch {
                    url: url.to_string(),
                    status: Some(*status),
                    reason: format!("HTTP {status}"),
                }
                .into()),
            }
        })
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([30, 90, 200, 255]));
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).unwrap();
    png.into_inner()
}

/// Answers exactly one HTTP request with the raw `response` and returns the
/// server's base URL, `http://127.0.0.1:<port>`.
pub async fn serve_once(response: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = response.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}

/// Reads headers and a `Content-Length` body, so closing the socket
/// afterwards doesn't reset the connection under the client.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        request.extend_from_slice(&buf[..n]);

        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let body_len = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|len| len.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if request.len() >= header_end + 4 + body_len {
            return;
        }
    }
}

/// A complete `text/event-stream` response carrying `body`.
pub fn sse_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
