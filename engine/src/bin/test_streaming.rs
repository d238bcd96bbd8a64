use std::io::{Write, stdout};

use clap::Parser;
use color_eyre::Result;
use content_engine::{
    config::{Credentials, DEFAULT_TEXT_MODEL},
    llm::{InputMessage, LLM, Request, ResponseFragment, open_ai_chat::OpenAIChat},
    open_ai::DEFAULT_API_BASE,
};
use tokio::pin;
use tokio_stream::StreamExt;

#[derive(clap::Parser)]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    model: String,
    #[arg(long, default_value_t = 400)]
    max_tokens: usize,
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
    #[arg(default_value = "Explain Rust futures by going way too deep")]
    prompt: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    pretty_env_logger::init();
    color_eyre::install()?;

    let creds = Credentials::from_env()?;
    let model = OpenAIChat::new(
        reqwest::Client::new(),
        creds.api_key().to_string(),
        &args.api_base,
        args.model,
    );
    let stream = model.send_request_stream(Request {
        messages: vec![InputMessage::user(args.prompt)],
        max_tokens: Some(args.max_tokens),
        system: None,
    });

    pin!(stream);
    while let Some(fragment) = stream.try_next().await? {
        match fragment {
            ResponseFragment::TextDelta(t) => {
                print!("{t}");
                stdout().flush()?;
            }
            ResponseFragment::MessageComplete(completion) => {
                println!(
                    "\nUsage: input: {}, output: {}",
                    completion.input_tokens, completion.output_tokens
                );
            }
        }
    }
    Ok(())
}
