//! The values handed from one stage to the next. All of them live for a
//! single run.

use std::{fmt, path::PathBuf};

use color_eyre::{Result, eyre::ensure};

macro_rules! text_artifact {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    )+};
}

text_artifact! {
    /// The operator's free-text goal.
    UserRequest,
    /// The clarifier's elaboration of a [`UserRequest`].
    ClarifiedSpec,
    /// One short value-proposition sentence.
    KeyMessage,
}

impl UserRequest {
    pub fn try_new(request: impl Into<String>) -> Result<Self> {
        let request = request.into();
        let trimmed = request.trim();
        ensure!(!trimmed.is_empty(), "The request must not be empty");
        Ok(Self(trimmed.to_string()))
    }
}

impl ClarifiedSpec {
    /// `text` must already be trimmed and non-empty
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }
}

impl KeyMessage {
    /// Keeps the first non-empty line of the answer and drops the quotes
    /// models like to wrap a slogan in.
    pub(crate) fn from_model_output(text: String) -> Self {
        let first_line = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();
        Self(strip_wrapping_quotes(first_line).to_string())
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    const PAIRS: [(char, char); 3] = [('"', '"'), ('“', '”'), ('\'', '\'')];

    let text = text.trim();
    for (open, close) in PAIRS {
        let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        else {
            continue;
        };

        let inner = inner.trim();
        if !inner.is_empty() && !quotes_inside(inner, open, close) {
            return inner;
        }
    }
    text
}

/// Whether `inner` holds another quote of the pair, in which case the outer
/// marks belong to two separate quotations. Apostrophes inside a word don't
/// count.
fn quotes_inside(inner: &str, open: char, close: char) -> bool {
    if open == '\'' {
        inner
            .split_whitespace()
            .any(|word| word.starts_with(open) || word.ends_with(close))
    } else {
        inner.contains([open, close])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorResult {
    pub prompt_used: String,
    pub image_reference: String,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOutput {
    pub text_content: String,
    /// only set when the image was composited and saved
    pub image_path: Option<PathBuf>,
}
