use std::pin::Pin;

use color_eyre::Result;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GeneratedImage, ImageModel, ImageQuality, ImageSize};
use crate::{PipelineError, open_ai};

const ENDPOINT: &str = "image generation";

#[derive(Debug, Clone)]
pub struct OpenAIImages {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    size: ImageSize,
    quality: ImageQuality,
}

impl OpenAIImages {
    pub fn new(
        client: Client,
        api_key: String,
        api_base: &str,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            url: open_ai::endpoint_url(api_base, "images/generations"),
            model: model.into(),
            size: ImageSize::default(),
            quality: ImageQuality::default(),
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_quality(mut self, quality: ImageQuality) -> Self {
        self.quality = quality;
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ImageGenerationRequest<'a> {
        ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: self.size,
            quality: self.quality,
            response_format: "url",
        }
    }
}

impl ImageModel for OpenAIImages {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedImage>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.request_body(prompt);
            debug!("Image request to {}:\n{body:#?}", self.url);

            let res = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| PipelineError::transport(ENDPOINT, e))?;
            let res = open_ai::ensure_success(ENDPOINT, res).await?;

            let response: ImageGenerationResponse = res
                .json()
                .await
                .map_err(|e| PipelineError::transport(ENDPOINT, e))?;
            debug!("Image response:\n{response:#?}");

            response.into_generated_image()
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
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: ImageSize,
    quality: ImageQuality,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

impl ImageGenerationResponse {
    fn into_generated_image(self) -> Result<GeneratedImage> {
        let ImageData {
            url,
            revised_prompt,
        } = self
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::malformed(ENDPOINT, "no image in response"))?;

        let url = url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PipelineError::malformed(ENDPOINT, "image without url"))?;

        Ok(GeneratedImage {
            url,
            revised_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let model = OpenAIImages::new(Client::new(), "key".into(), "http://localhost", "dall-e-3");

        let expect = expect![[r#"{"model":"dall-e-3","prompt":"A lighthouse at dawn","n":1,"size":"1024x1024","quality":"standard","response_format":"url"}"#]];
        expect.assert_eq(&serde_json::to_string(&model.request_body("A lighthouse at dawn")).unwrap());
    }

    #[test]
    fn request_uses_configured_size_and_quality() {
        let model = OpenAIImages::new(Client::new(), "key".into(), "http://localhost", "dall-e-3")
            .with_size(ImageSize::Portrait)
            .with_quality(ImageQuality::Hd);

        let json = serde_json::to_value(model.request_body("p")).unwrap();
        assert_eq!(json["size"], "1024x1792");
        assert_eq!(json["quality"], "hd");
    }

    #[test]
    fn response_parsing() {
        let body = r#"{"created": 1713833628, "data": [{"url": "https://img.example/a.png", "revised_prompt": "A calm lighthouse"}]}"#;
        let response: ImageGenerationResponse = serde_json::from_str(body).unwrap();

        assert_eq!(
            response.into_generated_image().unwrap(),
            GeneratedImage {
                url: "https://img.example/a.png".into(),
                revised_prompt: Some("A calm lighthouse".into()),
            }
        );
    }

    #[test]
    fn response_without_image_is_a_transport_error() {
        let response: ImageGenerationResponse =
            serde_json::from_str(r#"{"created": 1, "data": []}"#).unwrap();
        let err = response.into_generated_image().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Transport { .. })
        ));
    }
}
