//! Hugging Face inference API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use listing_desk_core::{BoundingBox, Identification};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;

use super::fusion::IdentificationSource;
use super::upload::ImageUpload;
use super::VisionError;
use crate::config::VisionConfig;

const GENERATION_MAX_LENGTH: u32 = 200;
const GENERATION_TEMPERATURE: f64 = 0.7;

/// Hugging Face inference API client.
///
/// Cheap to clone; clones share the token.
#[derive(Clone)]
pub struct HuggingFaceClient {
    inner: Arc<HuggingFaceClientInner>,
}

struct HuggingFaceClientInner {
    http: reqwest::Client,
    api_url: String,
    classification_model: String,
    detection_model: String,
    text_model: String,
    token: RwLock<Option<SecretString>>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
    #[serde(default, rename = "box")]
    bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: Option<String>,
}

impl HuggingFaceClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Http` if the HTTP client cannot be built.
    pub fn new(config: &VisionConfig, timeout: Duration) -> Result<Self, VisionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(HuggingFaceClientInner {
                http,
                api_url: config.api_url.trim_end_matches('/').to_string(),
                classification_model: config.classification_model.clone(),
                detection_model: config.detection_model.clone(),
                text_model: config.text_model.clone(),
                token: RwLock::new(config.token.clone()),
            }),
        })
    }

    /// Replace the API token.
    pub async fn set_token(&self, token: Option<SecretString>) {
        *self.inner.token.write().await = token.filter(|t| !t.expose_secret().trim().is_empty());
    }

    /// Whether an API token is configured.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Classify the whole image.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Api` for non-success responses.
    #[instrument(skip(self, upload), fields(model = %self.inner.classification_model))]
    pub async fn classify(&self, upload: &ImageUpload) -> Result<Vec<Identification>, VisionError> {
        let scores = self
            .post_image(&self.inner.classification_model, upload)
            .await?;
        Ok(scores.into_iter().map(LabelScore::into_identification).collect())
    }

    /// Detect objects in the image.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Api` for non-success responses.
    #[instrument(skip(self, upload), fields(model = %self.inner.detection_model))]
    pub async fn detect(&self, upload: &ImageUpload) -> Result<Vec<Identification>, VisionError> {
        let scores = self.post_image(&self.inner.detection_model, upload).await?;
        Ok(scores.into_iter().map(LabelScore::into_identification).collect())
    }

    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::NoToken` without a token,
    /// `VisionError::Api` for non-success responses and
    /// `VisionError::EmptyGeneration` when nothing was generated.
    #[instrument(skip(self, prompt), fields(model = %self.inner.text_model))]
    pub async fn generate_text(&self, prompt: &str) -> Result<String, VisionError> {
        let token = self
            .inner
            .token
            .read()
            .await
            .clone()
            .ok_or(VisionError::NoToken)?;

        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_length: GENERATION_MAX_LENGTH,
                temperature: GENERATION_TEMPERATURE,
            },
        };

        let response = self
            .inner
            .http
            .post(self.model_url(&self.inner.text_model))
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await?;

        let generated: Vec<GeneratedText> = Self::parse(response, &self.inner.text_model).await?;
        generated
            .into_iter()
            .next()
            .and_then(|g| g.generated_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(VisionError::EmptyGeneration)
    }

    async fn post_image(&self, model: &str, upload: &ImageUpload) -> Result<Vec<LabelScore>, VisionError> {
        let mut request = self
            .inner
            .http
            .post(self.model_url(model))
            .header(CONTENT_TYPE, upload.content_type())
            .body(upload.bytes().to_vec());

        if let Some(token) = self.inner.token.read().await.as_ref() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        Self::parse(response, model).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        model: &str,
    ) -> Result<T, VisionError> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model, "inference API error");
            return Err(VisionError::Api {
                model: model.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.inner.api_url, model)
    }
}

impl LabelScore {
    fn into_identification(self) -> Identification {
        Identification {
            bounding_box: self.bounding_box,
            ..Identification::new(self.label, self.score)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identification sources
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteTask {
    Classification,
    Detection,
}

/// Remote model exposed as an identification source.
#[derive(Clone)]
pub struct RemoteClassifier {
    client: HuggingFaceClient,
    task: RemoteTask,
}

impl RemoteClassifier {
    /// Whole-image classification.
    #[must_use]
    pub const fn classification(client: HuggingFaceClient) -> Self {
        Self {
            client,
            task: RemoteTask::Classification,
        }
    }

    /// Object detection.
    #[must_use]
    pub const fn detection(client: HuggingFaceClient) -> Self {
        Self {
            client,
            task: RemoteTask::Detection,
        }
    }
}

#[async_trait]
impl IdentificationSource for RemoteClassifier {
    fn name(&self) -> &'static str {
        match self.task {
            RemoteTask::Classification => "huggingface_classification",
            RemoteTask::Detection => "object_detection",
        }
    }

    async fn identify(&self, upload: &ImageUpload) -> Result<Vec<Identification>, VisionError> {
        match self.task {
            RemoteTask::Classification => self.client.classify(upload).await,
            RemoteTask::Detection => self.client.detect(upload).await,
        }
    }
}
