//! Client for the generative content service (Gemini `generateContent`).
//!
//! Every capability is fail-soft: transport errors, API errors and unusable
//! responses are logged and reported as `None`, so callers only have to
//! render a "try again" state.

pub mod audio;
pub mod prompts;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GenAiConfig;
use crate::error::ServiceError;

pub use audio::{decode_pcm_base64, PcmAudio, Playback};
pub use prompts::GeneratedQuestion;

#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    config: GenAiConfig,
}

impl GenAiClient {
    pub fn new(config: GenAiConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn generate_quiz_questions(&self, topic: &str) -> Option<Vec<GeneratedQuestion>> {
        let prompt = prompts::quiz_prompt(topic, &self.config.language);
        let result = async {
            let body = self
                .call(&self.config.text_model, &prompts::quiz_request(&prompt))
                .await?;
            prompts::parse_quiz(&prompts::extract_text(&body)?)
        }
        .await;
        report("quiz generation", result)
    }

    pub async fn generate_prayer_text(&self, mood: &str) -> Option<String> {
        let prompt = prompts::prayer_prompt(mood, &self.config.language);
        report("prayer generation", self.text(&prompt).await)
    }

    pub async fn generate_insight(&self, verse: &str, context: &str) -> Option<String> {
        let prompt = prompts::insight_prompt(verse, context, &self.config.language);
        report("insight generation", self.text(&prompt).await)
    }

    pub async fn ask_mentor(&self, question: &str) -> Option<String> {
        let prompt = prompts::mentor_prompt(question, &self.config.language);
        report("mentor answer", self.text(&prompt).await)
    }

    pub async fn synthesize_speech(&self, text: &str) -> Option<PcmAudio> {
        let result = async {
            let request = prompts::speech_request(text, &self.config.voice);
            let body = self.call(&self.config.speech_model, &request).await?;
            let payload = prompts::extract_audio(&body)?;
            decode_pcm_base64(&payload).map_err(|err| ServiceError::Parse(err.to_string()))
        }
        .await;
        report("speech synthesis", result)
    }

    async fn text(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = self
            .call(&self.config.text_model, &prompts::text_request(prompt))
            .await?;
        prompts::extract_text(&body)
    }

    /// POST a request body to `models/{model}:generateContent` and return the
    /// raw response text.
    async fn call(&self, model: &str, request: &Value) -> Result<String, ServiceError> {
        if !self.is_configured() {
            return Err(ServiceError::Unavailable);
        }
        let url = format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(model, "calling generative service");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }
        Ok(body)
    }
}

fn classify(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Http(err)
    }
}

/// `error.message` from an API error body, or the body itself.
fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn report<T>(what: &str, result: Result<T, ServiceError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ServiceError::Unavailable) => {
            debug!(what, "generative service not configured");
            None
        }
        Err(err) => {
            warn!(what, error = %err, "generative request failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_prefers_error_field() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        assert_eq!(api_message(body), "API key not valid");
        assert_eq!(api_message(" gateway down \n"), "gateway down");
    }

    #[tokio::test]
    async fn unconfigured_client_returns_none() {
        let client = GenAiClient::new(GenAiConfig::default()).unwrap();
        assert!(!client.is_configured());
        assert!(client.generate_prayer_text("grateful").await.is_none());
        assert!(client.generate_quiz_questions("Psalms").await.is_none());
        assert!(client.synthesize_speech("Amen").await.is_none());
    }

    #[tokio::test]
    async fn unreachable_service_returns_none() {
        let config = GenAiConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: Some(2),
            ..GenAiConfig::default()
        };
        let client = GenAiClient::new(config).unwrap();
        assert!(client.ask_mentor("Who was Ruth?").await.is_none());
    }
}
