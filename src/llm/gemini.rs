//! Gemini REST client implementing the completion and speech collaborators

use crate::integration::config::GeminiConfig;
use crate::llm::client::{CompletionClient, FragmentStream, SpeechSynthesizer};
use crate::llm::prompts::build_system_instruction;
use crate::vocab::Category;
use crate::{AhmadError, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AhmadError::ConfigError("Gemini API key is required".into()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AhmadError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    fn text_request(&self, prompt: &str, category: Category, known_words: &[String]) -> ApiRequest {
        ApiRequest {
            system_instruction: Some(ApiContent {
                role: None,
                parts: vec![ApiPart::text(build_system_instruction(category, known_words))],
            }),
            contents: vec![ApiContent {
                role: Some("user".to_string()),
                parts: vec![ApiPart::text(prompt)],
            }],
            generation_config: ApiGenerationConfig {
                temperature: Some(self.config.temperature),
                response_modalities: None,
                speech_config: None,
            },
        }
    }

    async fn post(&self, url: String, payload: &ApiRequest) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AhmadError::CompletionError(format!("request timed out: {}", e))
                } else if e.is_connect() {
                    AhmadError::CompletionError(format!("connection failed: {}", e))
                } else {
                    AhmadError::from(e)
                }
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Ok(resp)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<String> {
        let url = self.endpoint(&self.config.text_model, "generateContent");
        let payload = self.text_request(prompt, category, known_words);
        debug!(model = %self.config.text_model, "Requesting completion");

        let body: ApiResponse = self
            .post(url, &payload)
            .await?
            .json()
            .await
            .map_err(|e| AhmadError::CompletionError(format!("invalid response body: {}", e)))?;

        let text = body.text();
        if text.is_empty() {
            return Err(AhmadError::CompletionError("empty response".into()));
        }
        Ok(text)
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        category: Category,
        known_words: &[String],
    ) -> Result<FragmentStream> {
        let url = format!(
            "{}?alt=sse",
            self.endpoint(&self.config.text_model, "streamGenerateContent")
        );
        let payload = self.text_request(prompt, category, known_words);
        debug!(model = %self.config.text_model, "Requesting streamed completion");

        let resp = self.post(url, &payload).await?;
        Ok(parse_sse_stream(resp.bytes_stream()).boxed())
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiClient {
    async fn synthesize(&self, text: &str) -> Result<String> {
        let url = self.endpoint(&self.config.speech_model, "generateContent");
        let payload = ApiRequest {
            system_instruction: None,
            contents: vec![ApiContent {
                role: None,
                parts: vec![ApiPart::text(text)],
            }],
            generation_config: ApiGenerationConfig {
                temperature: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(ApiSpeechConfig {
                    voice_config: ApiVoiceConfig {
                        prebuilt_voice_config: ApiPrebuiltVoice {
                            voice_name: self.config.voice.clone(),
                        },
                    },
                }),
            },
        };

        let body: ApiResponse = self
            .post(url, &payload)
            .await
            .map_err(|e| AhmadError::SpeechError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AhmadError::SpeechError(format!("invalid response body: {}", e)))?;

        body.inline_audio()
            .ok_or_else(|| AhmadError::SpeechError("No audio data received from API".into()))
    }
}

fn api_error(status: StatusCode, body: &str) -> AhmadError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    warn!(%status, "Gemini API returned an error");
    AhmadError::CompletionError(format!("gemini api error {}: {}", status, message))
}

fn parse_sse_stream<E>(
    byte_stream: impl Stream<Item = std::result::Result<bytes::Bytes, E>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send
where
    E: std::fmt::Display + Send + 'static,
{
    // A trailing blank line dispatches a last event the server left unterminated
    let terminator = futures::stream::once(async { Ok(bytes::Bytes::from_static(b"\n\n")) });
    let events = byte_stream.chain(terminator).eventsource();

    async_stream::stream! {
        futures::pin_mut!(events);

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(AhmadError::CompletionError(format!("stream error: {}", e)));
                    return;
                }
            };

            match serde_json::from_str::<ApiResponse>(event.data.trim()) {
                Ok(response) => {
                    let text = response.text();
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(e) => {
                    yield Err(AhmadError::CompletionError(format!("invalid stream event: {}", e)));
                    return;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<ApiInlineData>,
}

impl ApiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<ApiSpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiSpeechConfig {
    voice_config: ApiVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiVoiceConfig {
    prebuilt_voice_config: ApiPrebuiltVoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiPrebuiltVoice {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

impl ApiResponse {
    fn parts(&self) -> impl Iterator<Item = &ApiPart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter())
            .into_iter()
            .flatten()
    }

    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }

    fn inline_audio(&self) -> Option<String> {
        self.parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.clone())
    }
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        assert!(GeminiClient::new(GeminiConfig::default()).is_err());
        assert!(GeminiClient::new(GeminiConfig::new("key")).is_ok());
    }

    #[test]
    fn test_request_shape() {
        let client = GeminiClient::new(GeminiConfig::new("key")).unwrap();
        let request = client.text_request("cat", Category::General, &[]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "cat");
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Ahmad"));
        assert!(json["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello"},{"text":" there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text(), "Hello there");
        assert_eq!(body.inline_audio(), None);
    }

    #[test]
    fn test_response_inline_audio() {
        let body: ApiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;rate=24000","data":"AAA="}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.inline_audio().as_deref(), Some("AAA="));
    }

    #[test]
    fn test_api_error_uses_envelope_message() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#,
        );
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_sse_stream_yields_fragments() {
        let chunks: Vec<std::result::Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from(
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\ndata: {\"candi",
            )),
            Ok(bytes::Bytes::from(
                "dates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}\r\n\r\n",
            )),
        ];
        let fragments: Vec<String> = parse_sse_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_sse_multibyte_letter_split_across_chunks() {
        let event = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ƙasa\"}]}}]}\n\n";
        let bytes = event.as_bytes();
        // Split between the two bytes of `ƙ` (C6 99)
        let split = event.find('ƙ').unwrap() + 1;
        let chunks: Vec<std::result::Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::copy_from_slice(&bytes[..split])),
            Ok(bytes::Bytes::copy_from_slice(&bytes[split..])),
        ];

        let fragments: Vec<String> = parse_sse_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["ƙasa"]);
    }

    #[tokio::test]
    async fn test_sse_unterminated_last_event_is_kept() {
        let chunks: Vec<std::result::Result<bytes::Bytes, reqwest::Error>> = vec![
            Ok(bytes::Bytes::from(
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Sannu\"}]}}]}\n\n",
            )),
            Ok(bytes::Bytes::from(
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" da zuwa\"}]}}]}",
            )),
        ];

        let fragments: Vec<String> = parse_sse_stream(futures::stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Sannu", " da zuwa"]);
    }
}
