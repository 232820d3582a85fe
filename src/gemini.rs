use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// One `generateContent` call with deterministic decoding so repeated
    /// queries for the same input reproduce the same text.
    pub async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<&'a str>,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            temperature: f32,
            top_k: u32,
            top_p: f32,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerateReq<'a> {
            system_instruction: Content<'a>,
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }

        #[derive(Deserialize)]
        struct RespPart {
            text: Option<String>,
        }

        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<RespContent>,
        }

        #[derive(Deserialize)]
        struct GenerateResp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        let Some(api_key) = &self.api_key else {
            anyhow::bail!("GEMINI_API_KEY is not configured");
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let response = self
            .client
            .post(url)
            .json(&GenerateReq {
                system_instruction: Content {
                    role: None,
                    parts: vec![Part {
                        text: system_instruction,
                    }],
                },
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: 0.0,
                    top_k: 1,
                    top_p: 0.9,
                },
            })
            .send()
            .await
            .context("failed to call gemini generateContent endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "gemini generateContent returned {status}: {}",
                normalize_err_body(&body)
            );
        }

        let response = response
            .json::<GenerateResp>()
            .await
            .context("failed to decode gemini generateContent response")?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(message) = json
            .get("error")
            .and_then(|err| err.get("message"))
            .and_then(|msg| msg.as_str())
        {
            return message.to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    fn client(api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(String::from),
            model: "gemini-1.5-flash".to_string(),
        })
    }

    #[test]
    fn configuration_reflects_api_key_presence() {
        assert!(!client(None).is_configured());
        assert!(client(Some("k")).is_configured());
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error_not_a_panic() {
        let err = client(None)
            .generate("prompt", "system")
            .await
            .expect_err("expected configuration error");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn error_bodies_are_normalized_to_messages() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        assert_eq!(normalize_err_body(body), "API key not valid");
        assert_eq!(normalize_err_body("   "), "<empty body>");
        assert_eq!(normalize_err_body("plain failure"), "plain failure");
    }
}
