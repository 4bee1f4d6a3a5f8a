use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ModerationConfig;

pub const POLICY_PROMPT: &str = "You are a content moderator for a pregnancy and motherhood \
community app. Your job is to identify inappropriate content, spam, harmful medical advice, or \
offensive language. Respond with a JSON object containing 'approved' (boolean), 'reason' \
(string if not approved), and 'confidence' (0-1).";

const DEFAULT_REASON: &str = "Content flagged by AI moderation";

/// Anything that can answer the policy prompt for a piece of text.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Raw classifier reply for `text`.
    async fn classify(&self, text: &str) -> anyhow::Result<String>;
}

/// Calls an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionsClassifier {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsClassifier {
    pub fn new(http: reqwest::Client, config: &ModerationConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl ContentClassifier for ChatCompletionsClassifier {
    async fn classify(&self, text: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("no moderation API key configured")?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": POLICY_PROMPT },
                { "role": "user", "content": format!("Moderate this content:\n\n{}", text) }
            ]
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("classifier reply had no content")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub approved: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    fn rejected(reason: Option<String>) -> Self {
        Self {
            approved: false,
            reason: Some(
                reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REASON.to_string()),
            ),
        }
    }

    /// Reason to show the author, present only on rejections.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or(DEFAULT_REASON)
    }
}

#[derive(Deserialize)]
struct Decision {
    approved: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Read a classifier reply. A JSON object with a boolean `approved` wins;
/// otherwise the reply must mention both "approved" and "true".
pub fn parse_reply(reply: &str) -> Verdict {
    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            if let Ok(decision) = serde_json::from_str::<Decision>(&reply[start..=end]) {
                return if decision.approved {
                    Verdict::approved()
                } else {
                    Verdict::rejected(decision.reason)
                };
            }
        }
    }

    let lowered = reply.to_lowercase();
    if lowered.contains("approved") && lowered.contains("true") {
        Verdict::approved()
    } else {
        Verdict::rejected(None)
    }
}

/// The gate in front of every post and comment write. Fails open.
#[derive(Clone)]
pub struct Moderator {
    classifier: Arc<dyn ContentClassifier>,
}

impl Moderator {
    pub fn new(classifier: Arc<dyn ContentClassifier>) -> Self {
        Self { classifier }
    }

    pub async fn moderate(&self, text: &str) -> Verdict {
        match self.classifier.classify(text).await {
            Ok(reply) => parse_reply(&reply),
            Err(e) => {
                tracing::warn!("Moderation unavailable, approving: {:#}", e);
                Verdict::approved()
            }
        }
    }
}
