//! Question generation: a remote [`QuestionProvider`] with built-in fallback.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::fallback;

/// Number of attempts against the remote provider before falling back.
const MAX_REMOTE_ATTEMPTS: u32 = 3;

/// One generated question, `correct_option` 1-based as delivered over the wire
/// by a remote provider (`quizbattle-core` converts to 0-based at deck build).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: u8,
}

/// A source of quiz questions. Implementations may hit a network service; the
/// trait is async over a boxed future so it stays object-safe, matching how
/// this workspace's other pluggable providers are shaped.
pub trait QuestionProvider: Send + Sync {
    fn generate<'a>(
        &'a self,
        topic: &'a str,
        difficulty: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawQuestion>, OracleError>> + Send + 'a>>;

    fn is_configured(&self) -> bool;
}

/// Remote provider speaking an OpenAI-style chat-completions endpoint.
pub struct HttpQuestionProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl HttpQuestionProvider {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default();
        Self { client, api_base: api_base.into(), api_key: api_key.into(), model: model.into() }
    }

    fn difficulty_hint(difficulty: &str) -> &'static str {
        match difficulty {
            "easy" => "easy: basic facts and obvious options",
            "hard" => "hard: more depth and non-trivial wording",
            _ => "medium: requires a basic understanding of the topic",
        }
    }

    async fn request_batch(&self, topic: &str, difficulty: &str, count: usize) -> Result<Vec<RawQuestion>, OracleError> {
        let prompt = format!(
            "Generate exactly {count} unique quiz questions about '{topic}', difficulty '{difficulty}' ({}). \
             Respond with a JSON array of objects, each with fields text, options (array of 4 strings), correct_option (1-4).",
            Self::difficulty_hint(difficulty)
        );

        let payload = serde_json::json!({
            "model": self.model,
            "temperature": 0.6,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OracleError::Parse("missing message content".to_string()))?;

        let content = extract_json_block(content);
        let parsed: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| OracleError::Parse(e.to_string()))?;

        let items = match parsed {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut obj) => match obj.remove("data") {
                Some(serde_json::Value::Array(items)) => items,
                _ => return Err(OracleError::Parse("expected a JSON array or {data: [...]}".to_string())),
            },
            _ => return Err(OracleError::Parse("expected a JSON array".to_string())),
        };

        Ok(items.into_iter().filter_map(|v| serde_json::from_value::<RawQuestion>(v).ok()).collect())
    }
}

/// Strip a fenced ` ```json ... ``` ` block a chat model commonly wraps its
/// answer in.
fn extract_json_block(content: &str) -> String {
    if let Some(start) = content.find("```") {
        let rest = &content[start + 3..];
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.find("```") {
            return rest[..end].trim().to_string();
        }
    }
    content.trim().to_string()
}

impl QuestionProvider for HttpQuestionProvider {
    fn generate<'a>(
        &'a self,
        topic: &'a str,
        difficulty: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawQuestion>, OracleError>> + Send + 'a>> {
        Box::pin(async move {
            let mut used_texts = HashSet::new();
            let mut valid = Vec::new();

            for attempt in 1..=MAX_REMOTE_ATTEMPTS {
                match self.request_batch(topic, difficulty, count).await {
                    Ok(batch) => {
                        valid.extend(validate(batch, count, &mut used_texts));
                        if valid.len() >= count {
                            valid.truncate(count);
                            return Ok(valid);
                        }
                        tracing::warn!(attempt, got = valid.len(), needed = count, "oracle batch short, retrying");
                    }
                    Err(err) => {
                        tracing::warn!(attempt, error = %err, "oracle request failed");
                    }
                }
            }

            Err(OracleError::InsufficientQuestions { needed: count, available: valid.len() })
        })
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Validate a raw remote batch: non-empty, unique text within the batch,
/// exactly 4 options, `correct_option` a valid 1-4 integer.
fn validate(batch: Vec<RawQuestion>, count: usize, used_texts: &mut HashSet<String>) -> Vec<RawQuestion> {
    let mut valid = Vec::new();
    for item in batch {
        if item.text.trim().is_empty() || used_texts.contains(&item.text) {
            continue;
        }
        if !(1..=4).contains(&item.correct_option) {
            continue;
        }
        used_texts.insert(item.text.clone());
        valid.push(item);
        if valid.len() >= count {
            break;
        }
    }
    valid
}

/// Built-in pool used when the remote is unset or exhausted.
pub struct FallbackQuestionProvider;

impl QuestionProvider for FallbackQuestionProvider {
    fn generate<'a>(
        &'a self,
        _topic: &'a str,
        _difficulty: &'a str,
        count: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawQuestion>, OracleError>> + Send + 'a>> {
        Box::pin(async move {
            let mut rng = rand::thread_rng();
            let drawn = fallback::draw(&mut rng, &[], count);
            if drawn.len() < count {
                return Err(OracleError::InsufficientQuestions { needed: count, available: drawn.len() });
            }
            Ok(drawn)
        })
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Fetch `count` questions, preferring `remote` and padding out any shortfall
/// from the built-in pool, per the oracle's documented contract.
pub async fn fetch(
    remote: Option<&dyn QuestionProvider>,
    topic: &str,
    difficulty: &str,
    count: usize,
    rng: &mut impl rand::Rng,
) -> Result<Vec<RawQuestion>, OracleError> {
    let mut used_texts = Vec::new();
    let mut questions = if let Some(remote) = remote.filter(|r| r.is_configured()) {
        match remote.generate(topic, difficulty, count).await {
            Ok(batch) => {
                used_texts.extend(batch.iter().map(|q| q.text.clone()));
                batch
            }
            Err(err) => {
                tracing::warn!(error = %err, "oracle remote exhausted, using fallback pool");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    if questions.len() < count {
        let needed = count - questions.len();
        let filler = fallback::draw(rng, &used_texts, needed);
        questions.extend(filler);
    }

    if questions.len() < count {
        return Err(OracleError::InsufficientQuestions { needed: count, available: questions.len() });
    }

    questions.truncate(count);
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn validate_drops_duplicate_and_malformed_entries() {
        let mut used = HashSet::new();
        let batch = vec![
            RawQuestion { text: "a".into(), options: ["1".into(), "2".into(), "3".into(), "4".into()], correct_option: 2 },
            RawQuestion { text: "a".into(), options: ["1".into(), "2".into(), "3".into(), "4".into()], correct_option: 2 },
            RawQuestion { text: "".into(), options: ["1".into(), "2".into(), "3".into(), "4".into()], correct_option: 1 },
            RawQuestion { text: "b".into(), options: ["1".into(), "2".into(), "3".into(), "4".into()], correct_option: 5 },
            RawQuestion { text: "c".into(), options: ["1".into(), "2".into(), "3".into(), "4".into()], correct_option: 3 },
        ];

        let valid = validate(batch, 10, &mut used);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].text, "a");
        assert_eq!(valid[1].text, "c");
    }

    #[tokio::test]
    async fn fetch_falls_back_when_remote_unconfigured() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let questions = fetch(None, "Rust", "medium", 4, &mut rng).await.unwrap();
        assert_eq!(questions.len(), 4);

        let texts: HashSet<&str> = questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts.len(), 4, "fallback draw must not repeat a question");
    }

    #[tokio::test]
    async fn fetch_errors_when_pool_cannot_cover_the_request() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let result = fetch(None, "Rust", "medium", 1000, &mut rng).await;
        assert!(matches!(result, Err(OracleError::InsufficientQuestions { .. })));
    }
}
