//! Deterministic language-model stub for stage and orchestrator tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use clarifymd_gateway::LanguageModel;
use clarifymd_shared::GatewayError;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    /// Non-success HTTP status with this body.
    Status(String),
    /// Opaque transport failure.
    Transport,
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: Reply,
    delay: Duration,
}

/// Answers each prompt with the first rule whose needle it contains.
#[derive(Debug, Default)]
pub(crate) struct ScriptedModel {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn when(mut self, needle: impl Into<String>, reply: Reply, delay_ms: u64) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply,
            delay: Duration::from_millis(delay_ms),
        });
        self
    }

    /// Answer the extraction prompt for `text`.
    pub(crate) fn extract(self, text: &str, reply: Reply, delay_ms: u64) -> Self {
        self.when(format!("extraia os termos médicos principais: \"{text}\""), reply, delay_ms)
    }

    /// Answer the explanation prompt for `term`.
    pub(crate) fn explain(self, term: &str, reply: Reply, delay_ms: u64) -> Self {
        self.when(format!("Explique o termo médico \"{term}\""), reply, delay_ms)
    }

    /// Answer the verification prompt for `term`.
    pub(crate) fn verify(self, term: &str, reply: Reply, delay_ms: u64) -> Self {
        self.when(format!("Termo: {term}\nExplicação:"), reply, delay_ms)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let rule = self
            .rules
            .iter()
            .find(|r| prompt.contains(&r.needle))
            .cloned()
            .unwrap_or_else(|| panic!("no scripted reply for prompt:\n{prompt}"));

        if !rule.delay.is_zero() {
            tokio::time::sleep(rule.delay).await;
        }

        match rule.reply {
            Reply::Text(text) => Ok(text),
            Reply::Status(body) => Err(GatewayError::Status { status: 503, body }),
            Reply::Transport => Err(GatewayError::Transport(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
        }
    }
}
