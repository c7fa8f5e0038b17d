use std::time::Duration;

use storyloops_agent::{GenerationError, GenerationParams, Generator};
use tracing::{debug, info, warn};

use crate::{ClassificationOutcome, StoryPrompts, Verdict};

/// Critic feedback on one draft together with its interpreted verdict
#[derive(Debug, Clone)]
pub struct Judgement {
    /// Full critic text, shown to the user and persisted
    pub feedback: String,
    pub verdict: Verdict,
    pub duration: Duration,
}

/// Runs the critic role against a story draft
pub struct StoryJudge<'a> {
    generator: &'a dyn Generator,
}

impl<'a> StoryJudge<'a> {
    pub fn new(generator: &'a dyn Generator) -> Self {
        Self { generator }
    }

    /// Judge a draft and interpret the verdict
    pub async fn judge(&self, story: &str) -> Result<Judgement, GenerationError> {
        let prompt = StoryPrompts::build_judge_prompt(story);
        debug!(prompt_len = prompt.len(), "Running critic");

        let output = self
            .generator
            .generate(&prompt, &GenerationParams::judging())
            .await?;

        let verdict = Verdict::parse(&output.text);
        if verdict.is_unrecognized() {
            warn!("Critic output has no verdict marker; offering a minor revision");
        }
        info!(
            verdict = %verdict,
            duration_secs = output.duration.as_secs_f64(),
            "Critic completed"
        );

        Ok(Judgement {
            feedback: output.text,
            verdict,
            duration: output.duration,
        })
    }
}

/// Runs the classifier role against a finished story
pub struct StoryClassifier<'a> {
    generator: &'a dyn Generator,
}

impl<'a> StoryClassifier<'a> {
    pub fn new(generator: &'a dyn Generator) -> Self {
        Self { generator }
    }

    /// Classify a story. Only capability failures are errors; undecodable
    /// output comes back as `ClassificationOutcome::ParseFailed`.
    pub async fn classify(&self, story: &str) -> Result<ClassificationOutcome, GenerationError> {
        let prompt = StoryPrompts::build_classification_prompt(story);
        let output = self
            .generator
            .generate(&prompt, &GenerationParams::classification())
            .await?;

        let outcome = ClassificationOutcome::parse(&output.text);
        match &outcome {
            ClassificationOutcome::StructuredOk(classification) => {
                let unknown = classification.unknown_genres();
                if !unknown.is_empty() {
                    debug!(?unknown, "Classifier returned tags outside the vocabulary");
                }
            }
            ClassificationOutcome::ParseFailed(raw) => {
                warn!(raw_len = raw.len(), "Classifier output could not be decoded");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storyloops_agent::{ChatMessage, Generation};

    /// Replies with a fixed text and records every call
    struct FixedGenerator {
        reply: String,
        calls: Mutex<Vec<(String, GenerationParams)>>,
    }

    impl FixedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for FixedGenerator {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            params: &GenerationParams,
        ) -> Result<Generation, GenerationError> {
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.calls.lock().unwrap().push((prompt, *params));
            Ok(Generation::new(
                self.reply.clone(),
                "fixed".to_string(),
                Duration::from_millis(5),
            ))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _params: &GenerationParams,
        ) -> Result<Generation, GenerationError> {
            Err(GenerationError::Network("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_judge_uses_judging_params() {
        let generator = FixedGenerator::new("Nice pacing.\nFinal verdict: Major Revisions");
        let judgement = StoryJudge::new(&generator).judge("A tale.").await.unwrap();

        assert_eq!(judgement.verdict, Verdict::MajorRevisions);
        assert_eq!(judgement.feedback, "Nice pacing.\nFinal verdict: Major Revisions");

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.ends_with("STORY:\nA tale."));
        assert_eq!(calls[0].1, GenerationParams::judging());
    }

    #[tokio::test]
    async fn test_classifier_uses_classification_params() {
        let generator = FixedGenerator::new(r#"{"genres":["fun"],"lesson":"Be brave."}"#);
        let outcome = StoryClassifier::new(&generator)
            .classify("A tale.")
            .await
            .unwrap();

        assert!(outcome.is_structured());
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0].1, GenerationParams::classification());
    }

    #[tokio::test]
    async fn test_classifier_parse_failure_is_not_an_error() {
        let generator = FixedGenerator::new("I think it is a fun story!");
        let outcome = StoryClassifier::new(&generator)
            .classify("A tale.")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ClassificationOutcome::ParseFailed("I think it is a fun story!".to_string())
        );
    }

    #[tokio::test]
    async fn test_capability_failure_propagates() {
        let result = StoryJudge::new(&FailingGenerator).judge("A tale.").await;
        assert!(matches!(result, Err(GenerationError::Network(_))));
    }
}
