use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use storyloops_agent::Generator;
use storyloops_archive::StorySessionRecord;
use storyloops_critic::{Classification, ClassificationOutcome, StoryClassifier};
use storyloops_logging::{LogEvent, Logger};

use crate::{DecisionSource, LoopContext, LoopError, LoopOutcome, StoryLoop, StoryRequest};

/// Who the saved story is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    pub contact: String,
}

impl AuthorInfo {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
        }
    }
}

impl Default for AuthorInfo {
    fn default() -> Self {
        Self::new("Anonymous", "")
    }
}

/// A full story session: the loop, then one classification of the final draft
pub struct StorySession<'a> {
    generator: &'a dyn Generator,
    logger: Arc<Logger>,
    max_revisions: Option<usize>,
}

/// Everything a finished story session produced
#[derive(Debug)]
pub struct SessionResult {
    pub request: StoryRequest,
    pub outcome: LoopOutcome,
    /// None when the loop was abandoned
    pub classification: Option<ClassificationOutcome>,
}

impl<'a> StorySession<'a> {
    pub fn new(generator: &'a dyn Generator, logger: Arc<Logger>) -> Self {
        Self {
            generator,
            logger,
            max_revisions: None,
        }
    }

    pub fn with_max_revisions(mut self, max: Option<usize>) -> Self {
        self.max_revisions = max;
        self
    }

    pub async fn run(
        &self,
        request: StoryRequest,
        decisions: &mut dyn DecisionSource,
    ) -> Result<SessionResult, LoopError> {
        let mut context = LoopContext::new(request.clone());
        if let Some(max) = self.max_revisions {
            context = context.with_max_revisions(max);
        }

        let outcome = StoryLoop::new(self.generator, Arc::clone(&self.logger))
            .run(context, decisions)
            .await?;

        if !outcome.is_accepted() {
            info!("Session abandoned; skipping classification");
            return Ok(SessionResult {
                request,
                outcome,
                classification: None,
            });
        }

        let classification = StoryClassifier::new(self.generator)
            .classify(&outcome.story)
            .await?;
        let summary = classification.clone().into_classification();
        self.logger.log(&LogEvent::ClassificationCompleted {
            genres: summary.genres,
            lesson: summary.lesson,
            parsed: classification.is_structured(),
        });

        Ok(SessionResult {
            request,
            outcome,
            classification: Some(classification),
        })
    }
}

impl SessionResult {
    /// Classification to persist; the fallback when decoding failed
    pub fn classification(&self) -> Option<Classification> {
        self.classification
            .clone()
            .map(ClassificationOutcome::into_classification)
    }

    /// Build the on-disk record, or None when there is nothing to save
    pub fn to_record(&self, author: &AuthorInfo) -> Option<StorySessionRecord> {
        let classification = self.classification()?;
        Some(StorySessionRecord {
            author: author.name.clone(),
            contact: author.contact.clone(),
            story: self.outcome.story.clone(),
            judge_feedback: self.outcome.judge_feedback.clone(),
            user_request: self.request.user_request.clone(),
            classification,
            verdict: Some(self.outcome.verdict.as_str().to_string()),
            accepted_by_critic: Some(self.outcome.accepted_by_critic()),
            datetime: Local::now().naive_local(),
        })
    }
}
