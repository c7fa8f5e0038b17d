use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use storyloops_agent::{GenerationParams, Generator};
use storyloops_critic::{Judgement, RevisionKind, StoryJudge};
use storyloops_logging::{LogEvent, Logger};

use crate::context::IterationRecord;
use crate::decision::{Decision, DecisionSource};
use crate::error::LoopError;
use crate::outcome::{LoopOutcome, Termination};
use crate::LoopContext;

/// States of the write-judge-revise loop
enum LoopState {
    Generating,
    Judging {
        story: String,
        draft_secs: f64,
    },
    AwaitingUserDecision {
        story: String,
        judgement: Judgement,
        kind: RevisionKind,
    },
    Accepted {
        story: String,
        judgement: Judgement,
        termination: Termination,
    },
    Abandoned {
        story: String,
        judgement: Judgement,
    },
}

/// Orchestrates the storyteller-critic loop
pub struct StoryLoop<'a> {
    generator: &'a dyn Generator,
    logger: Arc<Logger>,
}

impl<'a> StoryLoop<'a> {
    pub fn new(generator: &'a dyn Generator, logger: Arc<Logger>) -> Self {
        Self { generator, logger }
    }

    /// Run the loop until the critic accepts, the user keeps a draft, or the
    /// decision source abandons. Capability failures end the loop with an error.
    pub async fn run(
        &self,
        mut context: LoopContext,
        decisions: &mut dyn DecisionSource,
    ) -> Result<LoopOutcome, LoopError> {
        self.logger.log(&LogEvent::SessionStarted {
            request: context.request.user_request.clone(),
            world: context.request.world.as_ref().map(|w| w.name.clone()),
        });

        match self.drive(&mut context, decisions).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "Story loop failed");
                self.logger.log(&LogEvent::ErrorEncountered {
                    iteration: context.iteration,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        context: &mut LoopContext,
        decisions: &mut dyn DecisionSource,
    ) -> Result<LoopOutcome, LoopError> {
        let mut state = LoopState::Generating;

        loop {
            state = match state {
                LoopState::Generating => {
                    let (story, draft_secs) = self.write_draft(context).await?;
                    LoopState::Judging { story, draft_secs }
                }
                LoopState::Judging { story, draft_secs } => {
                    let judgement = self.judge_draft(context, &story, draft_secs).await?;
                    match judgement.verdict.revision_kind() {
                        None => LoopState::Accepted {
                            story,
                            judgement,
                            termination: Termination::CriticAccepted,
                        },
                        Some(_) if context.revision_limit_reached() => {
                            self.logger.log(&LogEvent::RevisionLimitReached {
                                revisions: context.revisions(),
                            });
                            LoopState::Accepted {
                                story,
                                judgement,
                                termination: Termination::RevisionLimitReached,
                            }
                        }
                        Some(kind) => LoopState::AwaitingUserDecision {
                            story,
                            judgement,
                            kind,
                        },
                    }
                }
                LoopState::AwaitingUserDecision {
                    story,
                    judgement,
                    kind,
                } => match decisions.decide(kind, &story, &judgement).await? {
                    Decision::Revise => {
                        self.logger.log(&LogEvent::RevisionRequested {
                            iteration: context.iteration,
                            kind: kind.as_str().to_string(),
                        });
                        context.increment_iteration();
                        LoopState::Generating
                    }
                    Decision::Keep => {
                        self.logger.log(&LogEvent::RevisionDeclined {
                            iteration: context.iteration,
                        });
                        LoopState::Accepted {
                            story,
                            judgement,
                            termination: Termination::RevisionDeclined,
                        }
                    }
                    Decision::Abandon => LoopState::Abandoned { story, judgement },
                },
                LoopState::Accepted {
                    story,
                    judgement,
                    termination,
                } => {
                    let iterations = context.iteration + 1;
                    self.logger.log(&LogEvent::LoopCompleted {
                        iterations,
                        accepted_by_critic: termination == Termination::CriticAccepted,
                        duration_secs: context.total_duration().as_secs_f64(),
                    });
                    info!(iterations, ?termination, "Story loop finished");
                    return Ok(self.finish(context, termination, story, judgement));
                }
                LoopState::Abandoned { story, judgement } => {
                    self.logger.log(&LogEvent::LoopAbandoned {
                        iterations: context.iteration + 1,
                    });
                    return Ok(self.finish(context, Termination::Abandoned, story, judgement));
                }
            };
        }
    }

    async fn write_draft(&self, context: &LoopContext) -> Result<(String, f64), LoopError> {
        let iteration = context.iteration;
        self.logger.log(&LogEvent::DraftStarted { iteration });

        let prompt = context.request.story_prompt();
        debug!(iteration, prompt_len = prompt.len(), "Writing draft");
        let draft = self
            .generator
            .generate(&prompt, &GenerationParams::story())
            .await?;

        let draft_secs = draft.duration.as_secs_f64();
        self.logger.log(&LogEvent::DraftCompleted {
            iteration,
            words: draft.word_count(),
            duration_secs: draft_secs,
            model: draft.model.clone(),
            output_tokens: draft.output_tokens,
        });
        self.logger.log(&LogEvent::StoryText {
            iteration,
            text: draft.text.clone(),
        });
        Ok((draft.text, draft_secs))
    }

    async fn judge_draft(
        &self,
        context: &mut LoopContext,
        story: &str,
        draft_secs: f64,
    ) -> Result<Judgement, LoopError> {
        let iteration = context.iteration;
        self.logger.log(&LogEvent::JudgeStarted { iteration });

        let judgement = StoryJudge::new(self.generator).judge(story).await?;

        self.logger.log(&LogEvent::JudgeFeedback {
            iteration,
            text: judgement.feedback.clone(),
        });
        self.logger.log(&LogEvent::JudgeCompleted {
            iteration,
            verdict: judgement.verdict.short_description().to_string(),
        });

        context.push_record(IterationRecord {
            iteration_number: iteration,
            story_words: story.split_whitespace().count(),
            draft_duration_secs: draft_secs,
            verdict: judgement.verdict.short_description().to_string(),
            judge_duration_secs: judgement.duration.as_secs_f64(),
            timestamp: Utc::now(),
        });
        Ok(judgement)
    }

    fn finish(
        &self,
        context: &mut LoopContext,
        termination: Termination,
        story: String,
        judgement: Judgement,
    ) -> LoopOutcome {
        LoopOutcome::new(
            termination,
            story,
            judgement.feedback,
            judgement.verdict,
            context.iteration + 1,
            std::mem::take(&mut context.history),
            context.total_duration(),
        )
    }
}
