//! The narration controller.
//!
//! The Narrator turns a story record plus the player's progress into
//! chapter text. Opening chapters are generated straight from the synopsis
//! and the first chapter summary. Every later chapter first asks the
//! summarizer to compress the previous chapter and the player's choice into
//! a short recap, and only that recap is fed to the storyteller, so prompt
//! size stays bounded however long the story runs.

use super::generator::{GenerationError, Generator};
use super::profile::{InstructionProfile, ProfileKind, RecapPolicy, DEFAULT_ENDING_MARKER};
use super::prompt::{self, ChapterPosition};
use crate::catalog::{Catalog, StoryId};
use crate::session::{Choice, SessionState, FIRST_CHAPTER};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, warn};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Errors from the narrator.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("story {0} is not in the catalog")]
    StoryNotFound(StoryId),

    #[error("story {story} has {available} chapters, chapter {chapter} does not exist")]
    ChapterOutOfRange {
        story: StoryId,
        chapter: u32,
        available: u32,
    },

    #[error("{profile} generation failed: {source}")]
    Generation {
        profile: ProfileKind,
        #[source]
        source: GenerationError,
    },

    #[error("{profile} generation timed out after {after:?}")]
    GenerationTimeout { profile: ProfileKind, after: Duration },
}

/// Configuration for the Narrator.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// Upper bound for one generation call.
    pub timeout: Duration,

    /// Retries after a transient failure or timeout.
    pub max_retries: usize,

    /// Base delay of the exponential backoff between retries.
    pub retry_base_delay: Duration,

    /// Whether the storyteller may recap earlier chapters.
    pub recap: RecapPolicy,

    /// Phrase the storyteller uses to end the adventure.
    pub ending_marker: String,

    /// Extra instructions appended to the storyteller profile.
    pub extra_instruction: Option<String>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 1,
            retry_base_delay: Duration::from_millis(500),
            recap: RecapPolicy::default(),
            ending_marker: DEFAULT_ENDING_MARKER.to_string(),
            extra_instruction: None,
        }
    }
}

impl NarratorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_recap(mut self, recap: RecapPolicy) -> Self {
        self.recap = recap;
        self
    }

    pub fn with_ending_marker(mut self, marker: impl Into<String>) -> Self {
        self.ending_marker = marker.into();
        self
    }

    pub fn with_extra_instruction(mut self, extra: impl Into<String>) -> Self {
        self.extra_instruction = Some(extra.into());
        self
    }
}

/// Outcome of one attempt, before retry classification.
enum Attempt {
    Failed(GenerationError),
    TimedOut,
}

/// The narration controller.
#[derive(Clone)]
pub struct Narrator {
    catalog: Arc<Catalog>,
    generator: Arc<dyn Generator>,
    storyteller: InstructionProfile,
    summarizer: InstructionProfile,
    config: NarratorConfig,
}

impl Narrator {
    pub fn new(catalog: Arc<Catalog>, generator: Arc<dyn Generator>, config: NarratorConfig) -> Self {
        let mut storyteller = InstructionProfile::storyteller(config.recap, &config.ending_marker);
        if let Some(extra) = &config.extra_instruction {
            storyteller = storyteller.with_extra_instruction(extra);
        }

        Self {
            catalog,
            generator,
            storyteller,
            summarizer: InstructionProfile::summarizer(),
            config,
        }
    }

    /// Replace both instruction profiles.
    pub fn with_profiles(mut self, storyteller: InstructionProfile, summarizer: InstructionProfile) -> Self {
        self.storyteller = storyteller;
        self.summarizer = summarizer;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    pub fn storyteller(&self) -> &InstructionProfile {
        &self.storyteller
    }

    pub fn summarizer(&self) -> &InstructionProfile {
        &self.summarizer
    }

    /// Narrate the chapter `session.chapter` of `story_id`.
    ///
    /// With chapter 1 and no prior text or choice this is the opening;
    /// anything else is a continuation, which runs the summarizer before the
    /// storyteller. On success the session moves to the next chapter and
    /// remembers the text and choice. On failure the session is untouched.
    pub async fn narrate(
        &self,
        session: &mut SessionState,
        story_id: StoryId,
        prior_text: &str,
        prior_choice: Option<Choice>,
    ) -> Result<String, NarrationError> {
        let story = self
            .catalog
            .lookup(story_id)
            .ok_or(NarrationError::StoryNotFound(story_id))?;

        let number = session.chapter;
        let chapter_text = story
            .chapter(number)
            .ok_or(NarrationError::ChapterOutOfRange {
                story: story_id,
                chapter: number,
                available: story.chapter_count(),
            })?;
        let position = ChapterPosition {
            number,
            total: story.chapter_count(),
        };

        let opening = number == FIRST_CHAPTER && prior_text.is_empty() && prior_choice.is_none();

        let prompt = if opening {
            info!(story = %story_id, title = story.title(), "narrating opening chapter");
            prompt::opening(story.synopsis(), chapter_text, position)
        } else {
            info!(
                story = %story_id,
                chapter = number,
                choice = ?prior_choice,
                "narrating continuation"
            );
            let message = prompt::summarization(story.synopsis(), prior_text, prior_choice);
            let summary = self.generate(&self.summarizer, &message).await?;
            debug!(chars = summary.len(), "compressed previous chapter");
            prompt::continuation(story.synopsis(), position, &summary, chapter_text)
        };

        let text = self.generate(&self.storyteller, &prompt).await?;

        session.record_chapter(text.clone(), prior_choice);
        Ok(text)
    }

    /// Narrate the opening of `story_id`.
    pub async fn begin(
        &self,
        session: &mut SessionState,
        story_id: StoryId,
    ) -> Result<String, NarrationError> {
        self.narrate(session, story_id, "", None).await
    }

    /// Continue `story_id` from the session's last chapter with `choice`.
    pub async fn advance(
        &self,
        session: &mut SessionState,
        story_id: StoryId,
        choice: Choice,
    ) -> Result<String, NarrationError> {
        let prior_text = session.last_text.clone();
        self.narrate(session, story_id, &prior_text, Some(choice)).await
    }

    /// One generation call under `profile`, bounded by the configured
    /// timeout and retried with backoff on transient failures.
    async fn generate(
        &self,
        profile: &InstructionProfile,
        message: &str,
    ) -> Result<String, NarrationError> {
        let kind = profile.kind();
        let timeout = self.config.timeout;
        let strategy = ExponentialBackoff::from_millis(self.retry_base_millis())
            .factor(2)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(strategy, || async move {
            match tokio::time::timeout(timeout, self.generator.generate(profile, message)).await {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(e)) if e.is_transient() => {
                    warn!(profile = %kind, error = %e, "transient generation failure, will retry");
                    Err(RetryError::Transient {
                        err: Attempt::Failed(e),
                        retry_after: None,
                    })
                }
                Ok(Err(e)) => {
                    warn!(profile = %kind, error = %e, "generation failed");
                    Err(RetryError::Permanent(Attempt::Failed(e)))
                }
                Err(_) => {
                    warn!(profile = %kind, ?timeout, "generation timed out");
                    Err(RetryError::Transient {
                        err: Attempt::TimedOut,
                        retry_after: None,
                    })
                }
            }
        })
        .await;

        result.map_err(|attempt| match attempt {
            Attempt::Failed(source) => NarrationError::Generation {
                profile: kind,
                source,
            },
            Attempt::TimedOut => NarrationError::GenerationTimeout {
                profile: kind,
                after: timeout,
            },
        })
    }

    fn retry_base_millis(&self) -> u64 {
        u64::try_from(self.config.retry_base_delay.as_millis())
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("stories", &self.catalog.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
