//! Testing utilities for the story engine.
//!
//! This module provides tools for integration testing:
//! - `ScriptedGenerator` for deterministic testing without API calls
//! - `TestHarness` for scripted play-throughs of a story
//! - `sample_catalog` with a small two-chapter story

use crate::catalog::{Catalog, StoryId, StoryRecord};
use crate::game::StoryGame;
use crate::narrator::{
    GenerationError, Generator, InstructionProfile, Narrator, NarratorConfig, ProfileKind,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A scripted reply from the generator.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text.
    Text(String),
    /// Fail, either with a retryable or a permanent error.
    Fail { transient: bool },
    /// Never answer. Only a timeout gets the caller out.
    Hang,
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn transient_failure() -> Self {
        ScriptedReply::Fail { transient: true }
    }

    pub fn permanent_failure() -> Self {
        ScriptedReply::Fail { transient: false }
    }
}

/// One call the generator received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationCall {
    pub profile: ProfileKind,
    pub instruction: String,
    pub message: String,
}

/// A generator that returns scripted replies in order and records every
/// call it receives.
///
/// Running out of replies is an error, so tests notice unexpected calls.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A generator that answers with each text in turn.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ScriptedReply::text).collect())
    }

    /// Add a reply to the end of the queue.
    pub fn queue(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<GenerationCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Profiles of the calls received so far, in order.
    pub fn profiles(&self) -> Vec<ProfileKind> {
        lock(&self.calls).iter().map(|c| c.profile).collect()
    }

    /// Replies not consumed yet.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        profile: &InstructionProfile,
        message: &str,
    ) -> Result<String, GenerationError> {
        lock(&self.calls).push(GenerationCall {
            profile: profile.kind(),
            instruction: profile.instruction().to_string(),
            message: message.to_string(),
        });

        let reply = lock(&self.replies).pop_front();
        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail { transient: true }) => {
                Err(GenerationError::Client(chat::Error::Network("scripted failure".into())))
            }
            Some(ScriptedReply::Fail { transient: false }) => Err(GenerationError::Client(
                chat::Error::Api {
                    status: 400,
                    message: "scripted failure".into(),
                },
            )),
            Some(ScriptedReply::Hang) => {
                std::future::pending::<()>().await;
                Err(GenerationError::Unavailable("scripted hang ended".into()))
            }
            None => Err(GenerationError::Unavailable(
                "no more scripted replies".into(),
            )),
        }
    }
}

// A panicking test must not cascade into every later assertion.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A catalog with one story (id 1, synopsis "S") of two chapters, "intro"
/// and "middle".
pub fn sample_catalog() -> Catalog {
    Catalog::from_records(vec![StoryRecord::new(
        StoryId(1),
        "The Sample Tale",
        "S",
        vec!["intro".to_string(), "middle".to_string()],
    )])
    .unwrap_or_default()
}

/// Test harness for scripted play-throughs.
pub struct TestHarness {
    /// The scripted generator, shared with the game.
    pub generator: Arc<ScriptedGenerator>,
    /// The game under test.
    pub game: StoryGame,
}

impl TestHarness {
    /// A harness over [`sample_catalog`] with no replies queued.
    pub fn new() -> Self {
        Self::with_catalog(sample_catalog())
    }

    /// A harness over `catalog` with no replies queued.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let generator = Arc::new(ScriptedGenerator::default());
        let config = NarratorConfig::default()
            .with_timeout(Duration::from_millis(200))
            .with_retries(1, Duration::from_millis(1));
        let narrator = Narrator::new(Arc::new(catalog), generator.clone(), config);

        Self {
            generator,
            game: StoryGame::new(narrator),
        }
    }

    /// Queue replies for upcoming generation calls.
    pub fn script<I, S>(&self, texts: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            self.generator.queue(ScriptedReply::text(text));
        }
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
