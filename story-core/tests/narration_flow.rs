//! Narration flow tests using the scripted generator.
//!
//! These run without a model server and pin down the narrator contract:
//! opening and continuation prompts, the summarize-then-narrate order,
//! bounds checks and failure handling.

use std::sync::Arc;
use std::time::Duration;

use story_core::narrator::prompt::BACKGROUND_MARKER;
use story_core::testing::{sample_catalog, ScriptedGenerator, ScriptedReply};
use story_core::{
    Catalog, Choice, NarrationError, Narrator, NarratorConfig, ProfileKind, SessionState,
    StoryId, StoryRecord,
};

fn narrator_with(generator: &Arc<ScriptedGenerator>, catalog: Catalog) -> Narrator {
    let config = NarratorConfig::default()
        .with_timeout(Duration::from_millis(100))
        .with_retries(1, Duration::from_millis(1));
    Narrator::new(Arc::new(catalog), generator.clone(), config)
}

fn shipped_catalog() -> Catalog {
    Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/stories.csv"))
        .expect("sample catalog should load")
}

// =============================================================================
// END-TO-END SCENARIO
// =============================================================================

#[tokio::test]
async fn test_two_chapter_scenario() {
    let generator = Arc::new(ScriptedGenerator::with_texts([
        "T1",
        "SUMMARY OF T1",
        "T2",
    ]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));

    // Opening
    let t1 = narrator
        .narrate(&mut session, StoryId(1), "", None)
        .await
        .unwrap();
    assert_eq!(t1, "T1");
    assert_eq!(session.chapter, 2);

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].profile, ProfileKind::Storyteller);
    assert!(calls[0].message.contains("story is: S\n"));
    assert!(calls[0].message.contains("intro"));

    // Continuation
    let t2 = narrator
        .narrate(&mut session, StoryId(1), &t1, Some(Choice::A))
        .await
        .unwrap();
    assert_eq!(t2, "T2");
    assert_eq!(session.chapter, 3);
    assert_eq!(session.last_text, "T2");
    assert_eq!(session.last_choice, Some(Choice::A));

    let calls = generator.calls();
    assert_eq!(calls.len(), 3);

    let summarize = &calls[1];
    assert_eq!(summarize.profile, ProfileKind::Summarizer);
    assert!(summarize.message.contains("\nS\n"));
    assert!(summarize.message.contains("T1"));
    assert!(summarize.message.contains("path: A"));

    let narrate = &calls[2];
    assert_eq!(narrate.profile, ProfileKind::Storyteller);
    assert!(narrate.message.contains("story is: S\n"));
    assert!(narrate.message.contains("chapter 2"));
    assert!(narrate.message.contains("SUMMARY OF T1"));
    assert!(narrate.message.contains("middle"));
    assert!(!narrate.message.contains("intro"));
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[tokio::test]
async fn test_opening_for_every_story() {
    let catalog = shipped_catalog();
    let ids = catalog.ids();
    assert!(!ids.is_empty());

    let generator = Arc::new(ScriptedGenerator::default());
    let narrator = narrator_with(&generator, catalog);

    for id in ids {
        generator.queue(ScriptedReply::text(format!("Opening of {id}")));
        let mut session = SessionState::for_story(id);

        let text = narrator.begin(&mut session, id).await.unwrap();
        assert!(!text.is_empty());
        assert_eq!(session.chapter, 2, "story {id}");
    }
    assert!(generator
        .profiles()
        .iter()
        .all(|p| *p == ProfileKind::Storyteller));
}

#[tokio::test]
async fn test_every_continuation_summarizes_first() {
    let catalog = shipped_catalog();
    let story = catalog.ids()[0];
    let chapters = catalog.lookup(story).unwrap().chapter_count();

    let generator = Arc::new(ScriptedGenerator::default());
    let narrator = narrator_with(&generator, catalog);
    let mut session = SessionState::for_story(story);

    generator.queue(ScriptedReply::text("chapter 1 text"));
    narrator.begin(&mut session, story).await.unwrap();

    for chapter in 2..=chapters {
        generator.queue(ScriptedReply::text(format!("recap before {chapter}")));
        generator.queue(ScriptedReply::text(format!("chapter {chapter} text")));
        let choice = if chapter % 2 == 0 { Choice::A } else { Choice::B };
        narrator.advance(&mut session, story, choice).await.unwrap();
        assert_eq!(session.chapter, chapter + 1);
    }

    let calls = generator.calls();
    assert_eq!(calls.len() as u32, 1 + 2 * (chapters - 1));
    for pair in calls[1..].chunks(2) {
        assert_eq!(pair[0].profile, ProfileKind::Summarizer);
        assert_eq!(pair[1].profile, ProfileKind::Storyteller);
        assert!(pair[0].message.contains(BACKGROUND_MARKER));
        assert!(!pair[1].message.contains(BACKGROUND_MARKER));
    }
}

#[test]
fn test_lookup_is_stable() {
    let catalog = shipped_catalog();
    for id in catalog.ids() {
        assert_eq!(catalog.lookup(id), catalog.lookup(id));
    }
}

#[tokio::test]
async fn test_new_story_resets_session() {
    let generator = Arc::new(ScriptedGenerator::with_texts(["first", "recap", "second"]));
    let narrator = narrator_with(&generator, shipped_catalog());
    let mut session = SessionState::new();

    session.select_story(StoryId(1));
    narrator.begin(&mut session, StoryId(1)).await.unwrap();
    narrator
        .advance(&mut session, StoryId(1), Choice::B)
        .await
        .unwrap();
    assert_eq!(session.chapter, 3);

    assert!(session.select_story(StoryId(2)));
    assert_eq!(session.chapter, 1);
    assert!(session.last_text.is_empty());
    assert_eq!(session.last_choice, None);
}

#[tokio::test]
async fn test_chapter_out_of_range_makes_no_calls() {
    let generator = Arc::new(ScriptedGenerator::with_texts(["never"]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));
    session.chapter = 3;
    let before = session.clone();

    let err = narrator
        .narrate(&mut session, StoryId(1), "T2", Some(Choice::A))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NarrationError::ChapterOutOfRange {
            story: StoryId(1),
            chapter: 3,
            available: 2,
        }
    ));
    assert_eq!(generator.call_count(), 0);
    assert_eq!(session, before);
}

#[tokio::test]
async fn test_chapter_zero_is_out_of_range() {
    let generator = Arc::new(ScriptedGenerator::default());
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));
    session.chapter = 0;

    let err = narrator
        .narrate(&mut session, StoryId(1), "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, NarrationError::ChapterOutOfRange { chapter: 0, .. }));
    assert_eq!(generator.call_count(), 0);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_summarizer_failure_leaves_session_untouched() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        ScriptedReply::text("T1"),
        ScriptedReply::permanent_failure(),
    ]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));

    narrator.begin(&mut session, StoryId(1)).await.unwrap();
    let before = session.clone();

    let err = narrator
        .advance(&mut session, StoryId(1), Choice::A)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NarrationError::Generation {
            profile: ProfileKind::Summarizer,
            ..
        }
    ));
    assert_eq!(session, before);
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_storyteller_timeout_leaves_session_untouched() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        ScriptedReply::text("T1"),
        ScriptedReply::text("recap"),
        ScriptedReply::Hang,
        ScriptedReply::Hang,
    ]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));

    narrator.begin(&mut session, StoryId(1)).await.unwrap();
    let before = session.clone();

    let err = narrator
        .advance(&mut session, StoryId(1), Choice::B)
        .await
        .unwrap_err();
    match err {
        NarrationError::GenerationTimeout { profile, after } => {
            assert_eq!(profile, ProfileKind::Storyteller);
            assert_eq!(after, Duration::from_millis(100));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(session, before);
    assert_eq!(generator.call_count(), 4);
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        ScriptedReply::Hang,
        ScriptedReply::text("T1"),
    ]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));

    let text = narrator.begin(&mut session, StoryId(1)).await.unwrap();
    assert_eq!(text, "T1");
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        ScriptedReply::transient_failure(),
        ScriptedReply::transient_failure(),
        ScriptedReply::text("too late"),
    ]));
    let narrator = narrator_with(&generator, sample_catalog());
    let mut session = SessionState::for_story(StoryId(1));

    assert!(narrator.begin(&mut session, StoryId(1)).await.is_err());
    assert_eq!(generator.call_count(), 2);
    assert_eq!(generator.remaining(), 1);
}

#[tokio::test]
async fn test_shared_generator_across_sessions() {
    let catalog = Catalog::from_records(vec![
        StoryRecord::new(StoryId(1), "One", "first synopsis", vec!["a".into()]),
        StoryRecord::new(StoryId(2), "Two", "second synopsis", vec!["b".into()]),
    ])
    .unwrap();
    let generator = Arc::new(ScriptedGenerator::with_texts(["one", "two"]));
    let narrator = narrator_with(&generator, catalog);

    let mut first = SessionState::for_story(StoryId(1));
    let mut second = SessionState::for_story(StoryId(2));
    let (a, b) = tokio::join!(
        narrator.begin(&mut first, StoryId(1)),
        narrator.begin(&mut second, StoryId(2)),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(first.chapter, 2);
    assert_eq!(second.chapter, 2);
    let calls = generator.calls();
    assert!(calls.iter().all(|c| c.profile == ProfileKind::Storyteller));
    assert!(calls.iter().any(|c| c.message.contains("first synopsis")));
    assert!(calls.iter().any(|c| c.message.contains("second synopsis")));
}
