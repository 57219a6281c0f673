//! Integration tests that call a real model server.
//!
//! These tests need an OpenAI-compatible endpoint, by default a local Ollama
//! at http://localhost:11434/v1, and a model name in STORY_MODEL (via .env
//! file or environment).
//! Run with: `cargo test -p story-core --test api_integration -- --ignored`
//!
//! These are marked #[ignore] by default to avoid:
//! - Test failures when no model server is running
//! - Slow test runs (generation takes seconds)

use std::sync::Arc;

use story_core::narrator::{is_ending, parse_options};
use story_core::{Catalog, Choice, Narrator, StoryConfig, StoryGame, StoryId};

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if a model is configured
fn has_model() -> bool {
    std::env::var(story_core::config::MODEL_ENV).is_ok()
}

fn game() -> StoryGame {
    let config = StoryConfig::load(None).expect("config should load");
    config.validate().expect("config should be valid");

    let catalog = Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/stories.csv"))
        .expect("catalog should load");
    let generator = config.generator().expect("generator should build");
    let narrator = Narrator::new(Arc::new(catalog), Arc::new(generator), config.narrator_config());
    StoryGame::new(narrator)
}

#[tokio::test]
#[ignore] // Run with: cargo test -p story-core --test api_integration -- --ignored
async fn test_opening_offers_two_options() {
    setup();
    if !has_model() {
        eprintln!("Skipping test: STORY_MODEL not set");
        return;
    }

    let mut game = game();
    game.select_story(StoryId(1)).expect("story 1 exists");
    let text = game.start().await.expect("opening should narrate").to_string();

    assert!(!text.is_empty());
    assert_eq!(game.chapter(), 2);

    // Models do not always follow the format, so only report it.
    match parse_options(&text) {
        Some(options) => println!("A: {}\nB: {}", options.a, options.b),
        None => println!("No options parsed from:\n{text}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_continuation_after_choice() {
    setup();
    if !has_model() {
        eprintln!("Skipping test: STORY_MODEL not set");
        return;
    }

    let mut game = game();
    game.select_story(StoryId(1)).expect("story 1 exists");
    let opening = game.start().await.expect("opening should narrate").to_string();

    if is_ending(&opening, &game.narrator().config().ending_marker) {
        println!("The story ended in the first chapter");
        return;
    }

    let text = game
        .choose(Choice::A)
        .await
        .expect("continuation should narrate")
        .to_string();

    assert!(!text.is_empty());
    assert_ne!(text, opening);
    assert_eq!(game.chapter(), 3);
    println!("{text}");
}
