//! Headless mode for the story reader.
//!
//! This module provides a simple text-based interface for running a story
//! without a TUI. It's designed for scripted play-throughs and piping.

use std::io::{self, BufRead, Write};

use story_core::{Choice, StoryGame, StoryId};

/// Run the game in headless mode on stdin and stdout.
pub async fn run_headless(game: StoryGame) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(game, stdin.lock(), stdout.lock()).await
}

/// Line-oriented protocol:
/// - `a` or `b` picks an option
/// - Lines starting with `#` are commands (list, select, restart, save,
///   load, status, quit)
/// - Everything printed is tagged: `[NARRATOR]`, `[OPTIONS]`, `[STATUS]`,
///   `[END]`, `[ERROR]`
pub async fn run_session<R: BufRead, W: Write>(
    mut game: StoryGame,
    input: R,
    mut out: W,
) -> io::Result<()> {
    writeln!(out, "=== Interactive Stories (headless) ===")?;
    print_help(&mut out)?;
    writeln!(out)?;

    if game.story_id().is_some() {
        start(&mut game, &mut out).await?;
    } else {
        print_stories(&game, &mut out)?;
        writeln!(out, "Pick a story with #select <id>")?;
    }
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                Some("list") => print_stories(&game, &mut out)?,
                Some("select") => match parts.get(1).map(|id| id.parse::<StoryId>()) {
                    Some(Ok(id)) => match game.select_story(id) {
                        Ok(true) => start(&mut game, &mut out).await?,
                        Ok(false) => {
                            writeln!(out, "[STATUS] Story {id} is already selected")?;
                            if !game.is_started() {
                                start(&mut game, &mut out).await?;
                            }
                        }
                        Err(e) => writeln!(out, "[ERROR] {e}")?,
                    },
                    Some(Err(_)) | None => writeln!(out, "[ERROR] Usage: #select <id>")?,
                },
                Some("restart") | Some("start") => {
                    if game.story_id().is_some() {
                        start(&mut game, &mut out).await?;
                    } else {
                        writeln!(out, "[ERROR] No story selected")?;
                    }
                }
                Some("save") => match parts.get(1) {
                    Some(path) => match game.save(path).await {
                        Ok(()) => writeln!(out, "[SAVED] Session saved to {path}")?,
                        Err(e) => writeln!(out, "[ERROR] Save failed: {e}")?,
                    },
                    None => writeln!(out, "[ERROR] Usage: #save <path>")?,
                },
                Some("load") => match parts.get(1) {
                    Some(path) => match game.load(path).await {
                        Ok(()) => {
                            writeln!(out, "[LOADED] Session loaded from {path}")?;
                            print_status(&game, &mut out)?;
                            if game.is_started() {
                                let text = game.last_text().to_string();
                                print_chapter(&game, &text, &mut out)?;
                            }
                        }
                        Err(e) => writeln!(out, "[ERROR] Load failed: {e}")?,
                    },
                    None => writeln!(out, "[ERROR] Usage: #load <path>")?,
                },
                Some("status") => print_status(&game, &mut out)?,
                Some("help") => print_help(&mut out)?,
                _ => writeln!(out, "[ERROR] Unknown command. Type #help for help.")?,
            }
            out.flush()?;
            continue;
        }

        match line.parse::<Choice>() {
            Ok(choice) => {
                let result = game.choose(choice).await.map(str::to_string);
                match result {
                    Ok(text) => print_chapter(&game, &text, &mut out)?,
                    Err(e) => writeln!(out, "[ERROR] {e}")?,
                }
            }
            Err(e) => writeln!(out, "[ERROR] {e}")?,
        }
        out.flush()?;
    }

    Ok(())
}

async fn start<W: Write>(game: &mut StoryGame, out: &mut W) -> io::Result<()> {
    if let Some(title) = game.story_title() {
        writeln!(out, "[STATUS] Starting \"{title}\"")?;
    }
    let result = game.start().await.map(str::to_string);
    match result {
        Ok(text) => print_chapter(game, &text, out),
        Err(e) => writeln!(out, "[ERROR] {e}"),
    }
}

fn print_chapter<W: Write>(game: &StoryGame, text: &str, out: &mut W) -> io::Result<()> {
    writeln!(out, "[NARRATOR]")?;
    for para in text.split("\n\n") {
        writeln!(out, "{para}")?;
    }
    writeln!(out)?;

    if game.is_finished() {
        writeln!(out, "[END] The story is over. #restart or #select another story.")?;
    } else if let Some(options) = game.options() {
        writeln!(out, "[OPTIONS] a: {} | b: {}", options.a, options.b)?;
    } else {
        writeln!(out, "[OPTIONS] a | b")?;
    }
    Ok(())
}

fn print_stories<W: Write>(game: &StoryGame, out: &mut W) -> io::Result<()> {
    writeln!(out, "[STORIES]")?;
    for story in game.stories() {
        writeln!(out, "  {}: {} - {}", story.id, story.title, story.synopsis)?;
    }
    Ok(())
}

fn print_status<W: Write>(game: &StoryGame, out: &mut W) -> io::Result<()> {
    writeln!(out, "[STATUS]")?;
    match game.story_title() {
        Some(title) => {
            writeln!(out, "  Story: {title}")?;
            writeln!(
                out,
                "  Chapters narrated: {} of {}",
                game.session().chapters_narrated(),
                game.chapters_total()
            )?;
            if let Some(choice) = game.session().last_choice {
                writeln!(out, "  Last choice: {choice}")?;
            }
            writeln!(out, "  Finished: {}", game.is_started() && game.is_finished())?;
        }
        None => writeln!(out, "  No story selected")?,
    }
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  a / b         - Take option A or B")?;
    writeln!(out, "  #list         - List the stories")?;
    writeln!(out, "  #select <id>  - Read a story")?;
    writeln!(out, "  #restart      - Start the story again")?;
    writeln!(out, "  #save <path>  - Save the session")?;
    writeln!(out, "  #load <path>  - Load a saved session")?;
    writeln!(out, "  #status       - Show where you are")?;
    writeln!(out, "  #help         - Show this help")?;
    writeln!(out, "  #quit         - Exit")
}
