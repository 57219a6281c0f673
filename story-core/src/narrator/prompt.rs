//! User-message builders for the narrator.
//!
//! The wording is free text; the structure is not. Opening prompts carry the
//! synopsis and the first chapter. Continuation prompts carry the synopsis,
//! the chapter number, the compressed summary and the chapter text.
//! Summarization messages carry the synopsis inside a background marker,
//! the previous chapter and the literal choice token.

use crate::session::Choice;

/// Label wrapped around the synopsis when it is given to the summarizer, so
/// the recap neither repeats it nor spoils later chapters. Only the
/// summarization message ever contains it.
pub const BACKGROUND_MARKER: &str = "BACKGROUND SYNOPSIS (context only: do not repeat it and do not reveal events that have not happened yet):";

const FINAL_CHAPTER_NOTE: &str = "This is the final chapter of the story. Resolve the adventure here instead of offering new options.";

/// Where a chapter sits in its story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterPosition {
    pub number: u32,
    pub total: u32,
}

impl ChapterPosition {
    pub fn is_final(&self) -> bool {
        self.number >= self.total
    }
}

/// Prompt for the first chapter of a story.
pub fn opening(synopsis: &str, first_chapter: &str, position: ChapterPosition) -> String {
    let mut prompt = format!(
        "The synopsis of the story is: {synopsis}\n\n\
         Begin narrating the first chapter of the story, which is: {first_chapter}"
    );
    push_final_note(&mut prompt, position);
    prompt
}

/// Prompt for any chapter after a decision has been made.
pub fn continuation(
    synopsis: &str,
    position: ChapterPosition,
    summary: &str,
    chapter_text: &str,
) -> String {
    let number = position.number;
    let mut prompt = format!(
        "The synopsis of the story is: {synopsis}\n\
         The player is now in chapter {number}.\n\n\
         So far, the following has happened: {summary}\n\n\
         The next chapter is number {number} and is about: {chapter_text}\n\n\
         Start like this: explain what happened because of the player's decision, \
         link it to the new chapter, narrate the chapter and carry it forward to the next decision point."
    );
    push_final_note(&mut prompt, position);
    prompt
}

/// Message asking the summarizer to compress the previous chapter and the
/// player's choice.
pub fn summarization(synopsis: &str, prior_text: &str, choice: Option<Choice>) -> String {
    let token = choice.map_or("(none)", Choice::token);
    format!(
        "{BACKGROUND_MARKER}\n{synopsis}\n\n\
         {prior_text}\n\n\
         Summarize all of this. The player took the path: {token}\n\
         Explain the consequences of that action and continue the story from this point."
    )
}

fn push_final_note(prompt: &mut String, position: ChapterPosition) {
    if position.is_final() {
        prompt.push_str("\n\n");
        prompt.push_str(FINAL_CHAPTER_NOTE);
    }
}
