//! Reading generated chapter text.
//!
//! The storyteller ends every chapter with two lines of the form
//! `A - ...` and `B - ...`, or with the ending marker once the adventure is
//! over. Models drift from the exact format, so the parser also accepts
//! `A)`, `A:`, `A.` and bold letters.

use crate::session::Choice;

/// The two options offered at the end of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOptions {
    pub a: String,
    pub b: String,
}

impl ChoiceOptions {
    pub fn get(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
        }
    }
}

/// Extract the A/B options from chapter text.
///
/// When a letter appears on several lines the last occurrence wins, since
/// the options close the chapter. Returns `None` unless both are present.
pub fn parse_options(text: &str) -> Option<ChoiceOptions> {
    let mut a = None;
    let mut b = None;

    for line in text.lines() {
        match option_line(line) {
            Some((Choice::A, option)) => a = Some(option),
            Some((Choice::B, option)) => b = Some(option),
            None => {}
        }
    }

    Some(ChoiceOptions { a: a?, b: b? })
}

/// Whether the text closes the adventure.
///
/// The marker must close the last non-empty line, as a whole phrase and in
/// any case. Trailing punctuation, quotes and emphasis are ignored.
pub fn is_ending(text: &str, marker: &str) -> bool {
    let marker = strip_trailing_marks(marker.trim()).to_lowercase();
    if marker.is_empty() {
        return false;
    }

    let Some(last) = text.lines().rev().find(|line| !line.trim().is_empty()) else {
        return false;
    };
    let last = strip_trailing_marks(last).to_lowercase();

    match last.strip_suffix(&marker) {
        Some(before) => before.chars().last().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}

fn strip_trailing_marks(s: &str) -> &str {
    s.trim_end_matches(|c: char| !c.is_alphanumeric())
}

fn option_line(line: &str) -> Option<(Choice, String)> {
    let line = line.trim().trim_start_matches(['*', '_']);
    let mut chars = line.chars();
    let choice = match chars.next()? {
        'A' | 'a' => Choice::A,
        'B' | 'b' => Choice::B,
        _ => return None,
    };

    let rest = chars.as_str().trim_start_matches(['*', '_']);
    let rest = rest.trim_start();
    let mut rest_chars = rest.chars();
    match rest_chars.next()? {
        '-' | ')' | ':' | '.' | '–' | '—' => {}
        _ => return None,
    }

    let option = rest_chars
        .as_str()
        .trim()
        .trim_start_matches(['*', '_'])
        .trim_end_matches(['*', '_'])
        .trim();
    if option.is_empty() {
        return None;
    }
    Some((choice, option.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dash_options() {
        let text = "The road forks.\n\nA - Take the left path\nB - Take the right path\n";
        let options = parse_options(text).unwrap();
        assert_eq!(options.a, "Take the left path");
        assert_eq!(options.b, "Take the right path");
        assert_eq!(options.get(Choice::B), "Take the right path");
    }

    #[test]
    fn test_parse_variant_separators() {
        let text = "**A)** Open the door\n**B:** Walk away";
        let options = parse_options(text).unwrap();
        assert_eq!(options.a, "Open the door");
        assert_eq!(options.b, "Walk away");

        let text = "A. climb\nb. swim";
        let options = parse_options(text).unwrap();
        assert_eq!(options.a, "climb");
        assert_eq!(options.b, "swim");
    }

    #[test]
    fn test_words_starting_with_a_or_b_are_not_options() {
        let text = "At dawn the bells rang.\nBefore long, the gates opened.\nA - Enter\n";
        assert!(parse_options(text).is_none());
    }

    #[test]
    fn test_last_occurrence_wins() {
        let text = "A - early\nB - early\nMore story.\nA - late\nB - late";
        let options = parse_options(text).unwrap();
        assert_eq!(options.a, "late");
        assert_eq!(options.b, "late");
    }

    #[test]
    fn test_missing_option() {
        assert!(parse_options("Just prose.").is_none());
        assert!(parse_options("A - only one").is_none());
        assert!(parse_options("A - \nB - x").is_none());
    }

    #[test]
    fn test_is_ending() {
        assert!(is_ending("And so it was. THE END.", "THE END"));
        assert!(is_ending("...the end", "THE END"));
        assert!(is_ending("The hero falls.\n\n**THE END**\n\n", "THE END"));
        assert!(is_ending("Cae el telón.\n\"FIN DEL JUEGO\"", "fin del juego"));
        assert!(!is_ending("The ending is near", "THE END"));
        assert!(!is_ending("anything", "  "));
        assert!(!is_ending("", "THE END"));
    }

    #[test]
    fn test_the_end_inside_prose_is_not_an_ending() {
        let text = "You walk to the end of the corridor...\nA - Open it\nB - Turn back";
        assert!(!is_ending(text, "THE END"));
        assert!(!is_ending("At the end of the hall a door waits.", "THE END"));
        assert!(!is_ending("THE END was only the beginning.", "THE END"));
        assert!(!is_ending("A lone legend", "END"));
    }
}
