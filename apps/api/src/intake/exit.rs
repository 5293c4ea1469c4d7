/// Words that end the conversation when sent on their own.
const EXIT_WORDS: &[&str] = &["exit", "quit", "stop", "bye", "goodbye", "end"];

/// True iff the whole turn is a termination word, ignoring case, surrounding
/// whitespace and trailing `.`/`!`. Sentences merely containing one of the
/// words ("let's stop by the office") do not end the session.
pub fn detect_exit(text: &str) -> bool {
    let normalized = text
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .trim()
        .to_lowercase();
    EXIT_WORDS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_exit_words() {
        for word in EXIT_WORDS {
            assert!(detect_exit(word), "{word} should end the session");
        }
    }

    #[test]
    fn test_case_whitespace_and_punctuation_ignored() {
        assert!(detect_exit("  Bye  "));
        assert!(detect_exit("GOODBYE!"));
        assert!(detect_exit("quit."));
    }

    #[test]
    fn test_words_inside_sentences_do_not_exit() {
        assert!(!detect_exit("I'll reply by Friday"));
        assert!(!detect_exit("let's stop by the office"));
        assert!(!detect_exit("Backend engineer"));
        assert!(!detect_exit(""));
    }
}
