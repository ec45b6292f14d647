//! Parser for the `<WORD>term</WORD>` directive the tutor puts at the start
//! of a reply when it teaches a new word.
//!
//! The directive is for the client only: it is recorded as a learned word
//! and removed before the reply is shown or spoken. Streaming snapshots hide
//! the directive as well, including one that has only partially arrived.

use crate::vocab::LearnedWord;

pub const WORD_OPEN: &str = "<WORD>";
pub const WORD_CLOSE: &str = "</WORD>";
pub const TRANSLATION_LABEL: &str = "**Hausa Translation:**";

/// Result of post-processing a finished reply
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedReply {
    /// Text to display, directive removed
    pub display_text: String,

    /// The word taught by this reply, if the directive and a translation were found
    pub learned: Option<LearnedWord>,
}

/// Extract the word directive from a complete reply
pub fn process_reply(text: &str) -> ProcessedReply {
    let Some((term, rest)) = split_directive(text) else {
        return ProcessedReply {
            display_text: text.to_string(),
            learned: None,
        };
    };

    let learned = match find_translation(rest) {
        Some(translation) if !term.is_empty() => Some(LearnedWord::new(term, translation)),
        _ => None,
    };

    ProcessedReply {
        display_text: rest.trim_start().to_string(),
        learned,
    }
}

/// Text to show for a reply that is still streaming in
pub fn streaming_display(partial: &str) -> &str {
    let trimmed = partial.trim_start();

    if trimmed.starts_with(WORD_OPEN) {
        return match trimmed.find(WORD_CLOSE) {
            Some(pos) => trimmed[pos + WORD_CLOSE.len()..].trim_start(),
            // Directive not closed yet
            None => "",
        };
    }

    if !trimmed.is_empty() && WORD_OPEN.starts_with(trimmed) {
        return "";
    }

    partial
}

/// Prepare reply text for speech: heading markers read badly aloud
pub fn speech_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            let stripped = line.trim_start_matches('#');
            if stripped.len() != line.len() && stripped.starts_with(char::is_whitespace) {
                stripped.trim_start()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_directive(text: &str) -> Option<(&str, &str)> {
    let body = text.trim_start().strip_prefix(WORD_OPEN)?;
    let close = body.find(WORD_CLOSE)?;
    let term = body[..close].trim();
    let rest = &body[close + WORD_CLOSE.len()..];
    Some((term, rest))
}

fn find_translation(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (_, value) = line.split_once(TRANSLATION_LABEL)?;
        let value = value
            .trim()
            .trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_is_recorded_and_stripped() {
        let reply = "<WORD>serendipity</WORD>## Serendipity\n**Hausa Translation:** Kaddara\n**Examples:** ...";
        let processed = process_reply(reply);

        assert_eq!(
            processed.learned,
            Some(LearnedWord::new("serendipity", "Kaddara"))
        );
        assert!(processed.display_text.starts_with("## Serendipity"));
        assert!(!processed.display_text.contains("<WORD>"));
    }

    #[test]
    fn test_reply_without_directive_is_untouched() {
        let reply = "## Happy\n**Hausa Translation:** Farin ciki";
        let processed = process_reply(reply);
        assert_eq!(processed.display_text, reply);
        assert_eq!(processed.learned, None);
    }

    #[test]
    fn test_directive_without_translation_is_stripped_but_not_recorded() {
        let processed = process_reply("<WORD>eloquent</WORD>\n## Eloquent\nNo translation here");
        assert_eq!(processed.learned, None);
        assert_eq!(processed.display_text, "## Eloquent\nNo translation here");
    }

    #[test]
    fn test_translation_emphasis_is_trimmed() {
        let processed = process_reply("<WORD>cat</WORD>\n**Hausa Translation:** *Kyanwa*");
        assert_eq!(processed.learned, Some(LearnedWord::new("cat", "Kyanwa")));
    }

    #[test]
    fn test_unclosed_directive_is_left_alone() {
        let processed = process_reply("<WORD>cat ## Cat");
        assert_eq!(processed.display_text, "<WORD>cat ## Cat");
        assert_eq!(processed.learned, None);
    }

    #[test]
    fn test_streaming_display_hides_partial_directive() {
        assert_eq!(streaming_display("<WO"), "");
        assert_eq!(streaming_display("<WORD>seren"), "");
        assert_eq!(streaming_display("<WORD>serendipity</WORD>## Ser"), "## Ser");
        assert_eq!(streaming_display("Hello"), "Hello");
        assert_eq!(streaming_display(""), "");
    }

    #[test]
    fn test_speech_text_drops_heading_markers() {
        let text = "## Serendipity\n**Pronunciation:** [ser-uhn-dip-i-tee]\n#hashtag";
        assert_eq!(
            speech_text(text),
            "Serendipity\n**Pronunciation:** [ser-uhn-dip-i-tee]\n#hashtag"
        );
    }
}
