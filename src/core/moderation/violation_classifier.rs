// Text classifier - pure substring matching, no I/O.

use super::moderation_models::{TextScan, Verdict};

/// Markers that count as sharing a link.
pub const DEFAULT_LINK_MARKERS: &[&str] = &["http://", "https://", "t.me/"];

/// Words that mean someone probably wants a human.
pub const DEFAULT_URGENT_KEYWORDS: &[&str] = &["help", "urgent", "important", "admin", "serious"];

/// Leading character of a bot command.
pub const COMMAND_MARKER: char = '/';

/// Case-insensitive link and keyword matcher.
#[derive(Debug, Clone)]
pub struct ViolationClassifier {
    link_markers: Vec<String>,
    urgent_keywords: Vec<String>,
}

impl ViolationClassifier {
    pub fn new<L, K>(link_markers: L, urgent_keywords: K) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            link_markers: link_markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
            urgent_keywords: urgent_keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Is this a bot command? Commands skip both violation paths.
    pub fn is_command(text: &str) -> bool {
        text.starts_with(COMMAND_MARKER)
    }

    /// Find link and keyword markers independently of each other.
    pub fn scan(&self, text: &str) -> TextScan {
        let lowered = text.to_lowercase();
        TextScan {
            has_link: self.link_markers.iter().any(|m| lowered.contains(m.as_str())),
            has_urgent_keyword: self
                .urgent_keywords
                .iter()
                .any(|k| lowered.contains(k.as_str())),
        }
    }

    /// Single verdict for a message. A link outranks a keyword.
    pub fn classify(&self, text: &str) -> Verdict {
        let scan = self.scan(text);
        if scan.has_link {
            Verdict::LinkViolation
        } else if scan.has_urgent_keyword {
            Verdict::KeywordAlert
        } else {
            Verdict::Clean
        }
    }
}

impl Default for ViolationClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_MARKERS, DEFAULT_URGENT_KEYWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_are_violations_in_any_case() {
        let classifier = ViolationClassifier::default();
        assert_eq!(classifier.classify("see HTTPS://example.com"), Verdict::LinkViolation);
        assert_eq!(classifier.classify("join t.me/somegroup"), Verdict::LinkViolation);
        assert_eq!(classifier.classify("plain http://x"), Verdict::LinkViolation);
    }

    #[test]
    fn test_keywords_only_raise_an_alert() {
        let classifier = ViolationClassifier::default();
        assert_eq!(classifier.classify("This is URGENT"), Verdict::KeywordAlert);
        assert_eq!(classifier.classify("can an admin look?"), Verdict::KeywordAlert);
        assert_eq!(classifier.classify("good morning"), Verdict::Clean);
    }

    #[test]
    fn test_scan_reports_link_and_keyword_together() {
        let classifier = ViolationClassifier::default();
        let scan = classifier.scan("help! https://scam.example");
        assert!(scan.has_link);
        assert!(scan.has_urgent_keyword);
        assert_eq!(classifier.classify("help! https://scam.example"), Verdict::LinkViolation);
    }

    #[test]
    fn test_custom_marker_sets() {
        let classifier = ViolationClassifier::new(["Discord.GG/"], ["SOS"]);
        assert_eq!(classifier.classify("discord.gg/abc"), Verdict::LinkViolation);
        assert_eq!(classifier.classify("sos"), Verdict::KeywordAlert);
        assert_eq!(classifier.classify("https://example.com"), Verdict::Clean);
    }

    #[test]
    fn test_command_detection() {
        assert!(ViolationClassifier::is_command("/start"));
        assert!(!ViolationClassifier::is_command("hi /start"));
        assert!(!ViolationClassifier::is_command(""));
    }
}
