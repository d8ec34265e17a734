//! Keyword-based problem detection.

/// Default vocabulary of problem-indicator phrases.
///
/// Matched as lowercase substrings of `"{title} {body}"` — no stemming, no
/// weighting. The first hit decides.
const PROBLEM_PHRASES: &[&str] = &[
    "problem",
    "issue",
    "struggle",
    "frustrated",
    "pain",
    "difficult",
    "hard to",
    "waste",
    "need",
    "looking for",
    "how can i",
    "how do i",
    "can't find",
    "annoying",
    "inefficient",
    "time-consuming",
    "expensive",
    "complicated",
];

/// The phrase vocabulary used to decide whether a post describes a problem.
///
/// Injected into the pipeline rather than read from a global so callers can
/// swap it (and tests can shrink it) without touching the orchestrator.
#[derive(Debug, Clone)]
pub struct ProblemLexicon {
    phrases: Vec<String>,
}

impl Default for ProblemLexicon {
    fn default() -> Self {
        Self::new(PROBLEM_PHRASES.iter().map(|p| (*p).to_string()))
    }
}

impl ProblemLexicon {
    /// Build a lexicon from an ordered phrase list. Phrases are lower-cased;
    /// empty phrases are dropped.
    pub fn new(phrases: impl IntoIterator<Item = String>) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| p.to_lowercase())
            .filter(|p| !p.trim().is_empty())
            .collect();
        Self { phrases }
    }

    /// Returns `true` if the title+body text contains any vocabulary phrase.
    ///
    /// Pure function; an empty body is valid input.
    #[must_use]
    pub fn is_problem(&self, title: &str, body: &str) -> bool {
        let text = format!("{title} {body}").to_lowercase();
        self.phrases.iter().any(|phrase| text.contains(phrase))
    }

    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_keyword_matches() {
        let lexicon = ProblemLexicon::default();
        assert!(lexicon.is_problem("I need a tool to automate X", ""));
    }

    #[test]
    fn no_keyword_no_match() {
        let lexicon = ProblemLexicon::default();
        assert!(!lexicon.is_problem("Check out my new logo", ""));
    }

    #[test]
    fn body_alone_can_match() {
        let lexicon = ProblemLexicon::default();
        assert!(lexicon.is_problem(
            "Weekly thread",
            "I keep running into the same billing problem every month"
        ));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let lexicon = ProblemLexicon::default();
        assert!(lexicon.is_problem("FRUSTRATED with my invoicing setup", ""));
    }

    #[test]
    fn custom_lexicon_replaces_default_vocabulary() {
        let lexicon = ProblemLexicon::new(vec!["blocked".to_string()]);
        assert!(lexicon.is_problem("Totally blocked on deployment", ""));
        assert!(!lexicon.is_problem("I need a tool", ""));
    }

    #[test]
    fn empty_phrases_are_dropped() {
        let lexicon = ProblemLexicon::new(vec![String::new(), "  ".to_string()]);
        assert!(lexicon.phrases().is_empty());
        assert!(!lexicon.is_problem("anything at all", "really"));
    }

    #[test]
    fn phrase_matches_inside_longer_words() {
        // Substring semantics: "need" matches "needed".
        let lexicon = ProblemLexicon::default();
        assert!(lexicon.is_problem("What I needed was a simpler CRM", ""));
    }
}
