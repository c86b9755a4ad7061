//! Passive triggers: the reaction emoji and the AFK notice.
//!
//! Both checks are independent of command routing, so a single message can
//! be a command, get a reaction and produce an AFK notice all at once.

const AWAY_MARKER: &str = "afk";

#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    words: Vec<String>,
    prefixes: Vec<String>,
}

impl TriggerEvaluator {
    pub fn new<W, P>(words: W, prefixes: P) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            prefixes: prefixes.into_iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }

    /// Any trigger word anywhere in the text, or any command prefix at the
    /// start. Unknown and malformed commands still match on the prefix.
    pub fn should_react(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.words.iter().any(|w| lowered.contains(w.as_str()))
            || self.prefixes.iter().any(|p| lowered.starts_with(p.as_str()))
    }

    pub fn is_away_announcement(&self, text: &str) -> bool {
        text.to_lowercase().contains(AWAY_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> TriggerEvaluator {
        TriggerEvaluator::new(["afgm"], ["-", "afgm "])
    }

    #[test]
    fn prefix_triggers_reaction() {
        assert!(evaluator().should_react("-ping"));
        assert!(evaluator().should_react("-definitely-not-a-command"));
    }

    #[test]
    fn trigger_word_anywhere_reacts() {
        assert!(evaluator().should_react("hello afgm"));
        assert!(evaluator().should_react("AFGM rocks"));
    }

    #[test]
    fn plain_text_does_not_react() {
        assert!(!evaluator().should_react("hello"));
        assert!(!evaluator().should_react("a-b"));
    }

    #[test]
    fn away_detection_is_case_insensitive() {
        assert!(evaluator().is_away_announcement("I'm AFK now"));
        assert!(evaluator().is_away_announcement("brb, afk"));
        assert!(!evaluator().is_away_announcement("back again"));
    }
}
