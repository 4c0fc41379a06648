//! Verdict Parsing

const VERDICT_PREFIX: &str = "final verdict";

/// Words that flip the polarity of the judgment word after them
const NEGATIONS: [&str; 4] = ["not", "no", "non", "never"];

/// Words skipped when looking back for a negation, as in "not a legitimate"
const ARTICLES: [&str; 2] = ["a", "an"];

/// Parse the binary verdict from a language model reply.
///
/// The verdict line is the last line that starts with `Final Verdict`, case
/// insensitive and ignoring leading markdown. The text after its colon is
/// split into whole words: `fraud`, `fraudulent` and `illegitimate` mean
/// `true`, `legitimate` means `false`, and a preceding `not`/`no`/`non`
/// flips the word. Returns `None` when there is no verdict line, when it names
/// neither, or when its words disagree.
pub fn parse_verdict(reply: &str) -> Option<bool> {
    let line = reply.lines().rev().find_map(|line| {
        let cleaned = line
            .trim_start_matches(|c: char| matches!(c, '*' | '#' | '-' | '>' | '`') || c.is_whitespace())
            .to_lowercase();
        cleaned.starts_with(VERDICT_PREFIX).then_some(cleaned)
    })?;

    let rest = &line[VERDICT_PREFIX.len()..];
    let judgment = rest.split_once(':').map(|(_, j)| j).unwrap_or(rest);
    let words: Vec<&str> = judgment
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut verdict = None;
    for (i, word) in words.iter().enumerate() {
        let Some(is_fraud) = word_polarity(word) else {
            continue;
        };
        let is_fraud = if is_negated(&words[..i]) { !is_fraud } else { is_fraud };
        match verdict {
            Some(previous) if previous != is_fraud => return None,
            _ => verdict = Some(is_fraud),
        }
    }
    verdict
}

/// `Some(true)` for a fraud word, `Some(false)` for a legitimacy word
fn word_polarity(word: &str) -> Option<bool> {
    match word {
        "fraud" | "fraudulent" | "illegitimate" => Some(true),
        "legitimate" | "nonfraud" => Some(false),
        _ => None,
    }
}

fn is_negated(before: &[&str]) -> bool {
    before
        .iter()
        .rev()
        .find(|w| !ARTICLES.contains(*w))
        .map_or(false, |w| NEGATIONS.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_verdicts() {
        assert_eq!(parse_verdict("Analysis...\nFinal Verdict: FRAUD"), Some(true));
        assert_eq!(parse_verdict("Analysis...\nFinal Verdict: LEGITIMATE"), Some(false));
    }

    #[test]
    fn test_markdown_and_case() {
        assert_eq!(parse_verdict("**Final Verdict**: Fraudulent"), Some(true));
        assert_eq!(parse_verdict("## final verdict: legitimate transaction"), Some(false));
        assert_eq!(parse_verdict("- Final verdict - fraud"), Some(true));
    }

    #[test]
    fn test_negated_fraud_is_legitimate() {
        assert_eq!(parse_verdict("Final Verdict: not fraud"), Some(false));
        assert_eq!(parse_verdict("Final Verdict: Non-Fraud"), Some(false));
    }

    #[test]
    fn test_whole_word_judgments() {
        let cases = [
            ("Final Verdict: ILLEGITIMATE", Some(true)),
            ("Final Verdict: not legitimate", Some(true)),
            ("Final Verdict: FRAUD, not a legitimate purchase", Some(true)),
            ("Final Verdict: not fraudulent", Some(false)),
            ("Final Verdict: no fraud detected", Some(false)),
            ("Final Verdict: legitimate, not fraud", Some(false)),
            ("Final Verdict: nonfraud", Some(false)),
            ("Final Verdict: fraudster", None),
        ];
        for (reply, expected) in cases {
            assert_eq!(parse_verdict(reply), expected, "{}", reply);
        }
    }

    #[test]
    fn test_conflicting_judgment_is_unparseable() {
        assert_eq!(parse_verdict("Final Verdict: legitimate or fraud"), None);
        assert_eq!(parse_verdict("Final Verdict: illegitimate but legitimate"), None);
    }

    #[test]
    fn test_last_verdict_line_wins() {
        let reply = "Final Verdict: FRAUD (draft)\nOn reflection...\nFinal Verdict: LEGITIMATE";
        assert_eq!(parse_verdict(reply), Some(false));
    }

    #[test]
    fn test_fraud_mentioned_outside_verdict_line_is_ignored() {
        assert_eq!(parse_verdict("This looks like fraud to me."), None);
        assert_eq!(parse_verdict("Fraud patterns matched.\nFinal Verdict: unsure"), None);
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(parse_verdict(""), None);
    }
}
