//! Borderline Prompt Construction

use pattern_matcher::MatchedPattern;
use risk_scorer::RiskAssessment;
use std::fmt::Write;
use transaction::Transaction;

/// Matched patterns, most relevant first.
///
/// Higher risk levels come first; ties keep table order.
pub fn order_by_relevance(patterns: &[MatchedPattern]) -> Vec<&MatchedPattern> {
    let mut ordered: Vec<&MatchedPattern> = patterns.iter().collect();
    ordered.sort_by(|a, b| b.rule.risk_level.cmp(&a.rule.risk_level));
    ordered
}

/// Build the analyst prompt for a borderline transaction.
///
/// The model is told to weigh the first listed patterns most and to finish
/// with a single `Final Verdict:` line.
pub fn borderline_prompt(
    transaction: &Transaction,
    assessment: &RiskAssessment,
    patterns: &[MatchedPattern],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "**Role**: You are a senior fraud analyst at a major bank. The fraud model is \
         unsure about this transaction. Analyze it carefully.\n\n",
    );

    prompt.push_str("**Instructions**:\n");
    prompt.push_str("1. Identify the key transaction features (e.g., V2=3.5).\n");
    prompt.push_str(
        "2. Compare them against these fraud patterns, listed most relevant first. \
         Give the first patterns the most weight:\n",
    );
    let ordered = order_by_relevance(patterns);
    if ordered.is_empty() {
        prompt.push_str("   - No known fraud pattern matched this transaction\n");
    }
    for pattern in ordered {
        let _ = writeln!(
            prompt,
            "   - [{} risk, {}] {} (observed {:.2})",
            pattern.rule.risk_level,
            pattern.rule.fraud_type,
            pattern.summary(),
            pattern.value
        );
    }
    prompt.push_str("3. Explain why each pattern does or does not apply.\n");
    prompt.push_str("4. Qualify your confidence as low, medium or high risk.\n");
    prompt.push_str("5. Decide whether the transaction is fraudulent or legitimate.\n\n");

    prompt.push_str("**Transaction**:\n");
    if let Some(id) = transaction.id() {
        let _ = writeln!(prompt, "- id: {}", id);
    }
    for (name, value) in transaction.fields() {
        let _ = writeln!(prompt, "- {}: {}", name, value);
    }
    prompt.push('\n');

    let _ = writeln!(
        prompt,
        "**Model Prediction**: fraud probability {:.2}% (borderline)\n",
        assessment.probability * 100.0
    );

    prompt.push_str("**Examples**:\n");
    prompt.push_str(
        "- Good analysis: \"While V2 exceeds 3.0 (pattern: high-velocity fraud), the lack of \
         corroborating evidence in V4 and V17 suggests this might be a false positive.\"\n",
    );
    prompt.push_str("- Bad analysis: \"It's fraud because the model said so.\"\n\n");

    prompt.push_str("**Answer Format**:\n");
    prompt.push_str(
        "Finish with exactly one line, either `Final Verdict: FRAUD` or \
         `Final Verdict: LEGITIMATE`.\n\n",
    );
    prompt.push_str("**Your Analysis**:\n");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_matcher::{Condition, PatternRule, RiskLevel};
    use std::sync::Arc;

    fn pattern(fraud_type: &str, level: RiskLevel, value: f64) -> MatchedPattern {
        MatchedPattern {
            rule: Arc::new(PatternRule::new(
                fraud_type,
                "V2",
                Condition::greater_than(1.0),
                level,
                format!("{} description", fraud_type),
            )),
            value,
        }
    }

    fn borderline(probability: f64) -> RiskAssessment {
        RiskAssessment {
            probability,
            confidence: probability,
            is_fraud: None,
            is_borderline: true,
        }
    }

    #[test]
    fn test_order_by_relevance_is_stable() {
        let patterns = vec![
            pattern("a", RiskLevel::Low, 2.0),
            pattern("b", RiskLevel::High, 2.0),
            pattern("c", RiskLevel::Low, 2.0),
            pattern("d", RiskLevel::High, 2.0),
            pattern("e", RiskLevel::Critical, 2.0),
        ];
        let order: Vec<&str> = order_by_relevance(&patterns)
            .iter()
            .map(|p| p.rule.fraud_type.as_str())
            .collect();
        assert_eq!(order, vec!["e", "b", "d", "a", "c"]);
    }

    #[test]
    fn test_prompt_contents() {
        let tx = Transaction::from_fields([("Amount", 20.0), ("V2", 3.6)]).with_id("tx-7");
        let patterns = vec![
            pattern("Micro", RiskLevel::Low, 3.6),
            pattern("Velocity", RiskLevel::High, 3.6),
        ];

        let prompt = borderline_prompt(&tx, &borderline(0.45), &patterns);

        assert!(prompt.contains("senior fraud analyst"));
        assert!(prompt.contains("fraud probability 45.00%"));
        assert!(prompt.contains("- id: tx-7"));
        assert!(prompt.contains("- Amount: 20"));
        assert!(prompt.contains("Final Verdict: FRAUD"));
        let velocity = prompt.find("Velocity").unwrap();
        let micro = prompt.find("Micro").unwrap();
        assert!(velocity < micro);
    }

    #[test]
    fn test_prompt_without_patterns() {
        let tx = Transaction::from_fields([("Amount", 20.0)]);
        let prompt = borderline_prompt(&tx, &borderline(0.5), &[]);
        assert!(prompt.contains("No known fraud pattern matched"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let tx = Transaction::from_fields([("Amount", 20.0), ("V2", 3.6)]);
        let patterns = vec![pattern("Velocity", RiskLevel::High, 3.6)];
        assert_eq!(
            borderline_prompt(&tx, &borderline(0.4), &patterns),
            borderline_prompt(&tx, &borderline(0.4), &patterns)
        );
    }
}
