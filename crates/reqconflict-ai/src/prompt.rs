//! Prompt rendering for conflict classification requests.

use std::fmt::Write;

use reqconflict_core::{CategoryWeights, ConflictCategory, NO_CONFLICT_REASON};

/// What the model is asked to evaluate.
#[derive(Debug, Clone, Copy)]
pub enum PromptSubject<'a> {
    /// A single requirement, checked for internal conflicts.
    Single(&'a str),
    /// Two requirements, checked against each other.
    Pair(&'a str, &'a str),
}

const PREAMBLE: &str = "\
You are an expert in requirements engineering and conflict analysis for vehicle and \
system specifications.";

/// Render a classification prompt.
///
/// Pure function of its inputs: identical arguments always yield identical text,
/// which is what lets the inference cache key on the prompt.
pub fn build_prompt(subject: PromptSubject<'_>, weights: Option<&CategoryWeights>) -> String {
    let mut prompt = String::with_capacity(2048);
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n");

    match subject {
        PromptSubject::Single(req) => {
            prompt.push_str(
                "Determine whether the following requirement contains a conflict within itself.\n\n",
            );
            let _ = writeln!(prompt, "Requirement: {req}");
        }
        PromptSubject::Pair(a, b) => {
            prompt.push_str("Determine whether the following two requirements conflict.\n\n");
            let _ = writeln!(prompt, "Requirement 1: {a}");
            let _ = writeln!(prompt, "Requirement 2: {b}");
        }
    }

    prompt.push_str("\nClassify strictly against these conflict categories:\n");
    for category in ConflictCategory::named() {
        let _ = writeln!(prompt, "- {}: {}", category.label(), category.description());
    }
    let _ = writeln!(
        prompt,
        "- {}: {}",
        ConflictCategory::Other.label(),
        ConflictCategory::Other.description()
    );

    prompt.push_str(
        "\nRespond with exactly one line in one of these formats and nothing else:\n\
         Conflict_Type: <category>||Reason: <one-line explanation>\n\
         <category>: <one-line explanation>\n",
    );
    let _ = write!(
        prompt,
        "\nIf there is no conflict, respond with:\nConflict_Type: {}||Reason: {}\n",
        ConflictCategory::NoConflict.label(),
        NO_CONFLICT_REASON
    );

    if let Some(weights) = weights {
        prompt.push_str(
            "\nCategory priority weights (consider higher-weighted categories first when \
             several could apply):\n",
        );
        for (category, weight) in weights.ranked() {
            let _ = writeln!(prompt, "- {}: {weight:.2}", category.label());
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_prompt_embeds_both_requirements() {
        let p = build_prompt(PromptSubject::Pair("Top speed 120 km/h", "Cost under $1,500"), None);
        assert!(p.contains("Requirement 1: Top speed 120 km/h"));
        assert!(p.contains("Requirement 2: Cost under $1,500"));
        assert!(p.starts_with("You are an expert in requirements engineering"));
    }

    #[test]
    fn single_prompt_embeds_requirement() {
        let p = build_prompt(PromptSubject::Single("Must be light and armoured"), None);
        assert!(p.contains("Requirement: Must be light and armoured"));
        assert!(!p.contains("Requirement 2:"));
    }

    #[test]
    fn lists_every_named_category_and_both_formats() {
        let p = build_prompt(PromptSubject::Pair("a", "b"), None);
        for category in ConflictCategory::named() {
            assert!(p.contains(&format!("- {}:", category.label())), "{category}");
        }
        assert!(p.contains("Conflict_Type: <category>||Reason: <one-line explanation>"));
        assert!(p.contains("<category>: <one-line explanation>"));
        assert!(p.contains("Conflict_Type: No Conflict||Reason: Requirements are compatible"));
    }

    #[test]
    fn no_weight_hint_without_weights() {
        let p = build_prompt(PromptSubject::Pair("a", "b"), None);
        assert!(!p.contains("priority weights"));
    }

    #[test]
    fn weight_hint_sorted_descending() {
        let mut w = CategoryWeights::new();
        w.bump(ConflictCategory::Safety, 0.5);
        w.bump(ConflictCategory::Cost, 0.2);
        let p = build_prompt(PromptSubject::Pair("a", "b"), Some(&w));

        let hint = &p[p.find("priority weights").unwrap()..];
        let safety = hint.find("- Safety Conflict: 1.50").unwrap();
        let cost = hint.find("- Cost Conflict: 1.20").unwrap();
        let aesthetic = hint.find("- Aesthetic Conflict: 1.00").unwrap();
        assert!(safety < cost && cost < aesthetic);
        assert_eq!(hint.lines().filter(|l| l.starts_with("- ")).count(), ConflictCategory::ALL.len());
    }

    #[test]
    fn deterministic() {
        let w = CategoryWeights::new();
        let a = build_prompt(PromptSubject::Pair("x", "y"), Some(&w));
        let b = build_prompt(PromptSubject::Pair("x", "y"), Some(&w));
        assert_eq!(a, b);
    }
}
