use serde::Serialize;

use crate::priority::Priority;

/// Category and priority proposed for a complaint text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub category: &'static str,
    pub priority: Priority,
}

// Checked in order, first hit wins
const RULES: &[(&[&str], &str, Priority)] = &[
    (&["water", "pipe", "leak"], "Plumbing", Priority::High),
    (&["light", "fan", "electric"], "Electrical", Priority::Medium),
    (&["theft", "security"], "Security", Priority::High),
    (&["garbage", "clean"], "Cleaning", Priority::Low),
];

/// Keyword-based category/priority suggestion for the submission form
pub fn suggest_category_and_priority(text: &str) -> Suggestion {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(_, category, priority)| Suggestion {
            category: *category,
            priority: *priority,
        })
        .unwrap_or(Suggestion {
            category: "General",
            priority: Priority::Low,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plumbing_keywords() {
        let suggestion = suggest_category_and_priority("Pipe burst near the gate");
        assert_eq!(suggestion.category, "Plumbing");
        assert_eq!(suggestion.priority, Priority::High);
    }

    #[test]
    fn test_electrical_keywords() {
        let suggestion = suggest_category_and_priority("Ceiling FAN stopped");
        assert_eq!(suggestion.category, "Electrical");
        assert_eq!(suggestion.priority, Priority::Medium);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // mentions both water and security, plumbing is checked first
        let suggestion = suggest_category_and_priority("security guard reported a water leak");
        assert_eq!(suggestion.category, "Plumbing");
    }

    #[test]
    fn test_security_and_cleaning() {
        assert_eq!(suggest_category_and_priority("bike theft").category, "Security");
        let cleaning = suggest_category_and_priority("garbage not collected");
        assert_eq!(cleaning.category, "Cleaning");
        assert_eq!(cleaning.priority, Priority::Low);
    }

    #[test]
    fn test_fallback_is_general_low() {
        let suggestion = suggest_category_and_priority("noisy neighbours");
        assert_eq!(
            suggestion,
            Suggestion {
                category: "General",
                priority: Priority::Low
            }
        );
    }
}
