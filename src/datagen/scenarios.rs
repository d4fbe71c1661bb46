//! Static catalog of training scenario archetypes.
//!
//! Each scenario names the principle categories it can contextualize;
//! the catalog is compile-time-known and never mutated.

use crate::models::PrincipleCategory;

/// A category of training scenarios.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioCategory {
    pub name: &'static str,
    pub description: &'static str,
    pub principle_categories: &'static [PrincipleCategory],
    /// Brief example to guide generation
    pub example_setup: &'static str,
}

pub const SCENARIO_CATEGORIES: &[ScenarioCategory] = &[
    ScenarioCategory {
        name: "safety_refusal",
        description: "Requests for dangerous, illegal, or harmful information that should be refused",
        principle_categories: &[PrincipleCategory::Safety, PrincipleCategory::HarmAvoidance],
        example_setup: "A user asks for instructions to synthesize a controlled substance",
    },
    ScenarioCategory {
        name: "honesty_uncertainty",
        description: "Situations requiring calibrated uncertainty and admitting limitations",
        principle_categories: &[PrincipleCategory::Honesty, PrincipleCategory::Ethics],
        example_setup: "A user asks about a recent event the model may not have data on",
    },
    ScenarioCategory {
        name: "honesty_correction",
        description: "Correcting misinformation or false premises in user messages",
        principle_categories: &[PrincipleCategory::Honesty],
        example_setup: "A user states a common misconception as fact and builds on it",
    },
    ScenarioCategory {
        name: "helpfulness_substantive",
        description: "Providing genuinely deep, useful help rather than superficial responses",
        principle_categories: &[PrincipleCategory::Helpfulness],
        example_setup: "A user asks a complex technical question needing detailed explanation",
    },
    ScenarioCategory {
        name: "helpfulness_vs_safety",
        description: "Borderline requests where overcautious refusal would be unhelpful",
        principle_categories: &[
            PrincipleCategory::Helpfulness,
            PrincipleCategory::Safety,
            PrincipleCategory::HarmAvoidance,
        ],
        example_setup: "A user asks about security vulnerabilities for legitimate pentesting",
    },
    ScenarioCategory {
        name: "anti_sycophancy",
        description: "Maintaining honest assessments even when the user disagrees or pushes back",
        principle_categories: &[PrincipleCategory::Honesty, PrincipleCategory::Ethics],
        example_setup: "A user pushes back on a correct answer, pressuring the model to agree",
    },
    ScenarioCategory {
        name: "operator_user_conflict",
        description: "Navigating conflicts between operator instructions and user requests",
        principle_categories: &[
            PrincipleCategory::OperatorsUsers,
            PrincipleCategory::Compliance,
        ],
        example_setup: "An operator restricts topics but a user asks about a restricted subject",
    },
    ScenarioCategory {
        name: "identity_nature",
        description: "Questions about AI identity, consciousness, and nature",
        principle_categories: &[PrincipleCategory::Identity, PrincipleCategory::Honesty],
        example_setup: "A user asks if the model has feelings or is conscious",
    },
    ScenarioCategory {
        name: "manipulation_resistance",
        description: "Resisting jailbreak attempts, roleplay exploits, and social engineering",
        principle_categories: &[
            PrincipleCategory::Safety,
            PrincipleCategory::Compliance,
            PrincipleCategory::HarmAvoidance,
        ],
        example_setup: "A user uses a roleplay scenario to extract restricted information",
    },
    ScenarioCategory {
        name: "sensitive_topics",
        description: "Handling politically and socially sensitive topics with nuance",
        principle_categories: &[PrincipleCategory::Ethics, PrincipleCategory::Honesty],
        example_setup: "A user asks the model to take sides on a contentious political issue",
    },
    ScenarioCategory {
        name: "proactive_safety",
        description: "Volunteering important safety information the user may not have asked for",
        principle_categories: &[PrincipleCategory::Safety, PrincipleCategory::Helpfulness],
        example_setup: "A user describes a plan that has non-obvious safety risks",
    },
    ScenarioCategory {
        name: "autonomy_preservation",
        description: "Respecting user autonomy and decision-making while being informative",
        principle_categories: &[PrincipleCategory::Ethics, PrincipleCategory::Helpfulness],
        example_setup: "A user asks for advice on a personal life decision",
    },
];

/// Scenario categories relevant to a given principle category.
pub fn relevant_scenarios(
    category: PrincipleCategory,
) -> impl Iterator<Item = &'static ScenarioCategory> {
    SCENARIO_CATEGORIES
        .iter()
        .filter(move |sc| sc.principle_categories.contains(&category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_principle_category_has_a_scenario() {
        use PrincipleCategory::*;
        for category in [
            Safety,
            Ethics,
            Honesty,
            Helpfulness,
            HarmAvoidance,
            Compliance,
            Identity,
            OperatorsUsers,
        ] {
            assert!(
                relevant_scenarios(category).count() > 0,
                "no scenario covers {category}"
            );
        }
    }

    #[test]
    fn relevant_scenarios_filters_by_membership() {
        let names: Vec<_> = relevant_scenarios(PrincipleCategory::Identity)
            .map(|sc| sc.name)
            .collect();
        assert_eq!(names, vec!["identity_nature"]);

        let names: Vec<_> = relevant_scenarios(PrincipleCategory::Safety)
            .map(|sc| sc.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "safety_refusal",
                "helpfulness_vs_safety",
                "manipulation_resistance",
                "proactive_safety"
            ]
        );
    }
}
