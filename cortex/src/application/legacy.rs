// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Built-in seed approaches.
//!
//! Three hand-written approaches that give the catalog something to match
//! before any pattern has been discovered: comprehensive research, a
//! step-by-step tutorial and a short summary.

use hybrid_swarm_core::WeightMap;

use crate::domain::{
    ApproachPattern, CodeStyle, DepthLevel, ExampleDensity, ExplanationStyle, PatternSignature,
    StructureType, StyleCharacteristics, Voice,
};

pub const LEGACY_COMPREHENSIVE_ID: &str = "legacy_approach_A_comprehensive";
pub const LEGACY_TUTORIAL_ID: &str = "legacy_approach_B_tutorial";
pub const LEGACY_SUMMARY_ID: &str = "legacy_approach_C_summary";

fn weights(pairs: &[(&str, f64)]) -> WeightMap {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn seed(
    id: &str,
    name: &str,
    signature: PatternSignature,
    style: StyleCharacteristics,
    tags: &[&str],
) -> ApproachPattern {
    let mut approach = ApproachPattern::new(id, name, signature, style);
    approach.tags = strings(tags);
    approach
}

pub fn legacy_approaches() -> Vec<ApproachPattern> {
    vec![comprehensive_research(), step_by_step_tutorial(), summary_key_points()]
}

fn comprehensive_research() -> ApproachPattern {
    seed(
        LEGACY_COMPREHENSIVE_ID,
        "Comprehensive Research",
        PatternSignature {
            domain_weights: weights(&[
                ("research", 0.9),
                ("writing", 0.6),
                ("comparison", 0.7),
                ("review", 0.5),
            ]),
            complexity_min: 0.5,
            complexity_max: 1.0,
            keyword_patterns: strings(&["research", "investigate", "analyze", "compare"]),
            keyword_weights: weights(&[
                ("research", 0.9),
                ("investigate", 0.8),
                ("analyze", 0.8),
                ("compare", 0.6),
            ]),
            output_types: strings(&["report", "research", "analysis", "comparison"]),
            requires_code: false,
            requires_examples: true,
            requires_theory: true,
        },
        StyleCharacteristics {
            structure_type: StructureType::Hierarchical,
            section_count: (4, 8),
            tone: "formal".into(),
            voice: Voice::ThirdPerson,
            depth_level: DepthLevel::Comprehensive,
            explanation_style: ExplanationStyle::Conceptual,
            example_density: ExampleDensity::Medium,
            code_style: None,
            use_headers: true,
            use_bullets: true,
            use_numbered_lists: false,
            use_tables: true,
            include_summary: true,
            include_tldr: false,
            include_prerequisites: false,
            include_next_steps: true,
        },
        &["research", "formal", "hierarchical", "theory", "comprehensive"],
    )
}

fn step_by_step_tutorial() -> ApproachPattern {
    seed(
        LEGACY_TUTORIAL_ID,
        "Step-by-Step Tutorial",
        PatternSignature {
            domain_weights: weights(&[("writing", 0.9), ("coding", 0.7), ("research", 0.3)]),
            complexity_min: 0.3,
            complexity_max: 0.8,
            keyword_patterns: strings(&["tutorial", "guide", "how to", "learn"]),
            keyword_weights: weights(&[
                ("tutorial", 0.9),
                ("guide", 0.8),
                ("how to", 0.9),
                ("learn", 0.6),
            ]),
            output_types: strings(&["tutorial", "guide", "code"]),
            requires_code: true,
            requires_examples: true,
            requires_theory: false,
        },
        StyleCharacteristics {
            structure_type: StructureType::SequentialSteps,
            section_count: (3, 7),
            tone: "educational".into(),
            voice: Voice::SecondPerson,
            depth_level: DepthLevel::Moderate,
            explanation_style: ExplanationStyle::Practical,
            example_density: ExampleDensity::High,
            code_style: Some(CodeStyle::Annotated),
            use_headers: true,
            use_bullets: false,
            use_numbered_lists: true,
            use_tables: false,
            include_summary: true,
            include_tldr: false,
            include_prerequisites: true,
            include_next_steps: true,
        },
        &["writing", "coding", "educational", "sequential_steps", "code", "examples"],
    )
}

fn summary_key_points() -> ApproachPattern {
    seed(
        LEGACY_SUMMARY_ID,
        "Summary & Key Points",
        PatternSignature {
            domain_weights: weights(&[
                ("writing", 0.7),
                ("research", 0.6),
                ("review", 0.8),
                ("comparison", 0.6),
            ]),
            complexity_min: 0.2,
            complexity_max: 0.6,
            keyword_patterns: strings(&["summary", "overview", "key points", "tldr"]),
            keyword_weights: weights(&[
                ("summary", 0.9),
                ("overview", 0.8),
                ("key points", 0.8),
                ("tldr", 0.7),
            ]),
            output_types: strings(&["summary", "list", "explanation"]),
            requires_code: false,
            requires_examples: false,
            requires_theory: false,
        },
        StyleCharacteristics {
            structure_type: StructureType::Bulleted,
            section_count: (2, 4),
            tone: "casual".into(),
            voice: Voice::SecondPerson,
            depth_level: DepthLevel::Concise,
            explanation_style: ExplanationStyle::Mixed,
            example_density: ExampleDensity::Low,
            code_style: None,
            use_headers: true,
            use_bullets: true,
            use_numbered_lists: false,
            use_tables: false,
            include_summary: true,
            include_tldr: true,
            include_prerequisites: false,
            include_next_steps: false,
        },
        &["review", "writing", "casual", "bulleted", "concise"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_approaches_are_valid_and_distinct() {
        let seeds = legacy_approaches();
        assert_eq!(seeds.len(), 3);
        for approach in &seeds {
            approach.validate().unwrap();
            assert!(approach.is_active());
            assert_eq!(approach.generation, 0);
        }
        assert_eq!(seeds[1].style.structure_type, StructureType::SequentialSteps);
        assert!(seeds[0].signature.similarity(&seeds[1].signature) < 0.85);
    }
}
