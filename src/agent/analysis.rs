//! Typed results of the agent calls, and the reply envelopes they arrive in.

use serde::{Deserialize, Serialize};

use crate::core::article::{
    Difficulty, Domain, KeyParagraph, LanguageBreakdown, ReadingMap, UnderstandingQuestion,
};
use crate::core::lenient;
use crate::core::output::Feedback;

/// Domain-Curator classification of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAnalysis {
    /// Domain name as the model wrote it.
    pub domain: String,
    /// Difficulty as the model wrote it.
    pub difficulty: String,
    /// Model's word count estimate.
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub word_count: Option<u32>,
    /// Main topics.
    #[serde(default)]
    pub core_topics: Vec<String>,
    /// Share of the article worth reading closely, in percent.
    #[serde(default, deserialize_with = "lenient::opt_f32")]
    pub recommended_deep_dive_ratio: Option<f32>,
    /// Whether the article contains explicit reasoning.
    #[serde(default, deserialize_with = "lenient::bool_or_yes_no")]
    pub key_reasoning: bool,
}

impl DomainAnalysis {
    /// The classified domain, if it names a known one.
    #[must_use]
    pub fn parsed_domain(&self) -> Option<Domain> {
        Domain::parse(&self.domain)
    }

    /// The classified difficulty, if it names a known one.
    #[must_use]
    pub fn parsed_difficulty(&self) -> Option<Difficulty> {
        Difficulty::parse(&self.difficulty)
    }
}

/// Content-quality verdict. Not part of the processing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentValidation {
    /// Whether the article fits the course.
    #[serde(rename = "isApproved", default, deserialize_with = "lenient::bool_or_yes_no")]
    pub approved: bool,
    /// Reasons behind the verdict.
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Improvement advice, if any.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggestions: Option<String>,
    /// Difficulty the reviewer would assign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_difficulty: Option<String>,
}

/// A learner-facing explanation of one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainedExpression {
    /// The expression.
    pub expression: String,
    /// Plain-English meaning.
    #[serde(default)]
    pub simple_explanation: String,
    /// Situations that call for it.
    #[serde(default)]
    pub when_to_use: String,
    /// Typical learner errors.
    #[serde(default)]
    pub common_mistakes: Vec<String>,
    /// Words it usually combines with.
    #[serde(default, alias = "collocation")]
    pub collocations: Vec<String>,
}

/// Both Argument-Mapper results for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentMap {
    /// The reading map from the first call.
    pub reading_map: ReadingMap,
    /// The key paragraphs from the second call.
    pub key_paragraphs: Vec<KeyParagraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeyParagraphsReply {
    #[serde(default)]
    pub key_paragraphs: Vec<KeyParagraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LanguageBreakdownReply {
    #[serde(default)]
    pub language_breakdown: Vec<LanguageBreakdown>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExplainedExpressionsReply {
    #[serde(default)]
    pub explained_expressions: Vec<ExplainedExpression>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackReply {
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsReply {
    #[serde(default)]
    pub questions: Vec<UnderstandingQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_analysis_is_lenient() {
        let analysis: DomainAnalysis = serde_json::from_value(json!({
            "domain": "ai",
            "difficulty": "Intermediate",
            "wordCount": "about 820",
            "coreTopics": ["diagnostics"],
            "recommendedDeepDiveRatio": "35%",
            "keyReasoning": "yes"
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(analysis.parsed_domain(), Some(Domain::Ai));
        assert_eq!(analysis.parsed_difficulty(), Some(Difficulty::Intermediate));
        assert_eq!(analysis.word_count, Some(820));
        assert!(analysis.key_reasoning);
    }

    #[test]
    fn test_unknown_classification_is_none() {
        let analysis: DomainAnalysis =
            serde_json::from_value(json!({"domain": "biology", "difficulty": "expert"}))
                .unwrap_or_else(|_| unreachable!());
        assert_eq!(analysis.parsed_domain(), None);
        assert_eq!(analysis.parsed_difficulty(), None);
        assert!(analysis.core_topics.is_empty());
    }

    #[test]
    fn test_content_validation_wire_names() {
        let validation: ContentValidation = serde_json::from_value(json!({
            "isApproved": true,
            "reasons": ["clear thesis"],
            "suggestions": ["add a source", "trim the intro"],
            "recommendedDifficulty": "advanced"
        }))
        .unwrap_or_else(|_| unreachable!());
        assert!(validation.approved);
        assert_eq!(
            validation.suggestions.as_deref(),
            Some("add a source; trim the intro")
        );

        let out = serde_json::to_value(&validation).unwrap_or_default();
        assert_eq!(out["isApproved"], true);
    }

    #[test]
    fn test_explained_expression_accepts_singular_collocation() {
        let e: ExplainedExpression = serde_json::from_value(json!({
            "expression": "in turn",
            "simpleExplanation": "as a result",
            "collocation": ["which in turn"]
        }))
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(e.collocations, vec!["which in turn"]);
    }
}
