//! Article aggregate and the AI-derived reading aids attached to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GroupCount;

/// Professional domain an article belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Artificial intelligence.
    #[serde(rename = "AI")]
    Ai,
    /// Finance.
    #[serde(rename = "finance")]
    Finance,
    /// Economics.
    #[serde(rename = "economics")]
    Economics,
    /// Technology.
    #[serde(rename = "technology")]
    Technology,
    /// Sociology.
    #[serde(rename = "sociology")]
    Sociology,
}

impl Domain {
    /// All domains, in display order.
    pub const ALL: [Self; 5] = [
        Self::Ai,
        Self::Finance,
        Self::Economics,
        Self::Technology,
        Self::Sociology,
    ];

    /// Parses a domain name case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Finance => "finance",
            Self::Economics => "economics",
            Self::Technology => "technology",
            Self::Sociology => "sociology",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading difficulty for A2-B2 learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Entry level.
    Beginner,
    /// Middle level.
    Intermediate,
    /// Upper level.
    Advanced,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// Parses a difficulty case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured summary of an article's argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingMap {
    /// The question the author addresses.
    pub core_question: String,
    /// The author's thesis.
    pub main_conclusion: String,
    /// Ordered argument steps (four to six expected).
    #[serde(default)]
    pub argument_structure: Vec<String>,
}

/// Function a key paragraph serves in the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphRole {
    /// Sets up concepts.
    Definition,
    /// Builds the case.
    Argument,
    /// Addresses alternatives.
    Refutation,
}

/// A paragraph selected for deep reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyParagraph {
    /// Position of the paragraph in [`Article::content`].
    #[serde(deserialize_with = "crate::core::lenient::u32_number")]
    pub paragraph_index: u32,
    /// Verbatim paragraph text.
    pub text: String,
    /// Role in the argument.
    #[serde(deserialize_with = "crate::core::lenient::lowercase_enum")]
    pub role: ParagraphRole,
    /// The one or two most important sentences, verbatim.
    #[serde(default)]
    pub key_sentences: Vec<String>,
    /// Why the model picked this paragraph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Kind of reasoning language an expression belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionCategory {
    /// Making claims and stating positions.
    Claim,
    /// Presenting evidence.
    Evidence,
    /// Cause and effect.
    Causality,
    /// Contrast and concession.
    Contrast,
    /// Hedging.
    Uncertainty,
    /// Signposting.
    Transition,
}

/// One reasoning expression lifted from the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageBreakdown {
    /// Exact expression from the text.
    pub expression: String,
    /// How it functions in the reasoning.
    pub explanation: String,
    /// Whether it is useful outside this article.
    #[serde(default, deserialize_with = "crate::core::lenient::bool_or_yes_no")]
    pub transferable: bool,
    /// Reasoning category.
    #[serde(deserialize_with = "crate::core::lenient::lowercase_enum")]
    pub category: ExpressionCategory,
    /// Alternative phrasings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Open-ended comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderstandingQuestion {
    /// The question.
    pub question: String,
    /// What the question checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// A model answer.
    #[serde(default)]
    pub sample_answer: String,
}

/// The four AI-derived fields, produced together by one pipeline run.
///
/// Stored as a single value so an article either has all of them or
/// none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContent {
    /// Argument summary.
    pub reading_map: ReadingMap,
    /// Three to five selected paragraphs.
    pub key_paragraphs: Vec<KeyParagraph>,
    /// Five to eight reasoning expressions.
    pub language_breakdown: Vec<LanguageBreakdown>,
    /// Two or three comprehension questions.
    pub understanding_questions: Vec<UnderstandingQuestion>,
}

/// Provenance information for an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    /// Original source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A reading article.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier.
    pub id: String,
    /// Title (unique across articles).
    pub title: String,
    /// Professional domain.
    pub domain: Domain,
    /// Reading difficulty.
    pub difficulty: Difficulty,
    /// Full text, paragraphs separated by blank lines.
    pub content: String,
    /// Word count as supplied on creation.
    pub word_count: u32,
    /// AI reading aids, absent until the pipeline has run successfully.
    #[serde(flatten)]
    pub ai: Option<AiContent>,
    /// Provenance.
    pub metadata: ArticleMetadata,
    /// Planned publication date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Actual publication date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Splits the content into paragraphs (blank-line separated, trimmed,
    /// empty paragraphs dropped).
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Returns `true` if the article is visible to readers at `now`.
    #[must_use]
    pub fn is_released(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_for.is_none_or(|at| at <= now)
    }

    /// Returns the reading map, if the pipeline has run.
    #[must_use]
    pub fn reading_map(&self) -> Option<&ReadingMap> {
        self.ai.as_ref().map(|ai| &ai.reading_map)
    }
}

/// Fields supplied when creating an article.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    /// Title.
    pub title: String,
    /// Domain.
    pub domain: Domain,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Full text.
    pub content: String,
    /// Word count.
    pub word_count: u32,
    /// Source URL.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Author.
    #[serde(default)]
    pub author: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Planned publication date.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Partial update of an article. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New domain.
    #[serde(default)]
    pub domain: Option<Domain>,
    /// New difficulty.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// New content.
    #[serde(default)]
    pub content: Option<String>,
    /// New word count.
    #[serde(default)]
    pub word_count: Option<u32>,
    /// New scheduled date.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Explicit publication date.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Listing filters for articles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    /// Items to skip.
    #[serde(default)]
    pub offset: u32,
    /// Items to return.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Restrict to one domain.
    #[serde(default)]
    pub domain: Option<Domain>,
    /// Restrict to one difficulty.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Substring search over title and content.
    #[serde(default)]
    pub search: Option<String>,
}

const fn default_limit() -> u32 {
    10
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: default_limit(),
            domain: None,
            difficulty: None,
            search: None,
        }
    }
}

/// Article counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStatistics {
    /// All articles.
    pub total_articles: u64,
    /// Articles with a publication date.
    pub published_articles: u64,
    /// Unpublished articles scheduled in the future.
    pub scheduled_articles: u64,
    /// Counts per domain, largest first.
    pub articles_by_domain: Vec<GroupCount>,
    /// Counts per difficulty, largest first.
    pub articles_by_difficulty: Vec<GroupCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_is_case_insensitive() {
        assert_eq!(Domain::parse("ai"), Some(Domain::Ai));
        assert_eq!(Domain::parse(" Finance "), Some(Domain::Finance));
        assert_eq!(Domain::parse("biology"), None);
    }

    #[test]
    fn test_domain_serializes_canonical_names() {
        let json = serde_json::to_string(&Domain::Ai).unwrap_or_default();
        assert_eq!(json, "\"AI\"");
        let json = serde_json::to_string(&Domain::Sociology).unwrap_or_default();
        assert_eq!(json, "\"sociology\"");
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("ADVANCED"), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::parse("expert"), None);
    }

    #[test]
    fn test_key_paragraph_deserialization() {
        let json = r#"{
            "paragraphIndex": 2,
            "text": "Critics argue otherwise.",
            "role": "refutation",
            "keySentences": ["Critics argue otherwise."],
            "reasoning": "addresses the counter-argument"
        }"#;
        let para: KeyParagraph = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(para.paragraph_index, 2);
        assert_eq!(para.role, ParagraphRole::Refutation);
        assert_eq!(para.key_sentences.len(), 1);
    }

    #[test]
    fn test_key_paragraph_tolerates_model_variants() {
        let json = r#"{
            "paragraphIndex": "2",
            "text": "It shortens queues.",
            "role": "Argument"
        }"#;
        let para: KeyParagraph = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(para.paragraph_index, 2);
        assert_eq!(para.role, ParagraphRole::Argument);
    }

    #[test]
    fn test_key_paragraph_rejects_unknown_role() {
        let json = r#"{"paragraphIndex": 0, "text": "t", "role": "anecdote"}"#;
        assert!(serde_json::from_str::<KeyParagraph>(json).is_err());
    }

    #[test]
    fn test_expression_category_any_case() {
        let json = r#"{"expression": "however", "explanation": "contrast", "category": "Contrast"}"#;
        let entry: LanguageBreakdown =
            serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(entry.category, ExpressionCategory::Contrast);
    }

    #[test]
    fn test_language_breakdown_accepts_yes_no() {
        let json = r#"{
            "expression": "leads to",
            "explanation": "marks a causal link",
            "transferable": "yes",
            "category": "causality"
        }"#;
        let entry: LanguageBreakdown =
            serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert!(entry.transferable);
        assert_eq!(entry.category, ExpressionCategory::Causality);
        assert!(entry.examples.is_empty());
    }

    #[test]
    fn test_article_query_defaults() {
        let query: ArticleQuery = serde_json::from_str("{}").unwrap_or_default();
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, 10);
        assert!(query.domain.is_none());
    }
}
