//! Prompt templates for the agents and the `{{name}}` renderer.
//!
//! Each agent call renders one user-message template. Templates are
//! compiled in and can be overridden file by file from a prompt directory.

use std::path::{Path, PathBuf};

/// Domain-Curator: classify an article.
pub const DOMAIN_ANALYZE_TEMPLATE: &str = r#"You curate professional English reading material and are classifying a new article.

Article:
{{article}}

Describe the article with this JSON object:

{
  "domain": "one of AI, finance, economics, technology, sociology",
  "difficulty": "beginner, intermediate or advanced, judged by vocabulary and how abstract the ideas are",
  "wordCount": "number of words in the article",
  "coreTopics": ["three to five main topics"],
  "recommendedDeepDiveRatio": "share of the article worth close reading, usually 30-40%",
  "keyReasoning": "yes or no: does the article build a real argument?"
}

Guidance:
- Readers are working professionals at roughly A2-B2 English level
- Weigh specialist terminology and the density of the argument when rating difficulty
- Return valid JSON only"#;

/// Domain-Curator: quality gate for candidate articles.
pub const DOMAIN_VALIDATE_TEMPLATE: &str = r#"You review candidate articles for a professional English reading course.

Article:
{{article}}

An article is suitable when it:
1. Belongs to a professional domain (AI, finance, economics, technology, sociology)
2. Develops an argument or a clear line of reasoning
3. Runs roughly 300-600 words
4. Explains and argues rather than just reporting news
5. Is within reach of A2-B2 readers

Answer with this JSON object:
{
  "isApproved": true or false,
  "reasons": ["why it was accepted or rejected"],
  "suggestions": "what would make it suitable, if rejected",
  "recommendedDifficulty": "beginner, intermediate or advanced"
}"#;

/// Argument-Mapper: build the reading map.
pub const ARGUMENT_EXTRACT_TEMPLATE: &str = r#"You map the argument of professional articles so readers see the shape of the reasoning before the details.

Article:
{{article}}

Produce a reading map as this JSON object:

{
  "coreQuestion": "the problem or question the author takes on, in one sentence",
  "mainConclusion": "the author's thesis, stated briefly",
  "argumentStructure": [
    "premise or background",
    "first line of support",
    "second line of support",
    "objections or limits the author deals with",
    "where the argument lands"
  ]
}

Guidance:
- argumentStructure has four to six steps in the order the author makes them
- Separate premises, support and conclusions, and say whether objections are handled
- Describe the logic, not the facts"#;

/// Argument-Mapper: choose the paragraphs worth close reading.
pub const ARGUMENT_KEY_PARAGRAPHS_TEMPLATE: &str = r#"You pick out the paragraphs of a professional article that carry its argument.

Article:
{{article}}

Reading map:
{{readingMap}}

Choose three to five paragraphs, about a third of the article. Favour paragraphs that define the central ideas, carry the main evidence, answer objections or draw the conclusion. Skip purely descriptive ones.

Return this JSON object:
{
  "keyParagraphs": [
    {
      "paragraphIndex": 0,
      "text": "the paragraph, copied exactly",
      "role": "definition, argument or refutation",
      "keySentences": ["the one or two sentences that matter most, copied exactly"],
      "reasoning": "why a reader should slow down here"
    }
  ]
}

Roles: "definition" introduces concepts, "argument" advances the case, "refutation" deals with other views. paragraphIndex counts paragraphs from zero."#;

/// Language-Reasoning: extract reasoning expressions.
pub const LANGUAGE_EXTRACT_TEMPLATE: &str = r#"You teach the English that professionals use to reason and argue.

From the passages below, pull out the expressions that do the reasoning work: stating a claim, bringing in evidence, linking cause and effect, contrasting or conceding, hedging, and moving the argument along.

Key paragraphs:
{{keyParagraphs}}

Full article for context:
{{article}}

Return this JSON object:
{
  "languageBreakdown": [
    {
      "expression": "the expression as it appears in the text",
      "explanation": "what job it does in the argument",
      "transferable": true or false,
      "category": "claim, evidence, causality, contrast, uncertainty or transition",
      "examples": ["one or two other ways to say it"]
    }
  ]
}

Guidance:
- Choose five to eight multi-word expressions rather than single words
- Connectors (therefore, however), stance verbs (indicates, suggests), hedges (may, appears to) and causal phrases (leads to, stems from) are all good candidates
- transferable means a learner could reuse it at work outside this topic
- No general vocabulary, grammar lessons or paragraph translations"#;

/// Language-Reasoning: explain expressions for learners.
pub const LANGUAGE_EXPLAIN_TEMPLATE: &str = r#"You help A2-B2 learners use professional reasoning language with confidence.

Expressions:
{{expressions}}

For each one give a plain explanation, the situations where professionals reach for it, typical mistakes, and words it usually appears with. Return this JSON object:
{
  "explainedExpressions": [
    {
      "expression": "the expression",
      "simpleExplanation": "how you would explain it to a colleague",
      "whenToUse": "workplace situations where it fits",
      "commonMistakes": ["a frequent error"],
      "collocation": ["a word that often goes with it"]
    }
  ]
}

Keep it short and practical."#;

/// Professional-Feedback: score a learner's written response.
pub const FEEDBACK_EVALUATE_TEMPLATE: &str = r#"You coach professionals on their written English and give constructive feedback.

Article:
{{article}}

Reading map:
{{readingMap}}

Task the learner was given:
{{prompt}}

Learner's response:
{{userOutput}}

Return this JSON object:
{
  "feedback": {
    "logicScore": 1-5,
    "toneScore": 1-5,
    "clarityScore": 1-5,
    "strengths": ["what worked, specifically"],
    "logicFeedback": "comments on the reasoning and structure",
    "toneFeedback": "comments on register and confidence",
    "suggestions": [
      {
        "original": "the phrase or passage to improve",
        "improvement": "a stronger version",
        "reason": "why it is stronger"
      }
    ],
    "overallAssessment": "an honest, encouraging summary"
  }
}

Scores: logic rates the reasoning and use of evidence, tone rates professional register, clarity rates how easily the point comes across.

Guidance:
- Pick the two or three changes that would help most and explain each one
- Name what the learner did well
- Pitch the advice at an A2-B2 writer"#;

/// Professional-Feedback: write comprehension questions.
pub const FEEDBACK_QUESTIONS_TEMPLATE: &str = r#"You write comprehension questions for professional articles.

Article:
{{article}}

Reading map:
{{readingMap}}

Write two or three open questions that check whether the reader followed the core argument, understood the key evidence, and can apply the ideas elsewhere.

Return this JSON object:
{
  "questions": [
    {
      "question": "an open question",
      "purpose": "what it checks",
      "sampleAnswer": "a concise model answer"
    }
  ]
}

Guidance:
- No multiple choice and no pure recall; several answers may be valid
- Test understanding of the reasoning, not vocabulary
- Each should take an A2-B2 reader two or three minutes"#;

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/daily-english/prompts";

const DOMAIN_ANALYZE_FILENAME: &str = "domain-analyze.md";
const DOMAIN_VALIDATE_FILENAME: &str = "domain-validate.md";
const ARGUMENT_EXTRACT_FILENAME: &str = "argument-extract.md";
const ARGUMENT_KEY_PARAGRAPHS_FILENAME: &str = "argument-key-paragraphs.md";
const LANGUAGE_EXTRACT_FILENAME: &str = "language-extract.md";
const LANGUAGE_EXPLAIN_FILENAME: &str = "language-explain.md";
const FEEDBACK_EVALUATE_FILENAME: &str = "feedback-evaluate.md";
const FEEDBACK_QUESTIONS_FILENAME: &str = "feedback-questions.md";

/// Every template file with its compiled-in default.
const TEMPLATE_FILES: [(&str, &str); 8] = [
    (DOMAIN_ANALYZE_FILENAME, DOMAIN_ANALYZE_TEMPLATE),
    (DOMAIN_VALIDATE_FILENAME, DOMAIN_VALIDATE_TEMPLATE),
    (ARGUMENT_EXTRACT_FILENAME, ARGUMENT_EXTRACT_TEMPLATE),
    (ARGUMENT_KEY_PARAGRAPHS_FILENAME, ARGUMENT_KEY_PARAGRAPHS_TEMPLATE),
    (LANGUAGE_EXTRACT_FILENAME, LANGUAGE_EXTRACT_TEMPLATE),
    (LANGUAGE_EXPLAIN_FILENAME, LANGUAGE_EXPLAIN_TEMPLATE),
    (FEEDBACK_EVALUATE_FILENAME, FEEDBACK_EVALUATE_TEMPLATE),
    (FEEDBACK_QUESTIONS_FILENAME, FEEDBACK_QUESTIONS_TEMPLATE),
];

/// The user-message templates for every agent call.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Domain classification.
    pub domain_analyze: String,
    /// Content quality gate.
    pub domain_validate: String,
    /// Reading map extraction.
    pub argument_extract: String,
    /// Key paragraph selection.
    pub argument_key_paragraphs: String,
    /// Language breakdown extraction.
    pub language_extract: String,
    /// Learner-facing expression explanations.
    pub language_explain: String,
    /// Output evaluation.
    pub feedback_evaluate: String,
    /// Comprehension questions.
    pub feedback_questions: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads templates from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` or `PROMPT_DIR`
    ///    via [`LlmConfig`](super::LlmConfig))
    /// 2. `PROMPT_DIR` environment variable
    /// 3. `~/.config/daily-english/prompts/`
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            domain_analyze: load_file(DOMAIN_ANALYZE_FILENAME, DOMAIN_ANALYZE_TEMPLATE),
            domain_validate: load_file(DOMAIN_VALIDATE_FILENAME, DOMAIN_VALIDATE_TEMPLATE),
            argument_extract: load_file(ARGUMENT_EXTRACT_FILENAME, ARGUMENT_EXTRACT_TEMPLATE),
            argument_key_paragraphs: load_file(
                ARGUMENT_KEY_PARAGRAPHS_FILENAME,
                ARGUMENT_KEY_PARAGRAPHS_TEMPLATE,
            ),
            language_extract: load_file(LANGUAGE_EXTRACT_FILENAME, LANGUAGE_EXTRACT_TEMPLATE),
            language_explain: load_file(LANGUAGE_EXPLAIN_FILENAME, LANGUAGE_EXPLAIN_TEMPLATE),
            feedback_evaluate: load_file(FEEDBACK_EVALUATE_FILENAME, FEEDBACK_EVALUATE_TEMPLATE),
            feedback_questions: load_file(
                FEEDBACK_QUESTIONS_FILENAME,
                FEEDBACK_QUESTIONS_TEMPLATE,
            ),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            domain_analyze: DOMAIN_ANALYZE_TEMPLATE.to_string(),
            domain_validate: DOMAIN_VALIDATE_TEMPLATE.to_string(),
            argument_extract: ARGUMENT_EXTRACT_TEMPLATE.to_string(),
            argument_key_paragraphs: ARGUMENT_KEY_PARAGRAPHS_TEMPLATE.to_string(),
            language_extract: LANGUAGE_EXTRACT_TEMPLATE.to_string(),
            language_explain: LANGUAGE_EXPLAIN_TEMPLATE.to_string(),
            feedback_evaluate: FEEDBACK_EVALUATE_TEMPLATE.to_string(),
            feedback_questions: FEEDBACK_QUESTIONS_TEMPLATE.to_string(),
        }
    }

    /// Writes the compiled-in default templates to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten; use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (filename, content) in TEMPLATE_FILES {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Substitutes `{{name}}` placeholders in one pass.
///
/// Every placeholder whose name appears in `vars` is replaced by the
/// literal value; values are not scanned again, so a value that itself
/// contains `{{...}}` is inserted verbatim. Placeholders with no matching
/// variable are left as they are.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    // The name runs from the last `{{` before each `}}`.
    while let Some(close) = rest.find("}}") {
        let Some(open) = rest[..close].rfind("{{") else {
            out.push_str(&rest[..close + 2]);
            rest = &rest[close + 2..];
            continue;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 2..close];
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..close + 2]),
        }
        rest = &rest[close + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let out = render(
            "A: {{article}} / B: {{article}}",
            &[("article", "text")],
        );
        assert_eq!(out, "A: text / B: text");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let out = render("{{article}} {{readingMap}}", &[("article", "x")]);
        assert_eq!(out, "x {{readingMap}}");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render(
            "{{article}} then {{readingMap}}",
            &[("article", "{{readingMap}}"), ("readingMap", "MAP")],
        );
        assert_eq!(out, "{{readingMap}} then MAP");
    }

    #[test]
    fn test_render_nested_open_uses_innermost_name() {
        let out = render("{{x {{article}} and }} {{", &[("article", "T")]);
        assert_eq!(out, "{{x T and }} {{");
    }

    #[test]
    fn test_render_unterminated_placeholder() {
        assert_eq!(render("tail {{article", &[("article", "x")]), "tail {{article");
    }

    #[test]
    fn test_defaults_contain_their_placeholders() {
        let set = PromptSet::defaults();
        assert!(set.domain_analyze.contains("{{article}}"));
        assert!(set.argument_key_paragraphs.contains("{{readingMap}}"));
        assert!(set.language_extract.contains("{{keyParagraphs}}"));
        assert!(set.language_explain.contains("{{expressions}}"));
        assert!(set.feedback_evaluate.contains("{{userOutput}}"));
        assert!(set.feedback_evaluate.contains("{{prompt}}"));
        assert!(set.feedback_questions.contains("{{readingMap}}"));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join(DOMAIN_ANALYZE_FILENAME), "custom {{article}}")
            .unwrap_or_else(|_| unreachable!());

        let set = PromptSet::load(Some(dir.path()));
        assert_eq!(set.domain_analyze, "custom {{article}}");
        assert_eq!(set.domain_validate, DOMAIN_VALIDATE_TEMPLATE);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join(FEEDBACK_QUESTIONS_FILENAME), "mine")
            .unwrap_or_else(|_| unreachable!());

        let written = PromptSet::write_defaults(dir.path()).unwrap_or_default();
        assert_eq!(written.len(), TEMPLATE_FILES.len() - 1);
        let kept = std::fs::read_to_string(dir.path().join(FEEDBACK_QUESTIONS_FILENAME))
            .unwrap_or_default();
        assert_eq!(kept, "mine");
    }

    proptest! {
        #[test]
        fn prop_render_without_vars_is_identity(template in ".*") {
            prop_assert_eq!(render(&template, &[]), template);
        }

        #[test]
        fn prop_value_inserted_verbatim(value in ".*") {
            let out = render("<{{article}}>", &[("article", value.as_str())]);
            prop_assert_eq!(out, format!("<{value}>"));
        }
    }
}
