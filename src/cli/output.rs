//! Output formatting for CLI commands.
//!
//! Every command renders either human-readable text or pretty JSON.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::format_push_string)]

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::agent::ContentValidation;
use crate::core::{Article, Page};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything but `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Serializes `value` as pretty JSON followed by a newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        match serde_json::to_string_pretty(value) {
            Ok(json) => format!("{json}\n"),
            Err(e) => format!("{{\"error\": \"{e}\"}}\n"),
        }
    }
}

fn date_or_dash(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |d| d.to_rfc3339())
}

/// Formats one article.
#[must_use]
pub fn format_article(article: &Article, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(article);
    }
    let mut out = String::new();
    out.push_str(&format!("ID:          {}\n", article.id));
    out.push_str(&format!("Title:       {}\n", article.title));
    out.push_str(&format!("Domain:      {}\n", article.domain));
    out.push_str(&format!("Difficulty:  {}\n", article.difficulty));
    out.push_str(&format!("Words:       {}\n", article.word_count));
    out.push_str(&format!("Scheduled:   {}\n", date_or_dash(article.scheduled_for)));
    out.push_str(&format!("Published:   {}\n", date_or_dash(article.published_at)));
    match &article.ai {
        Some(ai) => {
            out.push_str(&format!(
                "AI content:  {} key paragraphs, {} expressions, {} questions\n",
                ai.key_paragraphs.len(),
                ai.language_breakdown.len(),
                ai.understanding_questions.len()
            ));
            out.push_str(&format!(
                "Question:    {}\nConclusion:  {}\n",
                ai.reading_map.core_question, ai.reading_map.main_conclusion
            ));
        }
        None => out.push_str("AI content:  not processed\n"),
    }
    out
}

/// Formats a page of articles as a table.
#[must_use]
pub fn format_article_list(page: &Page<Article>, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(page);
    }
    if page.data.is_empty() {
        return "No articles found.\n".to_string();
    }
    let mut out = format!(
        "{:<36}  {:<10}  {:<12}  {:<3}  TITLE\n",
        "ID", "DOMAIN", "DIFFICULTY", "AI"
    );
    for article in &page.data {
        out.push_str(&format!(
            "{:<36}  {:<10}  {:<12}  {:<3}  {}\n",
            article.id,
            article.domain.as_str(),
            article.difficulty.as_str(),
            if article.ai.is_some() { "yes" } else { "no" },
            article.title
        ));
    }
    out.push_str(&format!(
        "\nShowing {} of {} (offset {}){}\n",
        page.data.len(),
        page.meta.total,
        page.meta.offset,
        if page.meta.has_more { ", more available" } else { "" }
    ));
    out
}

/// Formats a content validation verdict.
#[must_use]
pub fn format_validation(validation: &ContentValidation, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(validation);
    }
    let mut out = format!(
        "Approved: {}\n",
        if validation.approved { "yes" } else { "no" }
    );
    if !validation.reasons.is_empty() {
        out.push_str("Reasons:\n");
        for reason in &validation.reasons {
            out.push_str(&format!("  - {reason}\n"));
        }
    }
    if let Some(suggestions) = &validation.suggestions {
        out.push_str(&format!("Suggestions: {suggestions}\n"));
    }
    if let Some(difficulty) = &validation.recommended_difficulty {
        out.push_str(&format!("Recommended difficulty: {difficulty}\n"));
    }
    out
}

/// Formats the result of `prompts init`.
#[must_use]
pub fn format_prompts_written(dir: &Path, written: &[PathBuf], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        let json = serde_json::json!({
            "directory": dir.to_string_lossy(),
            "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            "count": written.len()
        });
        return format.to_json(&json);
    }
    if written.is_empty() {
        return format!("All prompt templates already exist in: {}\n", dir.display());
    }
    let mut out = format!(
        "Wrote {} prompt template(s) to: {}\n",
        written.len(),
        dir.display()
    );
    for path in written {
        out.push_str(&format!(
            "  {}\n",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
        ));
    }
    out.push_str("\nEdit these files to customize the agents' prompts.\n");
    out
}
