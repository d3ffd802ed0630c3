//! The four-stage article processing pipeline.
//!
//! ```text
//! content ─┬─ 1. classify            (Domain-Curator)
//!          ├─ 2. map argument        (Argument-Mapper, two calls)
//!          ├─ 3. language breakdown  (Language-Reasoning, uses 2's paragraphs)
//!          └─ 4. questions           (Professional-Feedback, uses 2's map)
//! ```
//!
//! Stages run strictly in order. The first failing stage aborts the run
//! and nothing from earlier stages is returned.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use super::analysis::{ArgumentMap, DomainAnalysis};
use super::argument_mapper::ArgumentMapperAgent;
use super::domain_curator::DomainCuratorAgent;
use super::language_reasoning::LanguageReasoningAgent;
use super::professional_feedback::ProfessionalFeedbackAgent;
use super::traits::AgentContext;
use crate::core::article::{
    AiContent, Difficulty, Domain, KeyParagraph, LanguageBreakdown, ReadingMap,
    UnderstandingQuestion,
};
use crate::error::LlmError;

/// The pipeline's four stages. [`AgentStages`] backs them with the agents;
/// tests substitute fixed outputs.
#[async_trait]
pub trait AnalysisStages: Send + Sync {
    /// Stage 1: domain and difficulty.
    async fn classify(&self, article: &str) -> Result<DomainAnalysis, LlmError>;

    /// Stage 2: reading map and key paragraphs.
    async fn map_argument(&self, article: &str) -> Result<ArgumentMap, LlmError>;

    /// Stage 3: reasoning expressions from the key paragraphs.
    async fn extract_language(
        &self,
        article: &str,
        key_paragraphs: &[KeyParagraph],
    ) -> Result<Vec<LanguageBreakdown>, LlmError>;

    /// Stage 4: comprehension questions from the reading map.
    async fn generate_questions(
        &self,
        article: &str,
        reading_map: &ReadingMap,
    ) -> Result<Vec<UnderstandingQuestion>, LlmError>;
}

/// [`AnalysisStages`] backed by the four agents.
#[derive(Debug, Clone)]
pub struct AgentStages {
    curator: DomainCuratorAgent,
    mapper: ArgumentMapperAgent,
    language: LanguageReasoningAgent,
    feedback: ProfessionalFeedbackAgent,
}

impl AgentStages {
    /// Builds all four agents over one shared context.
    #[must_use]
    pub fn new(ctx: &AgentContext) -> Self {
        Self {
            curator: DomainCuratorAgent::new(ctx.clone()),
            mapper: ArgumentMapperAgent::new(ctx.clone()),
            language: LanguageReasoningAgent::new(ctx.clone()),
            feedback: ProfessionalFeedbackAgent::new(ctx.clone()),
        }
    }

    /// The Domain-Curator agent.
    #[must_use]
    pub const fn curator(&self) -> &DomainCuratorAgent {
        &self.curator
    }

    /// The Language-Reasoning agent.
    #[must_use]
    pub const fn language(&self) -> &LanguageReasoningAgent {
        &self.language
    }

    /// The Professional-Feedback agent.
    #[must_use]
    pub const fn feedback(&self) -> &ProfessionalFeedbackAgent {
        &self.feedback
    }
}

#[async_trait]
impl AnalysisStages for AgentStages {
    async fn classify(&self, article: &str) -> Result<DomainAnalysis, LlmError> {
        self.curator.analyze_article(article).await
    }

    async fn map_argument(&self, article: &str) -> Result<ArgumentMap, LlmError> {
        self.mapper.analyze(article).await
    }

    async fn extract_language(
        &self,
        article: &str,
        key_paragraphs: &[KeyParagraph],
    ) -> Result<Vec<LanguageBreakdown>, LlmError> {
        self.language
            .extract_language_breakdown(article, key_paragraphs)
            .await
    }

    async fn generate_questions(
        &self,
        article: &str,
        reading_map: &ReadingMap,
    ) -> Result<Vec<UnderstandingQuestion>, LlmError> {
        self.feedback
            .generate_understanding_questions(article, reading_map)
            .await
    }
}

/// Everything one successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Stage 1 result.
    pub analysis: DomainAnalysis,
    /// Stages 2-4, ready to store on the article as one value.
    pub content: AiContent,
}

impl PipelineOutput {
    /// Classification to store: the analysed values where they name a known
    /// domain or difficulty, otherwise the current ones.
    #[must_use]
    pub fn classification(&self, current: (Domain, Difficulty)) -> (Domain, Difficulty) {
        let domain = self.analysis.parsed_domain().unwrap_or_else(|| {
            warn!(domain = %self.analysis.domain, "unknown domain, keeping {}", current.0);
            current.0
        });
        let difficulty = self.analysis.parsed_difficulty().unwrap_or_else(|| {
            warn!(
                difficulty = %self.analysis.difficulty,
                "unknown difficulty, keeping {}", current.1
            );
            current.1
        });
        (domain, difficulty)
    }
}

/// Runs the four stages over `article`.
///
/// # Errors
///
/// Returns the first stage's [`LlmError`]; later stages are not run.
pub async fn run_pipeline<S>(stages: &S, article: &str) -> Result<PipelineOutput, LlmError>
where
    S: AnalysisStages + ?Sized,
{
    let start = Instant::now();

    info!(stage = 1, "classifying article");
    let analysis = stages.classify(article).await?;

    info!(stage = 2, "mapping argument");
    let ArgumentMap {
        reading_map,
        key_paragraphs,
    } = stages.map_argument(article).await?;

    info!(stage = 3, "extracting language breakdown");
    let language_breakdown = stages.extract_language(article, &key_paragraphs).await?;

    info!(stage = 4, "generating understanding questions");
    let understanding_questions = stages.generate_questions(article, &reading_map).await?;

    info!(
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        key_paragraphs = key_paragraphs.len(),
        expressions = language_breakdown.len(),
        questions = understanding_questions.len(),
        "pipeline completed"
    );

    Ok(PipelineOutput {
        analysis,
        content: AiContent {
            reading_map,
            key_paragraphs,
            language_breakdown,
            understanding_questions,
        },
    })
}
