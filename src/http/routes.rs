//! API routes.
//!
//! Handlers translate between HTTP and the services; business rules stay
//! in [`crate::service`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery, CurrentUser};
use super::server::AppState;
use crate::agent::{ContentValidation, ExplainedExpression};
use crate::core::{
    Article, ArticleQuery, ArticleStatistics, ArticleUpdate, Feedback, MemoryItem, MemoryItemType,
    MemoryStats, NewArticle, NewMemoryItem, NewUserOutput, Page, ProgressUpdate, ReadingSession,
    SessionStats, SessionStatus, UnderstandingQuestion, UserOutput,
};
use crate::service::{
    CompleteSessionRequest, CreateSessionRequest, ScheduleRequest, SubmitUnderstandingRequest,
    SubmittedOutput,
};

type AppStateArc = Arc<AppState>;
type ApiResult<T> = Result<T, ApiError>;

/// Every API route, relative to the API prefix.
pub fn api_routes() -> Router<AppStateArc> {
    Router::new()
        .merge(health_routes())
        .merge(article_routes())
        .merge(user_output_routes())
        .merge(memory_item_routes())
        .merge(reading_session_routes())
}

// ============================================================================
// Health
// ============================================================================

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

// ============================================================================
// Articles
// ============================================================================

fn article_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/articles", post(create_article))
        .route("/articles/history", get(list_articles))
        .route("/articles/today", get(today_article))
        .route("/articles/statistics", get(article_statistics))
        .route(
            "/articles/{id}",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .route("/articles/{id}/process-ai", post(process_article))
        .route("/articles/{id}/validate", post(validate_article))
        .route("/articles/{id}/questions", post(article_questions))
        .route("/articles/{id}/expressions", post(explain_expressions))
        .route("/articles/{id}/schedule", patch(schedule_article))
}

async fn create_article(
    State(state): State<AppStateArc>,
    ApiJson(new): ApiJson<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let article = state.services.articles.create(new)?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn list_articles(
    State(state): State<AppStateArc>,
    ApiQuery(query): ApiQuery<ArticleQuery>,
) -> ApiResult<Json<Page<Article>>> {
    Ok(Json(state.services.articles.find_all(&query)?))
}

async fn today_article(State(state): State<AppStateArc>) -> ApiResult<Json<Article>> {
    Ok(Json(state.services.articles.today()?))
}

async fn article_statistics(
    State(state): State<AppStateArc>,
) -> ApiResult<Json<ArticleStatistics>> {
    Ok(Json(state.services.articles.statistics()?))
}

async fn get_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.services.articles.find_one(&id)?))
}

async fn update_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ArticleUpdate>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.services.articles.update(&id, update)?))
}

async fn delete_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.services.articles.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn process_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.services.articles.process_with_ai(&id).await?))
}

async fn validate_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentValidation>> {
    Ok(Json(state.services.articles.validate_content(&id).await?))
}

async fn article_questions(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<UnderstandingQuestion>>> {
    Ok(Json(
        state
            .services
            .articles
            .generate_understanding_questions(&id)
            .await?,
    ))
}

async fn explain_expressions(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ExplainedExpression>>> {
    Ok(Json(
        state.services.articles.explain_expressions(&id).await?,
    ))
}

async fn schedule_article(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> ApiResult<Json<Article>> {
    Ok(Json(
        state.services.articles.schedule(&id, req.scheduled_for)?,
    ))
}

// ============================================================================
// User outputs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputFilter {
    article_id: Option<String>,
}

fn user_output_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/user-outputs", post(submit_output).get(list_outputs))
        .route("/user-outputs/{id}", get(get_output))
        .route(
            "/user-outputs/{id}/feedback",
            get(get_feedback).post(generate_feedback),
        )
}

async fn submit_output(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiJson(new): ApiJson<NewUserOutput>,
) -> ApiResult<(StatusCode, Json<SubmittedOutput>)> {
    let submitted = state.services.outputs.submit(&user, new).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn list_outputs(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiQuery(filter): ApiQuery<OutputFilter>,
) -> ApiResult<Json<Vec<UserOutput>>> {
    Ok(Json(
        state
            .services
            .outputs
            .list(&user, filter.article_id.as_deref())?,
    ))
}

async fn get_output(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserOutput>> {
    Ok(Json(state.services.outputs.find_one(&user, &id)?))
}

async fn get_feedback(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Feedback>> {
    Ok(Json(state.services.outputs.get_feedback(&user, &id)?))
}

async fn generate_feedback(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserOutput>> {
    Ok(Json(
        state.services.outputs.generate_feedback(&user, &id).await?,
    ))
}

// ============================================================================
// Memory items
// ============================================================================

#[derive(Debug, Deserialize)]
struct MemoryFilter {
    #[serde(rename = "type")]
    item_type: Option<MemoryItemType>,
}

fn memory_item_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/memory-items", post(create_memory_item).get(list_memory_items))
        .route("/memory-items/stats", get(memory_stats))
        .route(
            "/memory-items/{id}",
            get(get_memory_item).delete(delete_memory_item),
        )
        .route("/memory-items/{id}/review", post(review_memory_item))
}

async fn create_memory_item(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiJson(new): ApiJson<NewMemoryItem>,
) -> ApiResult<(StatusCode, Json<MemoryItem>)> {
    let item = state.services.memory.create(&user, new)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_memory_items(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiQuery(filter): ApiQuery<MemoryFilter>,
) -> ApiResult<Json<Vec<MemoryItem>>> {
    Ok(Json(state.services.memory.list(&user, filter.item_type)?))
}

async fn memory_stats(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MemoryStats>> {
    Ok(Json(state.services.memory.stats(&user)?))
}

async fn get_memory_item(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MemoryItem>> {
    Ok(Json(state.services.memory.find_one(&user, &id)?))
}

async fn delete_memory_item(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.services.memory.remove(&user, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn review_memory_item(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MemoryItem>> {
    Ok(Json(state.services.memory.review(&user, &id)?))
}

// ============================================================================
// Reading sessions
// ============================================================================

#[derive(Debug, Deserialize)]
struct SessionFilter {
    status: Option<SessionStatus>,
}

fn reading_session_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/reading-sessions", post(create_session).get(list_sessions))
        .route("/reading-sessions/stats", get(session_stats))
        .route("/reading-sessions/{id}", get(get_session))
        .route("/reading-sessions/{id}/progress", patch(update_progress))
        .route(
            "/reading-sessions/{id}/understanding",
            post(submit_understanding),
        )
        .route("/reading-sessions/{id}/complete", post(complete_session))
        .route("/reading-sessions/{id}/abandon", post(abandon_session))
}

async fn create_session(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<ReadingSession>)> {
    let session = state.services.sessions.create(&user, &req.article_id)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn list_sessions(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    ApiQuery(filter): ApiQuery<SessionFilter>,
) -> ApiResult<Json<Vec<ReadingSession>>> {
    Ok(Json(state.services.sessions.list(&user, filter.status)?))
}

async fn session_stats(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<SessionStats>> {
    Ok(Json(state.services.sessions.stats(&user)?))
}

async fn get_session(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadingSession>> {
    Ok(Json(state.services.sessions.find_one(&user, &id)?))
}

async fn update_progress(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> ApiResult<Json<ReadingSession>> {
    Ok(Json(
        state.services.sessions.update_progress(&user, &id, &update)?,
    ))
}

async fn submit_understanding(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SubmitUnderstandingRequest>,
) -> ApiResult<Json<ReadingSession>> {
    Ok(Json(
        state
            .services
            .sessions
            .submit_understanding(&user, &id, req)?,
    ))
}

/// The completion body is optional; an empty body completes without a
/// daily summary.
async fn complete_session(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ReadingSession>> {
    let req: CompleteSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?
    };
    Ok(Json(state.services.sessions.complete(
        &user,
        &id,
        req.daily_summary,
    )?))
}

async fn abandon_session(
    State(state): State<AppStateArc>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadingSession>> {
    Ok(Json(state.services.sessions.abandon(&user, &id)?))
}
