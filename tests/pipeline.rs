//! End-to-end flows through the services with a scripted LLM vendor.

mod common;

use common::{FEEDBACK_REPLY, completion, new_article, pipeline_replies, services};
use daily_english::core::{
    DailySummary, Difficulty, Domain, MemoryItemType, NewUserOutput, ProgressUpdate,
    SessionStatus,
};
use daily_english::error::{LlmError, ServiceError};
use daily_english::service::SubmitUnderstandingRequest;

#[tokio::test]
async fn test_process_then_read_then_write() {
    let mut replies = pipeline_replies();
    replies.push(Ok(completion(FEEDBACK_REPLY)));
    let (services, transport) = services(replies);

    let article = services
        .articles
        .create(new_article("Rate cuts and lending"))
        .unwrap_or_else(|_| unreachable!());
    let processed = services
        .articles
        .process_with_ai(&article.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(transport.calls(), 5);
    assert_eq!(processed.domain, Domain::Finance);
    assert_eq!(processed.difficulty, Difficulty::Advanced);
    let ai = processed.ai.as_ref().unwrap_or_else(|| unreachable!());
    assert_eq!(ai.reading_map.main_conclusion, "Only slowly.");
    assert_eq!(ai.key_paragraphs.len(), 2);
    assert_eq!(ai.understanding_questions.len(), 1);

    let session = services
        .sessions
        .create("reader-1", &article.id)
        .unwrap_or_else(|_| unreachable!());
    let session = services
        .sessions
        .update_progress(
            "reader-1",
            &session.id,
            &ProgressUpdate {
                field: Some("keyParagraphsViewed".into()),
                boolean_value: None,
                array_value: Some(vec![0, 2]),
            },
        )
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(session.progress.key_paragraphs_viewed, vec![0, 2]);

    services
        .sessions
        .submit_understanding(
            "reader-1",
            &session.id,
            SubmitUnderstandingRequest {
                question_id: "q1".into(),
                answer: "Banks are cautious.".into(),
            },
        )
        .unwrap_or_else(|_| unreachable!());

    let submitted = services
        .outputs
        .submit(
            "reader-1",
            NewUserOutput {
                article_id: article.id.clone(),
                prompt: "Summarize the argument for your manager.".into(),
                user_output: "Rate cuts help, but lending will recover slowly.".into(),
                session_id: Some(session.id.clone()),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!submitted.feedback_pending);
    let feedback = services
        .outputs
        .get_feedback("reader-1", &submitted.output.id)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(feedback.logic_score, 5);

    let completed = services
        .sessions
        .complete(
            "reader-1",
            &session.id,
            Some(DailySummary {
                sentence_pattern: "X, in turn, Y".into(),
                concept: "monetary transmission".into(),
                expression: "remain cautious".into(),
            }),
        )
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(completed.status, SessionStatus::Completed);

    let bank = services
        .memory
        .list("reader-1", None)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(bank.len(), 3);
    assert!(bank.iter().all(|item| item.context == "Rate cuts and lending"));
    let concepts = services
        .memory
        .list("reader-1", Some(MemoryItemType::Concept))
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(concepts.len(), 1);
    assert_eq!(concepts[0].content, "monetary transmission");

    let stats = services
        .sessions
        .stats("reader-1")
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(stats.completed_sessions, 1);
}

#[tokio::test]
async fn test_vendor_outage_keeps_article_unprocessed() {
    let (services, transport) = services(Vec::new());
    let article = services
        .articles
        .create(new_article("Outage"))
        .unwrap_or_else(|_| unreachable!());

    let result = services.articles.process_with_ai(&article.id).await;
    assert!(matches!(
        result,
        Err(ServiceError::Llm(LlmError::Upstream { .. }))
    ));
    assert!(transport.calls() > 1);

    let stored = services
        .articles
        .find_one(&article.id)
        .unwrap_or_else(|_| unreachable!());
    assert!(stored.ai.is_none());
    assert_eq!(stored.domain, Domain::Economics);
}

#[tokio::test]
async fn test_feedback_failure_leaves_output_pending() {
    let (services, _transport) = services(pipeline_replies());
    let article = services
        .articles
        .create(new_article("Pending feedback"))
        .unwrap_or_else(|_| unreachable!());
    services
        .articles
        .process_with_ai(&article.id)
        .await
        .unwrap_or_else(|_| unreachable!());

    let submitted = services
        .outputs
        .submit(
            "reader-2",
            NewUserOutput {
                article_id: article.id.clone(),
                prompt: "Reply to a colleague.".into(),
                user_output: "I agree with the cautious view.".into(),
                session_id: None,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(submitted.feedback_pending);
    assert!(matches!(
        services
            .outputs
            .get_feedback("reader-2", &submitted.output.id),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        services
            .outputs
            .find_one("someone-else", &submitted.output.id),
        Err(ServiceError::NotFound(_))
    ));
}
