// src/services/recorder.rs

use crate::{
    error::AppError,
    models::attempt::{Attempt, NewAttempt},
    services::grading::{GradeResult, Submission},
    store::QuizStore,
};

/// Persists one graded submission as a new, immutable attempt.
///
/// Every call writes a fresh row; retakes are separate attempts. The store performs
/// the insert atomically, so on error nothing has been written.
pub async fn record(
    store: &dyn QuizStore,
    user_id: i64,
    quiz_id: i64,
    submission: &Submission,
    grade: &GradeResult,
) -> Result<Attempt, AppError> {
    let new_attempt = build_attempt(user_id, quiz_id, submission, grade)?;

    let attempt = store.insert_attempt(new_attempt).await?;

    tracing::info!(
        attempt_id = attempt.id,
        user_id,
        quiz_id,
        score = attempt.score,
        "Attempt recorded"
    );

    Ok(attempt)
}

fn build_attempt(
    user_id: i64,
    quiz_id: i64,
    submission: &Submission,
    grade: &GradeResult,
) -> Result<NewAttempt, AppError> {
    if !grade.is_consistent() {
        return Err(AppError::InternalServerError(format!(
            "Inconsistent grade for quiz {}: {} correct + {} wrong + {} unanswered != {}",
            quiz_id, grade.correct_count, grade.wrong_count, grade.unanswered_count, grade.total_questions
        )));
    }

    let count = |n: usize| {
        i32::try_from(n).map_err(|_| AppError::BadRequest("Quiz is too large to record".to_string()))
    };

    Ok(NewAttempt {
        user_id,
        quiz_id,
        answers: submission.answers.clone(),
        results: grade.results.clone(),
        total_questions: count(grade.total_questions)?,
        correct_count: count(grade.correct_count)?,
        wrong_count: count(grade.wrong_count)?,
        unanswered_count: count(grade.unanswered_count)?,
        final_score: grade.final_score,
        score: grade.score,
        percentage: grade.percentage,
        time_taken_seconds: submission.time_taken_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::{SubmitAttemptRequest, SubmittedAnswer};
    use crate::store::memory::MemoryStore;

    fn submission() -> Submission {
        Submission::parse(SubmitAttemptRequest {
            answers: vec![
                SubmittedAnswer {
                    question_id: 10,
                    selected_option: Some(1),
                },
                SubmittedAnswer {
                    question_id: 11,
                    selected_option: Some(0),
                },
            ],
            time_taken_seconds: Some(42),
        })
        .unwrap()
    }

    fn grade() -> GradeResult {
        GradeResult {
            total_questions: 2,
            correct_count: 1,
            wrong_count: 0,
            unanswered_count: 1,
            final_score: 1.0,
            percentage: 50.0,
            score: 50,
            results: vec![
                crate::models::attempt::QuestionResult {
                    question_id: 10,
                    selected_option: Some(1),
                    correct_option: 1,
                    is_correct: true,
                    explanation: None,
                },
                crate::models::attempt::QuestionResult {
                    question_id: 11,
                    selected_option: None,
                    correct_option: 3,
                    is_correct: false,
                    explanation: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_record_stores_answers_verbatim() {
        let store = MemoryStore::new();
        let sub = submission();

        let attempt = record(&store, 1, 5, &sub, &grade()).await.unwrap();

        assert_eq!(attempt.answers.0, sub.answers);
        assert_eq!(attempt.results.0.len(), 2);
        assert_eq!(attempt.time_taken_seconds, Some(42));
        assert_eq!(attempt.score, 50);
    }

    #[tokio::test]
    async fn test_retakes_create_distinct_attempts() {
        let store = MemoryStore::new();
        let sub = submission();

        let first = record(&store, 1, 5, &sub, &grade()).await.unwrap();
        let second = record(&store, 1, 5, &sub, &grade()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.list_attempts_for_user(1, Some(5)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inconsistent_grade_writes_nothing() {
        let store = MemoryStore::new();
        let mut bad = grade();
        bad.unanswered_count = 0;

        assert!(record(&store, 1, 5, &submission(), &bad).await.is_err());
        assert!(store.list_attempts_for_user(1, None).await.unwrap().is_empty());
    }
}
