// src/services/grading.rs

use std::collections::{HashMap, HashSet};

use crate::{
    config::ScoringConfig,
    error::AppError,
    models::{
        attempt::{QuestionResult, SubmitAttemptRequest, SubmittedAnswer, round2},
        question::{OPTION_COUNT, Question},
        quiz::Quiz,
    },
};

/// Penalty and floor used to turn correct/wrong counts into a final score.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingScheme {
    /// Points subtracted per wrong answer. `None` disables negative marking.
    pub penalty: Option<f64>,
    /// Final scores never go below this.
    pub floor: f64,
}

impl MarkingScheme {
    pub fn for_quiz(quiz: &Quiz, scoring: &ScoringConfig) -> Self {
        let penalty = quiz
            .negative_marking
            .then(|| quiz.negative_mark.unwrap_or(scoring.default_negative_mark));

        Self {
            penalty,
            floor: scoring.score_floor,
        }
    }
}

/// A submission that passed boundary validation.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The answers exactly as they were sent.
    pub answers: Vec<SubmittedAnswer>,
    pub time_taken_seconds: Option<i32>,
    /// Answered questions only: question id -> option in 1..=4.
    selections: HashMap<i64, i32>,
}

impl Submission {
    /// Validates a raw request into a typed submission.
    ///
    /// Rejects empty answer lists, duplicate question ids, options outside 1..=4 and
    /// negative durations. An option of `0` or `null` means the question was skipped.
    pub fn parse(req: SubmitAttemptRequest) -> Result<Self, AppError> {
        if req.answers.is_empty() {
            return Err(AppError::BadRequest("No answers submitted".to_string()));
        }

        let time_taken_seconds = match req.time_taken_seconds {
            None => None,
            Some(t) if t < 0 => {
                return Err(AppError::BadRequest(
                    "time_taken_seconds cannot be negative".to_string(),
                ));
            }
            Some(t) => Some(i32::try_from(t).map_err(|_| {
                AppError::BadRequest("time_taken_seconds is too large".to_string())
            })?),
        };

        let mut seen = HashSet::with_capacity(req.answers.len());
        let mut selections = HashMap::with_capacity(req.answers.len());

        for answer in &req.answers {
            if !seen.insert(answer.question_id) {
                return Err(AppError::BadRequest(format!(
                    "Question {} was answered more than once",
                    answer.question_id
                )));
            }

            match answer.selected_option {
                None | Some(0) => {}
                Some(opt) if (1..=OPTION_COUNT as i32).contains(&opt) => {
                    selections.insert(answer.question_id, opt);
                }
                Some(opt) => {
                    return Err(AppError::BadRequest(format!(
                        "Option {} for question {} is out of range (1-{})",
                        opt, answer.question_id, OPTION_COUNT
                    )));
                }
            }
        }

        Ok(Self {
            answers: req.answers,
            time_taken_seconds,
            selections,
        })
    }

    pub fn selection(&self, question_id: i64) -> Option<i32> {
        self.selections.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeResult {
    pub total_questions: usize,
    pub correct_count: usize,
    /// Answered but incorrect. Only these are penalized.
    pub wrong_count: usize,
    pub unanswered_count: usize,
    pub final_score: f64,
    /// Unrounded.
    pub percentage: f64,
    /// `percentage` rounded to an integer in 0..=100.
    pub score: i32,
    pub results: Vec<QuestionResult>,
}

impl GradeResult {
    pub fn rounded_percentage(&self) -> f64 {
        round2(self.percentage)
    }

    pub fn is_consistent(&self) -> bool {
        self.correct_count + self.wrong_count + self.unanswered_count == self.total_questions
            && self.results.len() == self.total_questions
    }
}

/// Grades `submission` against the answer key in `questions`.
pub fn grade(
    questions: &[Question],
    submission: &Submission,
    scheme: &MarkingScheme,
) -> Result<GradeResult, AppError> {
    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "Quiz has no questions, nothing to grade".to_string(),
        ));
    }

    let known: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    if let Some(foreign) = submission
        .answers
        .iter()
        .find(|a| !known.contains(&a.question_id))
    {
        return Err(AppError::BadRequest(format!(
            "Question {} does not belong to this quiz",
            foreign.question_id
        )));
    }

    let mut correct_count = 0;
    let mut wrong_count = 0;
    let mut results = Vec::with_capacity(questions.len());

    for question in questions {
        let selected = submission.selection(question.id);
        let is_correct = selected == Some(question.correct_option);

        match selected {
            Some(_) if is_correct => correct_count += 1,
            Some(_) => wrong_count += 1,
            None => {}
        }

        results.push(QuestionResult {
            question_id: question.id,
            selected_option: selected,
            correct_option: question.correct_option,
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    let total_questions = questions.len();
    let unanswered_count = total_questions - submission.answered_count();

    let mut final_score = correct_count as f64;
    if let Some(penalty) = scheme.penalty {
        final_score -= wrong_count as f64 * penalty;
    }
    let final_score = final_score.max(scheme.floor);

    let percentage = final_score / total_questions as f64 * 100.0;
    let score = percentage.round().clamp(0.0, 100.0) as i32;

    Ok(GradeResult {
        total_questions,
        correct_count,
        wrong_count,
        unanswered_count,
        final_score,
        percentage,
        score,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(id: i64, correct_option: i32) -> Question {
        Question {
            id,
            quiz_id: 1,
            position: id as i32,
            text: format!("Question {}", id),
            options: Json(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_option,
            explanation: Some(format!("Because {}", correct_option)),
            image_url: None,
        }
    }

    /// Four questions with correct options [2, 1, 4, 3].
    fn sample_quiz() -> Vec<Question> {
        vec![question(1, 2), question(2, 1), question(3, 4), question(4, 3)]
    }

    fn submit(pairs: &[(i64, Option<i32>)]) -> Result<Submission, AppError> {
        Submission::parse(SubmitAttemptRequest {
            answers: pairs
                .iter()
                .map(|&(question_id, selected_option)| SubmittedAnswer {
                    question_id,
                    selected_option,
                })
                .collect(),
            time_taken_seconds: Some(60),
        })
    }

    fn plain() -> MarkingScheme {
        MarkingScheme {
            penalty: None,
            floor: 0.0,
        }
    }

    #[test]
    fn test_grade_without_negative_marking() {
        let submission = submit(&[(1, Some(2)), (2, Some(3)), (3, Some(4))]).unwrap();
        let result = grade(&sample_quiz(), &submission, &plain()).unwrap();

        assert_eq!(result.correct_count, 2);
        assert_eq!(result.wrong_count, 1);
        assert_eq!(result.unanswered_count, 1);
        assert_eq!(result.final_score, 2.0);
        assert_eq!(result.percentage, 50.0);
        assert_eq!(result.score, 50);
        assert!(result.is_consistent());
    }

    #[test]
    fn test_grade_with_negative_marking() {
        let submission = submit(&[(1, Some(2)), (2, Some(3)), (3, Some(4))]).unwrap();
        let scheme = MarkingScheme {
            penalty: Some(0.25),
            floor: 0.0,
        };
        let result = grade(&sample_quiz(), &submission, &scheme).unwrap();

        assert_eq!(result.final_score, 1.75);
        assert_eq!(result.percentage, 43.75);
        assert_eq!(result.rounded_percentage(), 43.75);
        assert_eq!(result.score, 44);
    }

    #[test]
    fn test_unanswered_is_not_penalized() {
        let submission = submit(&[(1, Some(2)), (2, None), (3, Some(0))]).unwrap();
        let scheme = MarkingScheme {
            penalty: Some(1.0),
            floor: 0.0,
        };
        let result = grade(&sample_quiz(), &submission, &scheme).unwrap();

        assert_eq!(result.correct_count, 1);
        assert_eq!(result.wrong_count, 0);
        assert_eq!(result.unanswered_count, 3);
        assert_eq!(result.final_score, 1.0);
        assert_eq!(result.percentage, 25.0);
    }

    #[test]
    fn test_score_is_floored() {
        let submission = submit(&[(1, Some(1)), (2, Some(2)), (3, Some(1)), (4, Some(1))]).unwrap();
        let scheme = MarkingScheme {
            penalty: Some(0.5),
            floor: 0.0,
        };
        let result = grade(&sample_quiz(), &submission, &scheme).unwrap();

        assert_eq!(result.wrong_count, 4);
        assert_eq!(result.final_score, 0.0);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_counts_always_add_up() {
        let cases: Vec<Vec<(i64, Option<i32>)>> = vec![
            vec![(1, Some(2))],
            vec![(1, Some(1)), (2, Some(1)), (3, Some(1)), (4, Some(1))],
            vec![(4, Some(3)), (3, None)],
            vec![(2, Some(0))],
        ];
        for pairs in cases {
            let result = grade(&sample_quiz(), &submit(&pairs).unwrap(), &plain()).unwrap();
            assert_eq!(
                result.correct_count + result.wrong_count + result.unanswered_count,
                result.total_questions
            );
        }
    }

    #[test]
    fn test_grading_is_deterministic() {
        let submission = submit(&[(3, Some(4)), (1, Some(1)), (2, Some(1))]).unwrap();
        let first = grade(&sample_quiz(), &submission, &plain()).unwrap();
        let second = grade(&sample_quiz(), &submission, &plain()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_details_follow_quiz_order_and_disclose_key() {
        let submission = submit(&[(3, Some(4)), (1, Some(1))]).unwrap();
        let result = grade(&sample_quiz(), &submission, &plain()).unwrap();

        let ids: Vec<i64> = result.results.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(!result.results[0].is_correct);
        assert_eq!(result.results[0].correct_option, 2);
        assert_eq!(result.results[1].selected_option, None);
        assert!(result.results[2].is_correct);
        assert_eq!(result.results[2].explanation.as_deref(), Some("Because 4"));
    }

    #[test]
    fn test_foreign_question_rejects_whole_submission() {
        let submission = submit(&[(1, Some(2)), (99, Some(1))]).unwrap();
        let err = grade(&sample_quiz(), &submission, &plain()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_empty_quiz_has_nothing_to_grade() {
        let submission = submit(&[(1, Some(2))]).unwrap();
        let err = grade(&[], &submission, &plain()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("nothing to grade")));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(submit(&[]).is_err());
        assert!(submit(&[(1, Some(5))]).is_err());
        assert!(submit(&[(1, Some(-1))]).is_err());
        assert!(submit(&[(1, Some(2)), (1, Some(3))]).is_err());

        let negative_time = Submission::parse(SubmitAttemptRequest {
            answers: vec![SubmittedAnswer {
                question_id: 1,
                selected_option: Some(1),
            }],
            time_taken_seconds: Some(-3),
        });
        assert!(negative_time.is_err());
    }

    #[test]
    fn test_marking_scheme_uses_default_penalty() {
        let scoring = ScoringConfig::default();
        let mut quiz = Quiz {
            id: 1,
            title: "t".into(),
            description: String::new(),
            subject: None,
            exam_year: None,
            is_active: true,
            is_paid: false,
            price_cents: 0,
            negative_marking: false,
            negative_mark: Some(0.5),
            created_at: chrono::Utc::now(),
            questions: Vec::new(),
        };
        assert_eq!(MarkingScheme::for_quiz(&quiz, &scoring).penalty, None);

        quiz.negative_marking = true;
        assert_eq!(MarkingScheme::for_quiz(&quiz, &scoring).penalty, Some(0.5));

        quiz.negative_mark = None;
        assert_eq!(
            MarkingScheme::for_quiz(&quiz, &scoring).penalty,
            Some(scoring.default_negative_mark)
        );
    }
}
