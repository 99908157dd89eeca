// src/services/access.rs

use serde::Serialize;

use crate::{error::AppError, models::quiz::Quiz, store::QuizStore, utils::jwt::CurrentUser};

pub const REASON_LOGIN_REQUIRED: &str = "login required";
pub const REASON_PURCHASE_REQUIRED: &str = "purchase required";

/// Outcome of an access check. `reason` is only set on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn granted() -> Self {
        Self {
            granted: true,
            reason: None,
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            granted: false,
            reason: Some(reason.to_string()),
        }
    }

    /// Turns a denial into an authorization error, for hard gates.
    pub fn ensure_granted(self) -> Result<(), AppError> {
        if self.granted {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                self.reason
                    .unwrap_or_else(|| REASON_PURCHASE_REQUIRED.to_string()),
            ))
        }
    }
}

/// Decides whether `viewer` may see the questions of, and submit attempts to, `quiz`.
///
/// Visibility (`is_active`) is not checked here: callers resolve inactive quizzes to
/// not-found before asking.
pub fn evaluate_access(
    viewer: Option<&CurrentUser>,
    quiz: &Quiz,
    has_purchase: bool,
) -> AccessDecision {
    if !quiz.is_paid {
        return AccessDecision::granted();
    }

    match viewer {
        None => AccessDecision::denied(REASON_LOGIN_REQUIRED),
        Some(user) if user.is_admin() => AccessDecision::granted(),
        Some(_) if has_purchase => AccessDecision::granted(),
        Some(_) => AccessDecision::denied(REASON_PURCHASE_REQUIRED),
    }
}

/// Same as [`evaluate_access`], looking up the purchase only when it matters.
pub async fn check_access(
    store: &dyn QuizStore,
    viewer: Option<&CurrentUser>,
    quiz: &Quiz,
) -> Result<AccessDecision, AppError> {
    let has_purchase = match viewer {
        Some(user) if quiz.is_paid && !user.is_admin() => {
            store.find_purchase(user.id, quiz.id).await?.is_some()
        }
        _ => false,
    };

    Ok(evaluate_access(viewer, quiz, has_purchase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{ROLE_ADMIN, ROLE_USER};

    fn quiz(is_paid: bool) -> Quiz {
        Quiz {
            id: 7,
            title: "History".into(),
            description: String::new(),
            subject: None,
            exam_year: None,
            is_active: true,
            is_paid,
            price_cents: if is_paid { 500 } else { 0 },
            negative_marking: false,
            negative_mark: None,
            created_at: chrono::Utc::now(),
            questions: Vec::new(),
        }
    }

    fn user(role: &str) -> CurrentUser {
        CurrentUser {
            id: 3,
            role: role.to_string(),
        }
    }

    #[test]
    fn test_free_quiz_always_granted() {
        let free = quiz(false);
        assert!(evaluate_access(None, &free, false).granted);
        assert!(evaluate_access(Some(&user(ROLE_USER)), &free, false).granted);
        assert!(evaluate_access(Some(&user(ROLE_USER)), &free, true).granted);
    }

    #[test]
    fn test_paid_quiz_anonymous_needs_login() {
        let decision = evaluate_access(None, &quiz(true), false);
        assert!(!decision.granted);
        assert_eq!(decision.reason.as_deref(), Some(REASON_LOGIN_REQUIRED));
    }

    #[test]
    fn test_paid_quiz_purchase_flips_access() {
        let paid = quiz(true);
        let viewer = user(ROLE_USER);

        let before = evaluate_access(Some(&viewer), &paid, false);
        assert!(!before.granted);
        assert!(!before.reason.unwrap_or_default().is_empty());

        let after = evaluate_access(Some(&viewer), &paid, true);
        assert_eq!(after, AccessDecision::granted());
    }

    #[test]
    fn test_admin_is_granted_without_purchase() {
        assert!(evaluate_access(Some(&user(ROLE_ADMIN)), &quiz(true), false).granted);
    }

    #[test]
    fn test_denial_maps_to_forbidden() {
        let err = AccessDecision::denied(REASON_PURCHASE_REQUIRED)
            .ensure_granted()
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(AccessDecision::granted().ensure_granted().is_ok());
    }
}
