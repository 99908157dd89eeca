use crate::models::quiz::CreateQuizRequest;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe formatting tags (<b>, <p>, <code>) survive, while
/// <script>, <iframe> and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes every free-text field an admin authored before it is stored.
/// Options are plain text and are sanitized as well, since clients render them.
pub fn sanitize_quiz(mut req: CreateQuizRequest) -> CreateQuizRequest {
    req.title = clean_html(&req.title);
    req.description = clean_html(&req.description);
    req.subject = req.subject.as_deref().map(clean_html);

    for question in &mut req.questions {
        question.text = clean_html(&question.text);
        question.options = question.options.iter().map(|o| clean_html(o)).collect();
        question.explanation = question.explanation.as_deref().map(clean_html);
    }

    req
}
