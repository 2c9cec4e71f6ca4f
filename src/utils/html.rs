use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization for admin-supplied rich text (quiz
/// descriptions, question prompts, explanations): safe tags like <b> and
/// <p> survive, <script>/<iframe> and event-handler attributes do not.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
