/// Clean user-submitted HTML using the ammonia library.
///
/// Whitelist-based: safe formatting tags (<b>, <p>, <a>) survive, while
/// <script>, <iframe> and event-handler attributes are stripped.
/// Post bodies and comments pass through here before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::clean_html;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<p>Hello <b>world</b><script>alert(1)</script></p>");
        assert_eq!(cleaned, "<p>Hello <b>world</b></p>");
    }

    #[test]
    fn strips_event_handlers() {
        let cleaned = clean_html(r#"<a href="https://example.com" onclick="steal()">x</a>"#);
        assert!(!cleaned.contains("onclick"));
        assert!(cleaned.contains("https://example.com"));
    }
}
