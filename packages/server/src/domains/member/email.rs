//! Confirmation link and email body

use url::Url;

use crate::domains::member::models::StudentId;

pub const CONFIRMATION_SUBJECT: &str = "Club membership confirmation";

/// Build `{base}/confirm?id=..&confirmation_token=..`.
///
/// Any path already on the base URL is kept, so the service can live under a prefix.
pub fn confirmation_link(base_url: &Url, student_id: StudentId, token: &str) -> Url {
    let mut link = base_url.clone();
    let path = format!("{}/confirm", base_url.path().trim_end_matches('/'));
    link.set_path(&path);
    link.set_fragment(None);
    link.query_pairs_mut()
        .clear()
        .append_pair("id", &student_id.to_string())
        .append_pair("confirmation_token", token);
    link
}

pub fn confirmation_html(link: &Url) -> String {
    format!(
        "Click this link to confirm your membership: <a href=\"{link}\">{link}</a>",
        link = link
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::member::models::generate_confirmation_token;

    #[test]
    fn test_link_format() {
        let base = Url::parse("https://epclub.example.org").unwrap();
        let link = confirmation_link(&base, 900111111, "abc_-123");
        assert_eq!(
            link.as_str(),
            "https://epclub.example.org/confirm?id=900111111&confirmation_token=abc_-123"
        );
    }

    #[test]
    fn test_link_keeps_base_path() {
        let base = Url::parse("https://example.org/club/").unwrap();
        let link = confirmation_link(&base, 1, "t");
        assert_eq!(link.path(), "/club/confirm");
    }

    #[test]
    fn test_generated_token_needs_no_encoding() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let token = generate_confirmation_token();
        let link = confirmation_link(&base, 900222222, &token);
        assert!(link.as_str().ends_with(&format!("confirmation_token={}", token)));
    }

    #[test]
    fn test_html_contains_link_twice() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let link = confirmation_link(&base, 7, "tok");
        let html = confirmation_html(&link);
        assert_eq!(html.matches(link.as_str()).count(), 2);
        assert!(html.starts_with("Click this link to confirm your membership"));
    }
}
