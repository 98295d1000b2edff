/// Text processing utilities
pub mod text {
    const FENCE: &str = "```";

    /// Remove one surrounding markdown code fence (```` ``` ```` or ```` ```json ````), if present.
    pub fn strip_code_fence(raw: &str) -> String {
        let mut body = raw.trim();

        if let Some(rest) = body.strip_prefix(FENCE) {
            // Drop the info string ("json", "JSON", ...) along with the opening line
            body = match rest.find('\n') {
                Some(newline) => &rest[newline + 1..],
                None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
            };
        }

        if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
            body = rest;
        }

        body.trim().to_string()
    }

    pub fn is_blank(text: &str) -> bool {
        text.trim().is_empty()
    }

    /// Truncate text to a maximum length, trying to break at sentence boundaries
    pub fn smart_truncate(text: &str, max_length: usize) -> String {
        if text.chars().count() <= max_length {
            return text.to_string();
        }

        let truncated: String = text.chars().take(max_length).collect();
        if let Some(last_sentence) = truncated.rfind('.') {
            truncated[..last_sentence + 1].to_string()
        } else if let Some(last_space) = truncated.rfind(' ') {
            format!("{}...", &truncated[..last_space])
        } else {
            format!("{}...", truncated)
        }
    }

    /// Distinct lowercase keywords in order of first appearance
    pub fn extract_keywords(text: &str) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.chars().count() > 3 && !is_stop_word(&word) && !keywords.contains(&word) {
                keywords.push(word);
            }
        }
        keywords
    }

    /// Check if a word is a common stop word
    pub fn is_stop_word(word: &str) -> bool {
        matches!(
            word,
            "the" | "and" | "but" | "with" | "from" | "into" | "this" | "that" | "these" | "those" |
            "have" | "been" | "were" | "will" | "would" | "could" | "should" | "about" | "their" |
            "there" | "which" | "while" | "your" | "they" | "them" | "than" | "then" | "also"
        )
    }
}

/// URL utilities
pub mod url {
    use ::url::Url;

    /// Give a scheme-less asset URL the `https:` scheme and check it is absolute.
    ///
    /// `//cdn.example.com/a.png` becomes `https://cdn.example.com/a.png`; URLs that
    /// already carry a scheme are kept. Returns `None` when the result does not parse.
    pub fn normalize_asset_url(raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let candidate = if raw.starts_with("//") {
            format!("https:{}", raw)
        } else if has_scheme(raw) {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };

        match Url::parse(&candidate) {
            Ok(url) if url.has_host() => Some(candidate),
            _ => None,
        }
    }

    fn has_scheme(raw: &str) -> bool {
        match raw.split_once("://") {
            Some((scheme, _)) => {
                !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            }
            None => false,
        }
    }
}
