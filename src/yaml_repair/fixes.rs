use regex::Regex;

/// Returns the content of the first fenced code block, or the raw input
/// unchanged if no fence is found. Handles ```yaml, ```yml and bare ```
/// fences, and an unterminated trailing fence.
pub fn strip_fences(raw: &str) -> String {
    let re = Regex::new(r"(?s)```(?:yaml|yml)?\s*\n(.*?)(?:\n```|$)").unwrap();
    match re.captures(raw) {
        Some(caps) => caps[1].trim().to_string(),
        None => raw.to_string(),
    }
}

/// Replaces each leading tab with two spaces, line by line.
pub fn fix_tabs(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let trimmed = line.trim_start_matches('\t');
            let tab_count = line.len() - trimmed.len();
            format!("{}{}", "  ".repeat(tab_count), trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips a trailing comma (optionally followed by whitespace) at the end
/// of each line.
pub fn fix_trailing_commas(raw: &str) -> String {
    let re = Regex::new(r"(?m),\s*$").unwrap();
    re.replace_all(raw, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fences_extracts_first_block() {
        let raw = "prose\n```yaml\nkey: value\n```\nmore prose";
        assert_eq!(strip_fences(raw), "key: value");
    }

    #[test]
    fn strip_fences_passthrough_with_no_fence() {
        let raw = "key: value";
        assert_eq!(strip_fences(raw), "key: value");
    }

    #[test]
    fn strip_fences_handles_unterminated_fence() {
        let raw = "```yaml\nkey: value";
        assert_eq!(strip_fences(raw), "key: value");
    }

    #[test]
    fn fix_tabs_converts_leading_tabs_only() {
        let raw = "\t\tkey:\tvalue";
        assert_eq!(fix_tabs(raw), "    key:\tvalue");
    }

    #[test]
    fn fix_trailing_commas_strips_end_of_line() {
        let raw = "items:\n  - a,\n  - b ,\n  - c";
        assert_eq!(fix_trailing_commas(raw), "items:\n  - a\n  - b\n  - c");
    }
}
