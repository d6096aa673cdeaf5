/// Reproduces the documentation site's URL slugging rule so catalog links
/// land on the published pages. The step order is load-bearing: the final
/// segment is truncated before digits are removed, and edge hyphens are
/// trimmed last. Double hyphens left behind by digit removal are kept.
pub fn sanitize_link(path: &str) -> String {
    let clean = path
        .replace("_-_", "-")
        .replace('_', "-")
        .replace(' ', "-")
        .replace('.', "")
        .replace(':', "")
        .replace('\'', "")
        .replace('"', "")
        .to_lowercase();

    let mut parts: Vec<String> = clean.split('/').map(str::to_string).collect();
    if let Some(last) = parts.last_mut() {
        *last = last.chars().take(50).collect();
    }
    let cut: String = parts.join("/");

    let without_digits: String = cut.chars().filter(|c| !c.is_numeric()).collect();

    without_digits
        .split('/')
        .map(|part| part.trim_matches('-'))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_compound_separators() {
        assert_eq!(
            sanitize_link("2.4_Formats_and_Performance/Intro_-_Lecture"),
            "formats-and-performance/intro-lecture"
        );
    }

    #[test]
    fn digit_removal_leaves_double_hyphens_uncollapsed() {
        assert_eq!(sanitize_link("9_Appendix/Section_10_Notes"), "appendix/section--notes");
    }

    #[test]
    fn only_the_final_segment_is_truncated() {
        let long = "a".repeat(60);
        let out = sanitize_link(&format!("{long}/{long}"));
        let parts: Vec<&str> = out.split('/').collect();
        assert_eq!(parts[0].len(), 60);
        assert_eq!(parts[1].len(), 50);
    }

    #[test]
    fn truncation_happens_before_digit_removal() {
        // Fifty digits push the letters past the cut, so nothing survives
        // in the final segment.
        let input = format!("intro/{}abc", "1".repeat(50));
        assert_eq!(sanitize_link(&input), "intro/");
    }

    #[test]
    fn reapplying_is_a_no_op() {
        let once = sanitize_link("2.4_Formats_and_Performance/Intro_-_Lecture");
        assert_eq!(sanitize_link(&once), once);
    }
}
