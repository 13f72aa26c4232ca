//! Cleanup of free-text form input before it reaches storage.

/// Strip markup tags, drop control characters, collapse whitespace runs and trim.
///
/// A `<` that opens a regex group name (`(?P<name>` or `(?<name>`) is kept.
pub fn sanitize_text_field(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut prev: [Option<char>; 3] = [None; 3];

    for c in input.chars() {
        if in_tag {
            if c == '>' {
                in_tag = false;
            }
            continue;
        }
        if c == '<' && !opens_group_name(prev) {
            in_tag = true;
            continue;
        }
        stripped.push(c);
        prev = [prev[1], prev[2], Some(c)];
    }

    let mut out = String::with_capacity(stripped.len());
    for word in stripped
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn opens_group_name(prev: [Option<char>; 3]) -> bool {
    matches!(
        prev,
        [_, Some('('), Some('?')] | [Some('('), Some('?'), Some('P')]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_collapses_whitespace() {
        assert_eq!(sanitize_text_field("  about \t\n us  "), "about us");
    }

    #[test]
    fn test_strips_tags() {
        assert_eq!(sanitize_text_field("<b>news</b>/latest"), "news/latest");
        assert_eq!(sanitize_text_field("promo<script>x"), "promo");
        assert_eq!(sanitize_text_field("a?<script>alert(1)</script>"), "a?alert(1)");
        assert_eq!(sanitize_text_field("x?P<b>y</b>"), "x?Py");
    }

    #[test]
    fn test_drops_control_characters() {
        assert_eq!(sanitize_text_field("pro\u{0007}mo"), "pro mo");
    }

    #[test]
    fn test_keeps_named_groups() {
        assert_eq!(
            sanitize_text_field("archive/(?P<year>[0-9]{4})"),
            "archive/(?P<year>[0-9]{4})"
        );
        assert_eq!(
            sanitize_text_field("archive/(?<year>[0-9]{4})"),
            "archive/(?<year>[0-9]{4})"
        );
    }
}
