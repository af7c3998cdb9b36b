use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Length in user-perceived characters (grapheme clusters).
pub fn char_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Display width of a string in terminal cells.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = display_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Pad (or truncate) to exactly `cells` terminal cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}

/// Uppercase the first character, leave the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_counts_graphemes() {
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("e\u{301}"), 1);
        assert_eq!(char_len(""), 0);
    }

    #[test]
    fn truncate_wide_chars() {
        assert_eq!(truncate_to_width("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate_to_width("短い文字列", 5), "短い\u{2026}");
        assert_eq!(truncate_to_width("fits", 10), "fits");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn pad_fills_to_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcdef", 4), "abc\u{2026}");
    }

    #[test]
    fn capitalize() {
        assert_eq!(capitalize_first("buy milk"), "Buy milk");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("élan"), "Élan");
    }
}
