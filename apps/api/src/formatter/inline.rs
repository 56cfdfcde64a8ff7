//! Inline span tokenizer — scans a single line left to right for the four
//! emphasis marker pairs (`**bold**`, `*italic*` / `_italic_`,
//! `~~strikethrough~~`, `` `code` ``).
//!
//! Scanning never re-visits a consumed prefix and `**` is matched before a
//! single `*`, so bold is never misread as two italics. Unmatched opening
//! markers degrade to literal text; the tokenizer cannot fail.

/// One parsed inline span. Nesting is intentionally not supported — the
/// upstream generation output never nests emphasis, and a flat span list is
/// what the preview renderer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Text(String),
    Bold(String),
    Italic(String),
    Strikethrough(String),
    Code(String),
}

const MARKERS: &[(&str, fn(String) -> InlineSpan)] = &[
    // Two-char markers first so `**`/`~~` win over their single-char prefixes.
    ("**", InlineSpan::Bold),
    ("~~", InlineSpan::Strikethrough),
    ("*", InlineSpan::Italic),
    ("_", InlineSpan::Italic),
    ("`", InlineSpan::Code),
];

/// Tokenizes one line into inline spans.
pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Nearest opening marker in the unconsumed suffix; marker table order
        // breaks position ties so `**` beats `*`.
        let next = MARKERS
            .iter()
            .filter_map(|(marker, build)| rest.find(marker).map(|at| (at, *marker, *build)))
            .min_by_key(|(at, marker, _)| (*at, std::cmp::Reverse(marker.len())));

        let Some((at, marker, build)) = next else {
            literal.push_str(rest);
            break;
        };

        let (before, from_marker) = rest.split_at(at);
        let after_open = &from_marker[marker.len()..];

        match after_open.find(marker) {
            Some(close) if close > 0 => {
                literal.push_str(before);
                if !literal.is_empty() {
                    spans.push(InlineSpan::Text(std::mem::take(&mut literal)));
                }
                spans.push(build(after_open[..close].to_string()));
                rest = &after_open[close + marker.len()..];
            }
            _ => {
                // No closer (or empty span like `**`): the marker is literal.
                literal.push_str(before);
                literal.push_str(marker);
                rest = after_open;
            }
        }
    }

    if !literal.is_empty() {
        spans.push(InlineSpan::Text(literal));
    }
    spans
}

/// Concatenates the raw text of all spans, dropping the markers.
pub fn spans_text(spans: &[InlineSpan]) -> String {
    spans
        .iter()
        .map(|s| match s {
            InlineSpan::Text(t)
            | InlineSpan::Bold(t)
            | InlineSpan::Italic(t)
            | InlineSpan::Strikethrough(t)
            | InlineSpan::Code(t) => t.as_str(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_single_span() {
        assert_eq!(
            parse_inline("no markers here"),
            vec![InlineSpan::Text("no markers here".to_string())]
        );
    }

    #[test]
    fn test_bold_is_not_two_italics() {
        assert_eq!(
            parse_inline("**bold**"),
            vec![InlineSpan::Bold("bold".to_string())]
        );
    }

    #[test]
    fn test_mixed_spans_in_order() {
        let spans = parse_inline("a **b** c *d* e ~~f~~ `g`");
        assert_eq!(
            spans,
            vec![
                InlineSpan::Text("a ".to_string()),
                InlineSpan::Bold("b".to_string()),
                InlineSpan::Text(" c ".to_string()),
                InlineSpan::Italic("d".to_string()),
                InlineSpan::Text(" e ".to_string()),
                InlineSpan::Strikethrough("f".to_string()),
                InlineSpan::Text(" ".to_string()),
                InlineSpan::Code("g".to_string()),
            ]
        );
    }

    #[test]
    fn test_underscore_italic() {
        assert_eq!(
            parse_inline("_soft_"),
            vec![InlineSpan::Italic("soft".to_string())]
        );
    }

    #[test]
    fn test_unmatched_opener_degrades_to_literal() {
        assert_eq!(
            parse_inline("**dangling bold"),
            vec![InlineSpan::Text("**dangling bold".to_string())]
        );
        assert_eq!(
            parse_inline("a ~~ b"),
            vec![InlineSpan::Text("a ~~ b".to_string())]
        );
    }

    #[test]
    fn test_empty_marker_pair_is_literal() {
        assert_eq!(
            parse_inline("x **** y"),
            vec![InlineSpan::Text("x **** y".to_string())]
        );
    }

    #[test]
    fn test_bold_inside_sentence_with_trailing_italic() {
        let spans = parse_inline("shipped **fast** and *well*");
        assert_eq!(spans[1], InlineSpan::Bold("fast".to_string()));
        assert_eq!(spans[3], InlineSpan::Italic("well".to_string()));
    }

    #[test]
    fn test_spans_text_strips_markers_only() {
        let spans = parse_inline("a **b** `c`");
        assert_eq!(spans_text(&spans), "a b c");
    }

    #[test]
    fn test_empty_input_yields_no_spans() {
        assert!(parse_inline("").is_empty());
    }
}
