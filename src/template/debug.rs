//! Diagnostic parsing
//!
//! Plain parsing only reports that a string does not match. The diagnostic
//! parser matches progressively shorter prefixes of the flattened segment list
//! to find the first segment that breaks, the character offset where it breaks
//! and the fields parsed before that point.

use regex::Regex;

use super::{Segment, Template};
use crate::error::DebugParseError;
use crate::value::Fields;

impl Template {
    /// Parse a string, locating the first failing segment on mismatch
    ///
    /// Slower than [`Template::parse`]: one expression is compiled per prefix
    /// length tried.
    pub fn parse_debug(&self, string: &str) -> Result<Fields, DebugParseError> {
        let input = self.normalize_input(string);
        let input = input.as_ref();
        let segments = self.segments(false);
        let count = segments.len();

        let groups: Vec<String> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| format!("(?P<s{}>{})", i, segment_regex(segment)))
            .collect();

        for matched in (1..=count).rev() {
            let expression = format!("^{}", groups[..matched].concat());
            let regex = Regex::new(&expression).map_err(|e| DebugParseError::Segment {
                message: e.to_string(),
                char_index: 0,
                segment_index: 0,
                fields: Fields::new(),
            })?;
            let Some(captures) = regex.captures(input) else {
                continue;
            };

            let mut fields = Fields::new();
            for (i, segment) in segments[..matched].iter().enumerate() {
                let Segment::Token(token) = segment else {
                    continue;
                };
                let Some(capture) = captures.name(&format!("s{}", i)) else {
                    continue;
                };
                let char_index = char_offset(input, capture.start());

                let value = token.value_from_text(capture.as_str()).map_err(|e| {
                    DebugParseError::Segment {
                        message: e.to_string(),
                        char_index,
                        segment_index: i,
                        fields: fields.clone(),
                    }
                })?;

                if let Some(previous) = fields.get(token.name()) {
                    if previous != &value {
                        // The disagreeing field is not reported as parsed
                        let previous = fields.remove(token.name()).unwrap_or_else(|| value.clone());
                        return Err(DebugParseError::MismatchToken {
                            token: token.name().to_string(),
                            previous,
                            value,
                            char_index,
                            segment_index: i,
                            fields,
                        });
                    }
                }
                fields.insert(token.name().to_string(), value);
            }

            let end = captures.get(0).map(|m| m.end()).unwrap_or(0);

            if matched == count {
                if end != input.len() {
                    return Err(DebugParseError::ExcessString {
                        char_index: char_offset(input, end),
                        segment_index: count,
                        fields,
                    });
                }
                return Ok(fields);
            }

            let next = &segments[matched];
            let (label, offset) = match next {
                Segment::Literal(text) => (format!("'{}'", text), literal_divergence(text, input, end)),
                Segment::Token(token) => (format!("{{{}}}", token.name()), end),
                Segment::Template(child) => (format!("{{@{}}}", child.name()), end),
            };
            return Err(DebugParseError::Segment {
                message: format!("Match fails at segment ({}) {}", matched, label),
                char_index: char_offset(input, offset),
                segment_index: matched,
                fields,
            });
        }

        Err(DebugParseError::Segment {
            message: "String does not match at all".to_string(),
            char_index: 0,
            segment_index: 0,
            fields: Fields::new(),
        })
    }
}

/// Expression for one flattened segment, without backreferences
fn segment_regex(segment: &Segment) -> String {
    match segment {
        Segment::Literal(text) => regex::escape(text),
        Segment::Token(token) => token.regex().to_string(),
        Segment::Template(child) => child.regex(),
    }
}

/// Number of characters before a byte offset, clamped to the input length
fn char_offset(input: &str, byte_offset: usize) -> usize {
    match input.get(..byte_offset) {
        Some(prefix) => prefix.chars().count(),
        None => input.chars().count(),
    }
}

/// Byte offset of the first character where `text` and the input from
/// `start` disagree; the end of input when the input runs out first
fn literal_divergence(text: &str, input: &str, start: usize) -> usize {
    let rest = input.get(start..).unwrap_or("");
    text.char_indices()
        .zip(rest.chars())
        .find(|((_, expected), actual)| expected != actual)
        .map(|((offset, _), _)| start + offset)
        .unwrap_or(start + rest.len().min(text.len()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::token::{Token, TokenRef};
    use crate::value::TokenValue;
    use pretty_assertions::assert_eq;

    fn precision_template() -> Template {
        let int: TokenRef = Arc::new(Token::int("int").unwrap());
        let string: TokenRef = Arc::new(Token::string("str").unwrap());
        Template::new(
            "debug",
            vec!["abc".into(), int.into(), ".def.".into(), string.into()],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_debug_success() {
        let template = precision_template();
        let fields = template.parse_debug("abc12.def.xyz").unwrap();
        assert_eq!(fields.get("int"), Some(&TokenValue::Int(12)));
        assert_eq!(fields.get("str"), Some(&TokenValue::from("xyz")));
    }

    #[test]
    fn test_parse_debug_literal_divergence() {
        let template = precision_template();
        let err = template.parse_debug("abc12.dxf.xyz").unwrap_err();
        assert_eq!(err.char_index(), 7);
        assert_eq!(err.segment_index(), 2);
        assert_eq!(err.to_string(), "Match fails at segment (2) '.def.'");

        let mut expected = Fields::new();
        expected.insert("int".to_string(), TokenValue::Int(12));
        assert_eq!(err.fields(), &expected);
    }

    #[test]
    fn test_parse_debug_token_failure() {
        let template = precision_template();
        let err = template.parse_debug("abcxy.def.xyz").unwrap_err();
        assert_eq!(err.char_index(), 3);
        assert_eq!(err.segment_index(), 1);
        assert!(err.fields().is_empty());
        assert_eq!(err.to_string(), "Match fails at segment (1) {int}");
    }

    #[test]
    fn test_parse_debug_truncated_literal() {
        let template = precision_template();
        let err = template.parse_debug("abc12.de").unwrap_err();
        assert_eq!(err.char_index(), 8);
        assert_eq!(err.segment_index(), 2);
    }

    #[test]
    fn test_parse_debug_no_match() {
        let template = precision_template();
        let err = template.parse_debug("xyz").unwrap_err();
        assert_eq!(err.to_string(), "String does not match at all");
        assert_eq!(err.char_index(), 0);
        assert_eq!(err.segment_index(), 0);
    }

    #[test]
    fn test_parse_debug_excess() {
        let template = precision_template();
        let err = template.parse_debug("abc12.def.xyz/more").unwrap_err();
        assert!(matches!(err, DebugParseError::ExcessString { .. }));
        assert_eq!(err.char_index(), 13);
        assert_eq!(err.segment_index(), 4);
        assert_eq!(err.fields().len(), 2);
    }

    #[test]
    fn test_parse_debug_mismatched_repeat() {
        let n: TokenRef = Arc::new(Token::int("n").unwrap());
        let template = Template::new(
            "repeat",
            vec![Arc::clone(&n).into(), "_".into(), n.into()],
        )
        .unwrap();

        let err = template.parse_debug("1_2").unwrap_err();
        assert_eq!(err.to_string(), "Mismatched values for token {n}: 1 != 2");
        assert_eq!(err.char_index(), 2);
        assert_eq!(err.segment_index(), 2);
        assert!(err.fields().is_empty());
    }

    #[test]
    fn test_parse_debug_counts_characters() {
        let string: TokenRef = Arc::new(Token::string("str").unwrap());
        let template = Template::new(
            "accent",
            vec!["é_".into(), string.into(), "_x".into()],
        )
        .unwrap();

        let err = template.parse_debug("é_abc_y").unwrap_err();
        assert_eq!(err.char_index(), 6);
        assert_eq!(err.segment_index(), 2);

        let err = template.parse_debug("é_ÿ_x").unwrap_err();
        assert_eq!(err.char_index(), 2);
        assert_eq!(err.segment_index(), 1);

        let err = template.parse_debug("é_abc_xü").unwrap_err();
        assert!(matches!(err, DebugParseError::ExcessString { .. }));
        assert_eq!(err.char_index(), 7);
    }

    #[test]
    fn test_char_offset_clamps() {
        assert_eq!(char_offset("abc", 1), 1);
        assert_eq!(char_offset("abc", 10), 3);
        assert_eq!(char_offset("äbc", 2), 1);
    }

    #[test]
    fn test_literal_divergence_offsets() {
        assert_eq!(literal_divergence("_shot", "seq_sot", 3), 5);
        assert_eq!(literal_divergence("_shot", "seq_sh", 3), 6);
    }
}
