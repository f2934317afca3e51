use std::sync::OnceLock;

use cr_core::{FormatError, MatchGroups};
use regex::Regex;

fn template_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|\{|\}").expect("template regex must compile")
    })
}

/// Substitutes `{name}` fields in `template` from the match groups, following
/// the named-field subset of Python's `str.format`.
pub fn format_reply(template: &str, groups: &MatchGroups) -> Result<String, FormatError> {
    let mut output = String::with_capacity(template.len());
    let mut last_index = 0usize;
    for captures in template_regex().captures_iter(template) {
        let Some(full) = captures.get(0) else {
            continue;
        };
        output.push_str(&template[last_index..full.start()]);
        match (full.as_str(), captures.get(1)) {
            ("{{", _) => output.push('{'),
            ("}}", _) => output.push('}'),
            (_, Some(field)) => output.push_str(&render_field(field.as_str(), groups)?),
            ("}", None) => return Err(FormatError::StrayClosingBrace),
            _ => return Err(FormatError::UnclosedBrace),
        }
        last_index = full.end();
    }
    output.push_str(&template[last_index..]);
    Ok(output)
}

fn render_field(field: &str, groups: &MatchGroups) -> Result<String, FormatError> {
    let name_end = field.find(|c: char| c == '!' || c == ':').unwrap_or(field.len());
    let name = &field[..name_end];
    let rest = &field[name_end..];

    let (conversion, spec) = match rest.strip_prefix('!') {
        Some(after) => {
            let mut chars = after.chars();
            let conversion = chars.next();
            let remainder = chars.as_str();
            let spec = if remainder.is_empty() {
                ""
            } else if let Some(spec) = remainder.strip_prefix(':') {
                spec
            } else {
                return Err(FormatError::UnknownConversion {
                    conversion: after.to_string(),
                });
            };
            match conversion {
                Some(conversion) => (Some(conversion), spec),
                None => {
                    return Err(FormatError::UnknownConversion {
                        conversion: String::new(),
                    })
                }
            }
        }
        None => (None, rest.strip_prefix(':').unwrap_or("")),
    };

    let key_end = name.find(|c: char| c == '.' || c == '[').unwrap_or(name.len());
    let key = &name[..key_end];
    if key.is_empty() || key.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormatError::PositionalField {
            field: name.to_string(),
        });
    }
    let value = groups.get(key).ok_or_else(|| FormatError::MissingKey {
        key: key.to_string(),
    })?;
    if key_end < name.len() {
        return Err(FormatError::FieldAccess {
            field: name.to_string(),
        });
    }

    let converted = match conversion {
        None | Some('s') => value.clone(),
        Some('r') => python_repr(value, false),
        Some('a') => python_repr(value, true),
        Some(other) => {
            return Err(FormatError::UnknownConversion {
                conversion: other.to_string(),
            })
        }
    };
    apply_spec(name, converted, spec)
}

fn python_repr(value: &str, ascii_only: bool) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if ascii_only && !c.is_ascii() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else if code <= 0xffff {
                    out.push_str(&format!("\\u{:04x}", code));
                } else {
                    out.push_str(&format!("\\U{:08x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn apply_spec(field: &str, value: String, spec: &str) -> Result<String, FormatError> {
    if spec.is_empty() {
        return Ok(value);
    }
    let invalid = || FormatError::InvalidSpec {
        field: field.to_string(),
        spec: spec.to_string(),
    };

    let chars: Vec<char> = spec.chars().collect();
    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
    let mut index = 0usize;
    let mut fill = ' ';
    let mut align = None;
    if chars.len() >= 2 && is_align(chars[1]) {
        fill = chars[0];
        align = Some(chars[1]);
        index = 2;
    } else if is_align(chars[0]) {
        align = Some(chars[0]);
        index = 1;
    }
    if align == Some('=') {
        return Err(invalid());
    }
    if chars.get(index) == Some(&'0') {
        if align.is_none() {
            fill = '0';
        }
        index += 1;
    }

    let width = read_number(&chars, &mut index);
    let precision = if chars.get(index) == Some(&'.') {
        index += 1;
        Some(read_number(&chars, &mut index).ok_or_else(invalid)?)
    } else {
        None
    };
    if chars.get(index) == Some(&'s') {
        index += 1;
    }
    if index != chars.len() {
        return Err(invalid());
    }

    let text: String = match precision {
        Some(precision) => value.chars().take(precision).collect(),
        None => value,
    };
    let len = text.chars().count();
    let Some(width) = width.filter(|width| *width > len) else {
        return Ok(text);
    };
    let pad = width - len;
    let (left, right) = match align.unwrap_or('<') {
        '>' => (pad, 0),
        '^' => (pad / 2, pad - pad / 2),
        _ => (0, pad),
    };
    let mut out = String::with_capacity(text.len() + pad * fill.len_utf8());
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(&text);
    out.extend(std::iter::repeat(fill).take(right));
    Ok(out)
}

fn read_number(chars: &[char], index: &mut usize) -> Option<usize> {
    let start = *index;
    while chars.get(*index).is_some_and(char::is_ascii_digit) {
        *index += 1;
    }
    if *index == start {
        return None;
    }
    chars[start..*index].iter().collect::<String>().parse().ok()
}

#[cfg(test)]
mod format_tests {
    use super::*;

    fn groups(entries: &[(&str, &str)]) -> MatchGroups {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn format_reply_substitutes_named_fields() {
        let values = groups(&[("name", "Sam"), ("thing", "tea")]);
        let rendered =
            format_reply("hi {name}, you like {thing}?", &values).expect("format should pass");
        assert_eq!(rendered, "hi Sam, you like tea?");
    }

    #[test]
    fn format_reply_keeps_plain_text_and_escapes() {
        let rendered =
            format_reply("{{literal}} and }}", &MatchGroups::new()).expect("format should pass");
        assert_eq!(rendered, "{literal} and }");
        assert_eq!(
            format_reply("no fields", &MatchGroups::new()).expect("format should pass"),
            "no fields"
        );
    }

    #[test]
    fn format_reply_reports_missing_key() {
        let error = format_reply("hi {name}", &MatchGroups::new()).expect_err("missing key");
        assert_eq!(
            error,
            FormatError::MissingKey {
                key: "name".to_string()
            }
        );
    }

    #[test]
    fn format_reply_rejects_positional_and_access_fields() {
        let values = groups(&[("name", "Sam")]);
        assert!(matches!(
            format_reply("{}", &values),
            Err(FormatError::PositionalField { .. })
        ));
        assert!(matches!(
            format_reply("{0}", &values),
            Err(FormatError::PositionalField { .. })
        ));
        assert!(matches!(
            format_reply("{name.upper}", &values),
            Err(FormatError::FieldAccess { .. })
        ));
        assert!(matches!(
            format_reply("{other[0]}", &values),
            Err(FormatError::MissingKey { .. })
        ));
    }

    #[test]
    fn format_reply_rejects_stray_braces() {
        assert_eq!(
            format_reply("oops }", &MatchGroups::new()),
            Err(FormatError::StrayClosingBrace)
        );
        assert_eq!(
            format_reply("oops {", &MatchGroups::new()),
            Err(FormatError::UnclosedBrace)
        );
    }

    #[test]
    fn format_reply_applies_conversions() {
        let values = groups(&[("name", "it's"), ("city", "Zürich")]);
        assert_eq!(
            format_reply("{name!r}", &values).expect("repr should pass"),
            "\"it's\""
        );
        assert_eq!(
            format_reply("{city!a}", &values).expect("ascii should pass"),
            "'Z\\xfcrich'"
        );
        assert_eq!(
            format_reply("{city!s}", &values).expect("str should pass"),
            "Zürich"
        );
        assert!(matches!(
            format_reply("{city!x}", &values),
            Err(FormatError::UnknownConversion { .. })
        ));
        assert!(matches!(
            format_reply("{city!}", &values),
            Err(FormatError::UnknownConversion { .. })
        ));
    }

    #[test]
    fn format_reply_applies_string_specs() {
        let values = groups(&[("name", "Sam")]);
        let cases = [
            ("[{name:6}]", "[Sam   ]"),
            ("[{name:>6}]", "[   Sam]"),
            ("[{name:*^7}]", "[**Sam**]"),
            ("[{name:^6}]", "[ Sam  ]"),
            ("[{name:.2}]", "[Sa]"),
            ("[{name:05}]", "[Sam00]"),
            ("[{name:2s}]", "[Sam]"),
            ("[{name!r:>7}]", "[  'Sam']"),
        ];
        for (template, expected) in cases {
            assert_eq!(
                format_reply(template, &values).expect("spec should pass"),
                expected,
                "template {}",
                template
            );
        }
    }

    #[test]
    fn format_reply_rejects_numeric_only_specs() {
        let values = groups(&[("name", "Sam")]);
        for template in ["{name:=5}", "{name:+}", "{name:d}", "{name:.}", "{name:,}"] {
            assert!(
                matches!(
                    format_reply(template, &values),
                    Err(FormatError::InvalidSpec { .. })
                ),
                "template {}",
                template
            );
        }
    }
}
