// Comment and string masking for C# and Python text
//
// Every byte inside a comment, preprocessor directive or literal body is
// replaced with a space, except newlines which are kept. String and char
// delimiters stay in place. The output has the same byte length and line
// structure as the input, so offsets and line numbers found in the masked
// text apply to the input unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    /// `"..."`, including interpolated `$"..."`
    Regular,
    /// `@"..."` where `""` is an escaped quote
    Verbatim,
    /// `"""..."""`, or Python's `'''...'''`
    Raw(u8),
    Char,
}

/// Blank out comments, directives and string/char literal contents
pub fn mask_non_code(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    let mut i = 0;

    let blank = |out: &mut Vec<u8>, at: usize| {
        if out[at] != b'\n' {
            out[at] = b' ';
        }
    };

    while i < bytes.len() {
        let byte = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            State::Code => match byte {
                b'/' if next == Some(b'/') => {
                    state = State::LineComment;
                    blank(&mut out, i);
                    blank(&mut out, i + 1);
                    i += 2;
                    continue;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    blank(&mut out, i);
                    blank(&mut out, i + 1);
                    i += 2;
                    continue;
                }
                b'"' | b'\'' if bytes[i..].starts_with(&[byte; 3]) => {
                    state = State::Raw(byte);
                    i += 3;
                    continue;
                }
                b'"' => {
                    let verbatim = i > 0 && bytes[i - 1] == b'@'
                        || i > 1 && bytes[i - 1] == b'$' && bytes[i - 2] == b'@';
                    state = if verbatim {
                        State::Verbatim
                    } else {
                        State::Regular
                    };
                }
                b'\'' => state = State::Char,
                b'#' => {
                    // `#region`, `#if` and friends
                    state = State::LineComment;
                    blank(&mut out, i);
                }
                _ => {}
            },
            State::LineComment => {
                if byte == b'\n' {
                    state = State::Code;
                } else {
                    blank(&mut out, i);
                }
            }
            State::BlockComment => {
                blank(&mut out, i);
                if byte == b'*' && next == Some(b'/') {
                    blank(&mut out, i + 1);
                    state = State::Code;
                    i += 2;
                    continue;
                }
            }
            State::Regular | State::Char => {
                let quote = if state == State::Regular { b'"' } else { b'\'' };
                if byte == quote || byte == b'\n' {
                    // an unclosed literal stops at end of line
                    state = State::Code;
                } else if byte == b'\\' && next.is_some_and(|n| n != b'\n') {
                    blank(&mut out, i);
                    blank(&mut out, i + 1);
                    i += 2;
                    continue;
                } else {
                    blank(&mut out, i);
                }
            }
            State::Verbatim => {
                if byte == b'"' && next == Some(b'"') {
                    blank(&mut out, i);
                    blank(&mut out, i + 1);
                    i += 2;
                    continue;
                }
                if byte == b'"' {
                    state = State::Code;
                } else {
                    blank(&mut out, i);
                }
            }
            State::Raw(quote) => {
                if bytes[i..].starts_with(&[quote; 3]) {
                    state = State::Code;
                    i += 3;
                    continue;
                }
                blank(&mut out, i);
            }
        }

        i += 1;
    }

    // Masked regions start and end on ASCII delimiters, so multi-byte
    // characters are either copied whole or blanked whole.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_length_and_lines() {
        let text = "class A {\n  // { comment }\n  string s = \"}\";\n}\n";
        let masked = mask_non_code(text);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.lines().count(), text.lines().count());
        assert_eq!(masked.matches('{').count(), 1);
        assert_eq!(masked.matches('}').count(), 1);
    }

    #[test]
    fn test_block_comment() {
        let masked = mask_non_code("a /* { \n } */ b");
        assert_eq!(masked, format!("a{}\n{}b", " ".repeat(6), " ".repeat(6)));
    }

    #[test]
    fn test_regular_string_with_escape() {
        let masked = mask_non_code(r#"x = "a\"{b"; y"#);
        assert_eq!(masked, r#"x = "     "; y"#);
    }

    #[test]
    fn test_verbatim_string() {
        let masked = mask_non_code(r#"p = @"C:\dir ""{q}"""; z"#);
        assert!(masked.ends_with("; z"));
        assert!(!masked.contains('{'));
        assert_eq!(masked.len(), r#"p = @"C:\dir ""{q}"""; z"#.len());
    }

    #[test]
    fn test_raw_string() {
        let text = "var j = \"\"\"\n{ \"k\": 1 }\n\"\"\";\nclass B { }";
        let masked = mask_non_code(text);
        assert_eq!(masked.matches('{').count(), 1);
        assert!(masked.contains("class B { }"));
    }

    #[test]
    fn test_char_literals() {
        let masked = mask_non_code("if (c == '{' || c == '\\'') { }");
        assert_eq!(masked.matches('{').count(), 1);
        assert_eq!(masked.matches('}').count(), 1);
    }

    #[test]
    fn test_interpolated_string() {
        let masked = mask_non_code("log($\"{name} done\"); }");
        assert_eq!(masked.matches('{').count(), 0);
        assert_eq!(masked.matches('}').count(), 1);
    }

    #[test]
    fn test_url_in_string_is_not_comment() {
        let masked = mask_non_code("var u = \"http://x\"; int n = 1;");
        assert!(masked.contains("int n = 1;"));
    }

    #[test]
    fn test_preprocessor_lines() {
        let masked = mask_non_code("#region Helpers
    void F() { }
#endregion
");
        assert_eq!(masked.lines().next().map(str::trim), Some(""));
        assert!(masked.contains("void F() { }"));
        assert!(!masked.contains("endregion"));
    }

    #[test]
    fn test_non_ascii_inside_comment() {
        let text = "// café\nclass C {}";
        let masked = mask_non_code(text);
        assert_eq!(masked.len(), text.len());
        assert!(masked.ends_with("class C {}"));
    }

    #[test]
    fn test_escape_before_newline_ends_string() {
        let text = "var s = \"open \\\nclass C { }\n";
        let masked = mask_non_code(text);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.lines().nth(1), Some("class C { }"));
    }

    #[test]
    fn test_python_comments_and_docstrings() {
        let text = "# cached (this is slow)\nclass Shape:\n    '''Common interface\n    for shapes.'''\n    \"\"\"More interface text\"\"\"\n    def area(self): ...\n";
        let masked = mask_non_code(text);
        assert!(!masked.contains("this"));
        assert!(!masked.contains("interface"));
        assert!(masked.contains("class Shape:"));
        assert!(masked.contains("def area(self): ..."));
    }
}
