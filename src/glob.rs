//! Translation of *nix-style wildcard patterns into regular expressions.
//!
//! Rules are tried in a fixed order at every position of the input:
//!
//! 1. a path separator (`/` or an escaped backslash `\\`) becomes a class
//!    matching either separator;
//! 2. any other backslash escape is copied verbatim (two characters);
//! 3. `?` becomes `.`;
//! 4. `.` becomes `\.`;
//! 5. `*` becomes `.*` (greedy) or `.*?` (reluctant);
//! 6. everything else is copied unchanged.
//!
//! The output is a regex fragment; callers anchor it themselves.

const SEPARATOR_CLASS: &str = r"[/\\]";

/// Convert a glob pattern to a regex fragment.
pub fn translate(pattern: &str, greedy: bool) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '/' {
            out.push_str(SEPARATOR_CLASS);
            i += 1;
            continue;
        }
        if c == '\\' {
            match chars.get(i + 1) {
                Some('\\') => out.push_str(SEPARATOR_CLASS),
                Some(&next) => {
                    out.push('\\');
                    out.push(next);
                }
                // a dangling backslash can only mean itself
                None => out.push_str(r"\\"),
            }
            i += 2;
            continue;
        }
        match c {
            '?' => out.push('.'),
            '.' => out.push_str(r"\."),
            '*' if greedy => out.push_str(".*"),
            '*' => out.push_str(".*?"),
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Strip one level of backslash escaping from every occurrence of `c`.
///
/// Apply once per raw pattern, before [`translate`]; running it on a
/// translated pattern would eat escapes that `translate` relies on.
pub fn de_escape(c: char, buf: &mut String) {
    let mut out = String::with_capacity(buf.len());
    let mut chars = buf.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&c) {
            chars.next();
            out.push(c);
        } else {
            out.push(ch);
        }
    }
    *buf = out;
}
