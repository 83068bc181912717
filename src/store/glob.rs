//! Glob Matching Module
//!
//! Redis-compatible `MATCH` pattern semantics: `*`, `?`, `[abc]`, `[^abc]`,
//! `[a-z]` and `\` escapes. Matching is byte-wise, like the server's.

// == Glob Match ==
/// Returns true if `key` matches the glob `pattern`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    match_bytes(pattern.as_bytes(), key.as_bytes())
}

fn match_bytes(mut pattern: &[u8], mut key: &[u8]) -> bool {
    while let Some(&p) = pattern.first() {
        match p {
            b'*' => {
                // Collapse consecutive stars
                while pattern.first() == Some(&b'*') {
                    pattern = &pattern[1..];
                }
                if pattern.is_empty() {
                    return true;
                }
                return (0..=key.len()).any(|i| match_bytes(pattern, &key[i..]));
            }
            b'?' => {
                if key.is_empty() {
                    return false;
                }
                key = &key[1..];
                pattern = &pattern[1..];
            }
            b'[' => {
                let Some((&ch, rest)) = key.split_first() else {
                    return false;
                };
                let (matched, consumed) = match_class(&pattern[1..], ch);
                if !matched {
                    return false;
                }
                key = rest;
                pattern = &pattern[1 + consumed..];
            }
            b'\\' if pattern.len() >= 2 => {
                if key.first() != Some(&pattern[1]) {
                    return false;
                }
                key = &key[1..];
                pattern = &pattern[2..];
            }
            literal => {
                if key.first() != Some(&literal) {
                    return false;
                }
                key = &key[1..];
                pattern = &pattern[1..];
            }
        }
    }

    key.is_empty()
}

/// Matches one byte against a bracket class.
///
/// `class` starts right after the opening `[`. Returns whether `ch` matched
/// and how many pattern bytes the class used, closing `]` included. An
/// unterminated class runs to the end of the pattern.
fn match_class(class: &[u8], ch: u8) -> (bool, usize) {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == ch;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&ch);
            i += 3;
        } else {
            matched |= class[i] == ch;
            i += 1;
        }
    }

    let consumed = if i < class.len() { i + 1 } else { i };
    (matched != negate, consumed)
}
