// src/scanner.rs - Balanced delimiter scanning for [...] and (...) fields

/// Substring found between a pair of markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosed<'a> {
    /// Text between the markers, markers excluded
    pub content: &'a str,
    /// Byte offset of the opening marker
    pub open: usize,
    /// Byte offset of the first character after the closing marker
    pub next: usize,
}

/// The opening marker at `open` never found its closing partner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unbalanced {
    pub open: usize,
    pub left: char,
    pub right: char,
}

impl std::fmt::Display for Unbalanced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' at offset {} is never closed by '{}'",
            self.left, self.open, self.right
        )
    }
}

/// Find the first `left` marker at or after `from` and return everything up to
/// its matching `right` marker. Nested pairs are skipped.
///
/// Returns `Ok(None)` when there is no `left` marker at all.
pub fn scan_balanced(
    text: &str,
    from: usize,
    left: char,
    right: char,
) -> Result<Option<Enclosed<'_>>, Unbalanced> {
    let open = match text.get(from..).and_then(|rest| rest.find(left)) {
        Some(pos) => from + pos,
        None => return Ok(None),
    };

    let body_start = open + left.len_utf8();
    let mut depth = 0usize;

    for (pos, ch) in text[body_start..].char_indices() {
        if ch == left {
            depth += 1;
        } else if ch == right {
            if depth == 0 {
                let close = body_start + pos;
                return Ok(Some(Enclosed {
                    content: &text[body_start..close],
                    open,
                    next: close + right.len_utf8(),
                }));
            }
            depth -= 1;
        }
    }

    Err(Unbalanced { open, left, right })
}

/// The closing marker paired with a supported opening marker
pub fn closing_marker(left: char) -> Option<char> {
    match left {
        '[' => Some(']'),
        '(' => Some(')'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}
