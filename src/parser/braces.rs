// Brace-balance scanning
//
// Without a C# grammar, block boundaries are recovered by counting `{` and `}`
// one byte at a time. The text is expected to be masked first (see `mask`) so
// braces inside comments and string literals do not count.

use std::ops::Range;

/// A `{ ... }` block located by brace balancing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Byte offset of the opening `{`
    pub open: usize,
    /// Byte offset of the matching `}`, or the input length when unterminated
    pub close: usize,
    /// False when input ended before the braces balanced
    pub terminated: bool,
}

impl BlockSpan {
    /// Byte range strictly between the braces
    pub fn body(&self) -> Range<usize> {
        (self.open + 1).min(self.close)..self.close
    }

    /// Offset just past the block
    pub fn end(&self) -> usize {
        if self.terminated {
            self.close + 1
        } else {
            self.close
        }
    }

    /// Whether `offset` lies inside the braces
    pub fn contains(&self, offset: usize) -> bool {
        offset > self.open && offset < self.close
    }
}

/// Find the block opened by the first `{` at or after `start`.
///
/// The block ends where the running open/close count returns to zero. If the
/// input ends first, the block is closed at end of input and marked
/// unterminated. Returns `None` when there is no `{` at or after `start`.
pub fn find_balanced_block(text: &str, start: usize) -> Option<BlockSpan> {
    let bytes = text.as_bytes();
    let open = start + bytes.get(start..)?.iter().position(|&b| b == b'{')?;
    let mut depth = 0usize;

    for (offset, &byte) in bytes.iter().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(BlockSpan {
                        open,
                        close: offset,
                        terminated: true,
                    });
                }
            }
            _ => {}
        }
    }

    Some(BlockSpan {
        open,
        close: bytes.len(),
        terminated: false,
    })
}

/// Opening braces minus closing braces in `text[from..to]`.
///
/// A positive result for the span between a type declaration and some later
/// offset means that offset is still inside the type's body.
pub fn brace_balance(text: &str, from: usize, to: usize) -> isize {
    let bytes = text.as_bytes();
    let to = to.min(bytes.len());
    if from >= to {
        return 0;
    }
    bytes[from..to].iter().fold(0isize, |acc, &b| match b {
        b'{' => acc + 1,
        b'}' => acc - 1,
        _ => acc,
    })
}

/// Offset of the delimiter closing the one at `open_at`, honoring nesting.
///
/// Used for parameter lists and generic argument lists. Returns `None` when
/// the byte at `open_at` is not `open` or the input ends unbalanced.
pub fn find_closing(text: &str, open_at: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open_at) != Some(&open) {
        return None;
    }
    let mut depth = 0usize;
    for (offset, &byte) in bytes.iter().enumerate().skip(open_at) {
        if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(offset);
            }
        }
    }
    None
}

/// Split on commas that are not nested in `<>`, `()`, `[]` or `{}`
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0isize;
    let mut last = 0;

    for (offset, byte) in text.bytes().enumerate() {
        match byte {
            b'<' | b'(' | b'[' | b'{' => depth += 1,
            b'>' | b')' | b']' | b'}' => depth -= 1,
            b',' if depth <= 0 => {
                parts.push(&text[last..offset]);
                last = offset + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[last..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
