//! Pure line-splice used by the injector.
//!
//! The file is treated as an immutable value: `splice` takes the full current
//! text and returns the full new text. Nothing here touches the filesystem,
//! which keeps every matching rule testable without I/O.

use crate::domain::{Anchor, DomainError, LineEnding, Position};

/// Result of a successful splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    /// The complete new file text.
    pub text: String,
    /// 1-based line number of the anchor line that was used.
    pub anchor_line: usize,
    /// Number of lines that contained the anchor.
    pub match_count: usize,
}

/// 1-based numbers of every line containing `anchor`, top to bottom.
pub fn find_anchor_lines(text: &str, anchor: &Anchor) -> Vec<usize> {
    text.split_inclusive('\n')
        .enumerate()
        .filter(|(_, line)| anchor.matches(strip_terminator(line)))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Insert `block` as whole lines next to the first line containing `anchor`.
///
/// - No match: [`DomainError::AnchorNotFound`].
/// - More than one match with `require_unique`: [`DomainError::AmbiguousAnchor`].
/// - Otherwise the earliest match wins.
///
/// Inserted lines use the file's line ending. Indentation is kept verbatim.
pub fn splice(
    text: &str,
    anchor: &Anchor,
    position: Position,
    block: &str,
    require_unique: bool,
) -> Result<Spliced, DomainError> {
    let matches = find_anchor_lines(text, anchor);

    let Some(&first) = matches.first() else {
        return Err(DomainError::AnchorNotFound {
            anchor: anchor.to_string(),
        });
    };
    if require_unique && matches.len() > 1 {
        return Err(DomainError::AmbiguousAnchor {
            anchor: anchor.to_string(),
            lines: matches,
        });
    }

    let eol = LineEnding::detect(text).as_str();
    let inserted = normalise_block(block, eol);

    let mut out = String::with_capacity(text.len() + inserted.len() + eol.len());
    for (i, line) in text.split_inclusive('\n').enumerate() {
        let is_anchor = i + 1 == first;
        if is_anchor && position == Position::Before {
            out.push_str(&inserted);
        }
        out.push_str(line);
        if is_anchor && position == Position::After {
            if !line.ends_with('\n') {
                out.push_str(eol);
            }
            out.push_str(&inserted);
        }
    }

    Ok(Spliced {
        text: out,
        anchor_line: first,
        match_count: matches.len(),
    })
}

/// Re-terminate every line of `block` with `eol`.
fn normalise_block(block: &str, eol: &str) -> String {
    block.lines().fold(String::new(), |mut acc, line| {
        acc.push_str(line);
        acc.push_str(eol);
        acc
    })
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
