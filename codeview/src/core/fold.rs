//! Single-pass fold marker extraction over source lines.
//!
//! Three unrelated bracket grammars are recognised on the trimmed text of
//! each line: region annotations, brace blocks, and doc-comment
//! summary/returns pairs. Pending starts live on one stack of tagged entries;
//! an end token closes the innermost pending start *of its own kind*, so
//! interleaved grammars cannot resolve each other's markers.
//!
//! Markers are emitted in the order their closing lines are encountered.

use serde::{Deserialize, Serialize};

use crate::error::FoldParseError;

const REGION_FALLBACK_LABEL: &str = "...";
const BLOCK_LABEL: &str = "...}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldKind {
    Region,
    Block,
    DocComment,
}

impl std::fmt::Display for FoldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FoldKind::Region => "region",
            FoldKind::Block => "block",
            FoldKind::DocComment => "doc comment",
        })
    }
}

/// A collapsible span of source text. Lines are 0-indexed.
///
/// `end_column` is the display width supplied by the caller, not a measured
/// text width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldMarker {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub kind: FoldKind,
    pub label: String,
}

/// Tokens and geometry used by [`extract_fold_markers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldOptions {
    /// Column reported as `end_column` on every marker.
    pub display_width: usize,
    pub region_open: String,
    pub region_close: String,
    pub doc_open: String,
    pub doc_close: String,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            display_width: 57,
            region_open: "#region".to_string(),
            region_close: "#endregion".to_string(),
            doc_open: "/// <summary>".to_string(),
            doc_close: "/// <returns>".to_string(),
        }
    }
}

/// Markers plus the malformed pairs that were skipped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoldExtraction {
    pub markers: Vec<FoldMarker>,
    pub diagnostics: Vec<FoldParseError>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: FoldKind,
    line: usize,
}

/// Extract fold markers from `lines` in one forward pass.
///
/// Unmatched end tokens and unterminated starts are recorded in
/// [`FoldExtraction::diagnostics`]; they never abort the pass.
pub fn extract_fold_markers<S: AsRef<str>>(lines: &[S], options: &FoldOptions) -> FoldExtraction {
    let mut pass = Pass {
        lines,
        options,
        pending: Vec::new(),
        out: FoldExtraction::default(),
    };

    for (index, raw) in lines.iter().enumerate() {
        let text = raw.as_ref().trim();
        pass.region_tokens(index, text);
        pass.block_tokens(index, text);
        pass.doc_tokens(index, text);
    }

    for pending in pass.pending {
        pass.out.diagnostics.push(FoldParseError::Unterminated {
            line: pending.line,
            kind: pending.kind,
        });
    }
    pass.out
}

/// Convenience wrapper splitting `text` on line endings (`\n` or `\r\n`).
pub fn extract_from_text(text: &str, options: &FoldOptions) -> FoldExtraction {
    let lines: Vec<&str> = text.lines().collect();
    extract_fold_markers(&lines, options)
}

struct Pass<'a, S> {
    lines: &'a [S],
    options: &'a FoldOptions,
    pending: Vec<Pending>,
    out: FoldExtraction,
}

impl<S: AsRef<str>> Pass<'_, S> {
    fn region_tokens(&mut self, index: usize, text: &str) {
        let options = self.options;
        let open = options.region_open.as_str();
        if text.starts_with(open) {
            self.push(FoldKind::Region, index);
        }
        if text.starts_with(options.region_close.as_str()) {
            self.close(FoldKind::Region, index, |lines, start| {
                region_label(lines[start].as_ref().trim(), open)
            });
        }
    }

    fn block_tokens(&mut self, index: usize, text: &str) {
        let opens = text.starts_with('{') || text.ends_with('{');
        let closes = text.starts_with('}') || text.ends_with('}');
        match (opens, closes) {
            (true, false) => self.push(FoldKind::Block, index),
            (false, true) => self.close_block(index),
            // `} else {` closes the previous block before opening the next one.
            (true, true) if text.starts_with('}') => {
                self.close_block(index);
                self.push(FoldKind::Block, index);
            }
            // `{ ... }` on one line has nothing to fold.
            _ => {}
        }
    }

    fn doc_tokens(&mut self, index: usize, text: &str) {
        if text.starts_with(self.options.doc_open.as_str()) {
            self.push(FoldKind::DocComment, index);
        }
        if text.starts_with(self.options.doc_close.as_str()) {
            self.close(FoldKind::DocComment, index, |lines, start| {
                lines
                    .get(start + 1)
                    .map(|line| doc_label(line.as_ref()))
                    .unwrap_or_default()
            });
        }
    }

    fn close_block(&mut self, index: usize) {
        self.close(FoldKind::Block, index, |_, _| BLOCK_LABEL.to_string());
    }

    fn push(&mut self, kind: FoldKind, line: usize) {
        self.pending.push(Pending { kind, line });
    }

    fn close(&mut self, kind: FoldKind, index: usize, label: impl FnOnce(&[S], usize) -> String) {
        let Some(position) = self.pending.iter().rposition(|p| p.kind == kind) else {
            self.out
                .diagnostics
                .push(FoldParseError::UnmatchedEnd { line: index, kind });
            return;
        };
        let start = self.pending.remove(position).line;
        self.out.markers.push(FoldMarker {
            start_line: start,
            start_column: self.lines[start].as_ref().chars().count(),
            end_line: index,
            end_column: self.options.display_width,
            kind,
            label: label(self.lines, start),
        });
    }
}

fn region_label(start_text: &str, open: &str) -> String {
    let name = start_text.strip_prefix(open).unwrap_or_default().trim();
    if name.is_empty() {
        REGION_FALLBACK_LABEL.to_string()
    } else {
        name.to_string()
    }
}

/// Trimmed text with the leading `///` (or `//`) stripped.
fn doc_label(line: &str) -> String {
    line.trim().trim_start_matches('/').trim().to_string()
}
