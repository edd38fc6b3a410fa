use serde::Serialize;

use rustc_hash::FxHashMap;

/// Identity of one compilation unit's source text.
///
/// Sources are registered once in a [`SourceMap`] and referenced by id
/// everywhere else. The distinguished [`SourceId::SYNTHETIC`] id marks
/// positions that were manufactured by the compiler rather than read
/// from a file (builtin registrations, generated slots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceId(pub u32);

impl SourceId {
    pub const SYNTHETIC: SourceId = SourceId(u32::MAX);
}

/// A source position: file plus 1-based start/end line and column.
///
/// Positions are carried verbatim from the syntax forest into
/// diagnostics. Lines and columns are 1-based; a zero line marks a
/// synthetic position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub source: SourceId,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Position {
    /// Create a position covering `(start_line, start_col)` through
    /// `(end_line, end_col)` in the given source.
    pub fn new(
        source: SourceId,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        debug_assert!(
            (start_line, start_col) <= (end_line, end_col),
            "position start ({start_line}:{start_col}) must be <= end ({end_line}:{end_col})"
        );
        Self { source, start_line, start_col, end_line, end_col }
    }

    /// A compiler-manufactured position with no source location.
    pub fn synthetic() -> Self {
        Self {
            source: SourceId::SYNTHETIC,
            start_line: 0,
            start_col: 0,
            end_line: 0,
            end_col: 0,
        }
    }

    /// Whether this position was manufactured rather than parsed.
    pub fn is_synthetic(&self) -> bool {
        self.source == SourceId::SYNTHETIC
    }
}

/// Registry of compilation unit sources, append-only.
///
/// Maps names to [`SourceId`]s, keeps the full text for diagnostic
/// rendering, and converts line/column positions back to byte offsets
/// on demand via a per-source line index.
#[derive(Debug, Default)]
pub struct SourceMap {
    names: Vec<String>,
    texts: Vec<String>,
    line_starts: Vec<Vec<u32>>,
    by_name: FxHashMap<String, SourceId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, returning its id. Registering the same name
    /// twice returns the original id; the text is not replaced.
    pub fn add(&mut self, name: &str, text: &str) -> SourceId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = SourceId(self.names.len() as u32);
        let mut starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push((i + 1) as u32);
            }
        }
        self.names.push(name.to_string());
        self.texts.push(text.to_string());
        self.line_starts.push(starts);
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// The registered name of a source, or `"<generated>"` for
    /// synthetic positions.
    pub fn name(&self, id: SourceId) -> &str {
        if id == SourceId::SYNTHETIC {
            return "<generated>";
        }
        &self.names[id.0 as usize]
    }

    /// The full text of a source.
    pub fn text(&self, id: SourceId) -> &str {
        if id == SourceId::SYNTHETIC {
            return "";
        }
        &self.texts[id.0 as usize]
    }

    /// Convert a 1-based (line, col) pair to a byte offset into the
    /// source text. Out-of-range lines clamp to the end of the text.
    pub fn offset(&self, id: SourceId, line: u32, col: u32) -> usize {
        if id == SourceId::SYNTHETIC || line == 0 {
            return 0;
        }
        let starts = &self.line_starts[id.0 as usize];
        let text_len = self.texts[id.0 as usize].len();
        match starts.get((line - 1) as usize) {
            Some(start) => ((*start + col.saturating_sub(1)) as usize).min(text_len),
            None => text_len,
        }
    }

    /// Render a position as `name:line:col` for human-readable output.
    pub fn describe(&self, pos: Position) -> String {
        if pos.is_synthetic() {
            return "<generated>".to_string();
        }
        format!("{}:{}:{}", self.name(pos.source), pos.start_line, pos.start_col)
    }
}
