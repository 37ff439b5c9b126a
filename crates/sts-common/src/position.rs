//! Line/character positions derived from byte offsets.
//!
//! Diagnostics carry byte offsets; rendering needs 1-based line and
//! character numbers. `LineMap` stores the start offset of every line and
//! answers conversions with a binary search.

use serde::{Deserialize, Serialize};

/// A 1-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Line map for offset -> position conversion.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    /// Starting offset of each line (line_starts[0] is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = source.as_bytes();

        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => line_starts.push((i + 1) as u32),
                // \r\n is handled by the \n; a lone \r ends a line too
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push((i + 1) as u32),
                _ => {}
            }
        }

        LineMap { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a 1-based position.
    ///
    /// Offsets past the end clamp to the last line.
    pub fn position_of(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        Position {
            line: line as u32 + 1,
            character: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Byte offset where the given 1-based line starts.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        let index = line.checked_sub(1)? as usize;
        self.line_starts.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let map = LineMap::build("var a;\nvar b;\r\nvar c;");
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.position_of(0), Position::new(1, 1));
        assert_eq!(map.position_of(4), Position::new(1, 5));
        assert_eq!(map.position_of(7), Position::new(2, 1));
        assert_eq!(map.position_of(15), Position::new(3, 1));
    }

    #[test]
    fn lone_carriage_return_ends_a_line() {
        let map = LineMap::build("a\rb");
        assert_eq!(map.position_of(2), Position::new(2, 1));
        assert_eq!(map.line_start(2), Some(2));
        assert_eq!(map.line_start(0), None);
    }
}
