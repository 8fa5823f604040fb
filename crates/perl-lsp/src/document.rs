//! Open-document state: a `ropey::Rope` kept in sync with the editor via
//! incremental `textDocument/didChange` events. No bespoke AST/parent-map
//! caching lives here — re-analysis goes through
//! `perl_workspace_index::WorkspaceIndex` instead.

use ropey::Rope;

/// The editor's live view of one open document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    rope: Rope,
    version: i32,
}

impl DocumentState {
    /// Construct from the full text sent with `didOpen`.
    pub fn new(content: &str, version: i32) -> Self {
        Self { rope: Rope::from_str(content), version }
    }

    /// The document's current version, as last set by `didOpen`/`didChange`.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The document's full text, reconstructed from the rope.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole document (a `didChange` with no `range`, i.e. a
    /// full-document sync event).
    pub fn replace_all(&mut self, content: &str, version: i32) {
        self.rope = Rope::from_str(content);
        self.version = version;
    }

    /// Apply one incremental edit described by LSP (UTF-16) line/character
    /// positions.
    pub fn apply_change(
        &mut self,
        start_line: usize,
        start_char: usize,
        end_line: usize,
        end_char: usize,
        new_text: &str,
        version: i32,
    ) {
        let start_idx = self.lsp_position_to_char_idx(start_line, start_char);
        let end_idx = self.lsp_position_to_char_idx(end_line, end_char);
        if start_idx < end_idx && end_idx <= self.rope.len_chars() {
            self.rope.remove(start_idx..end_idx);
        }
        if !new_text.is_empty() && start_idx <= self.rope.len_chars() {
            self.rope.insert(start_idx, new_text);
        }
        self.version = version;
    }

    /// Convert an LSP `(line, character)` position (UTF-16 code units) into
    /// a char index into the rope.
    fn lsp_position_to_char_idx(&self, line: usize, character: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        let line_slice = self.rope.line(line);
        let mut units = 0usize;
        for (offset, ch) in line_slice.chars().enumerate() {
            if units >= character {
                return line_start + offset;
            }
            units += ch.len_utf16();
        }
        line_start + line_slice.len_chars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_replacement_updates_version() {
        let mut doc = DocumentState::new("my $x = 1;\n", 1);
        doc.replace_all("my $y = 2;\n", 2);
        assert_eq!(doc.text(), "my $y = 2;\n");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn incremental_insert_lands_at_the_right_offset() {
        let mut doc = DocumentState::new("my $x = 1;\n", 1);
        doc.apply_change(0, 3, 0, 3, "y", 2);
        assert_eq!(doc.text(), "my y$x = 1;\n");
    }

    #[test]
    fn incremental_replace_removes_then_inserts() {
        let mut doc = DocumentState::new("my $x = 1;\n", 1);
        doc.apply_change(0, 3, 0, 5, "$z", 2);
        assert_eq!(doc.text(), "my $z = 1;\n");
    }
}
