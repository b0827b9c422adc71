//! Code Accumulator
//!
//! Collects generated declaration/body fragments. Every fragment lands in the
//! buffer terminated by exactly one `\n`, whatever the caller passed.

/// Newline-normalizing string buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkBuilder {
    code: String,
}

fn push_fragment(out: &mut String, fragment: &str) {
    let trimmed = fragment.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return;
    }
    out.push_str(trimmed);
    out.push('\n');
}

impl ChunkBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends fragments in order. Empty fragments are skipped.
    pub fn append(&mut self, fragments: &[&str]) -> &mut Self {
        for fragment in fragments {
            push_fragment(&mut self.code, fragment);
        }
        self
    }

    /// Prepends fragments, keeping their relative order.
    pub fn prepend(&mut self, fragments: &[&str]) -> &mut Self {
        let mut head = String::new();
        for fragment in fragments {
            push_fragment(&mut head, fragment);
        }
        head.push_str(&self.code);
        self.code = head;
        self
    }

    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[must_use]
    pub fn into_code(self) -> String {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_normalizes_newlines() {
        let mut builder = ChunkBuilder::new();
        builder.append(&["float a;", "float b;\n", "float c;\n\n"]);
        assert_eq!(builder.code(), "float a;\nfloat b;\nfloat c;\n");
    }

    #[test]
    fn test_prepend_keeps_order() {
        let mut builder = ChunkBuilder::new();
        builder.append(&["body();"]);
        builder.prepend(&["#define A", "#define B\n"]);
        assert_eq!(builder.code(), "#define A\n#define B\nbody();\n");
    }

    #[test]
    fn test_multiline_fragment_keeps_inner_lines() {
        let mut builder = ChunkBuilder::new();
        builder.append(&["void f() {\n    x();\n}"]).append(&["f();"]);
        assert_eq!(builder.code(), "void f() {\n    x();\n}\nf();\n");
    }

    #[test]
    fn test_empty_fragments_are_skipped() {
        let mut builder = ChunkBuilder::new();
        builder.append(&["", "\n", "a"]);
        assert_eq!(builder.code(), "a\n");
    }
}
