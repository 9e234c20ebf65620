//! Transcript blocks.

/// Rendered lines for one request or one response.
///
/// Built by a capture hook, written once by the console, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBlock {
    lines: Vec<String>,
}

impl TranscriptBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Blank separator line.
    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// The block as text, every line newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl Extend<String> for TranscriptBlock {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.lines.extend(iter);
    }
}
