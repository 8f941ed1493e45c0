use crate::decoder::Utf8Decoder;

/// Accumulates decoded text and hands out complete `\n`-terminated lines.
///
/// The unterminated tail is kept for the next [`push`](Self::push).
#[derive(Debug, Default)]
pub struct LineBuffer {
    decoder: Utf8Decoder,
    text: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk and return every line it completed, in order,
    /// without their `\n` terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let decoded = self.decoder.decode(chunk);
        self.text.push_str(&decoded);

        let Some(last_newline) = self.text.rfind('\n') else {
            return Vec::new();
        };

        let complete: String = self.text.drain(..=last_newline).collect();
        complete[..complete.len() - 1]
            .split('\n')
            .map(str::to_owned)
            .collect()
    }

    /// Text received after the last newline.
    pub fn pending(&self) -> &str {
        &self.text
    }

    /// True when no text and no partial character is held back.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.decoder.has_pending()
    }

    /// Drop the unterminated tail, including bytes of an unfinished character.
    pub fn clear(&mut self) {
        self.text.clear();
        self.decoder = Utf8Decoder::new();
    }
}
