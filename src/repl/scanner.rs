// src/repl/scanner.rs

//! Prompt and line detection over raw child output.
//!
//! The scanner never performs I/O. The wrapper pushes byte chunks in as they
//! arrive and asks for the next match; anything not yet matched stays
//! buffered, so results do not depend on how the bytes were chunked.

/// Line terminator the child's output is split on.
pub const LINE_TERMINATOR: &str = "\n";

/// Which marker ended a [`ScanMatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Prompt,
    ContinuationPrompt,
    Newline,
}

/// The markers a wait is interested in, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSet {
    /// Primary or continuation prompt (buffered waits).
    Prompts,
    /// Either prompt, or the end of a line (streaming waits).
    PromptsOrLine,
}

impl MarkerSet {
    fn markers(self) -> &'static [Marker] {
        match self {
            MarkerSet::Prompts => &[Marker::Prompt, Marker::ContinuationPrompt],
            MarkerSet::PromptsOrLine => {
                &[Marker::Prompt, Marker::ContinuationPrompt, Marker::Newline]
            }
        }
    }
}

/// The literal prompt markers of the interpreter.
///
/// An empty marker never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPattern {
    prompt: String,
    continuation: String,
}

impl PromptPattern {
    pub fn new(prompt: impl Into<String>, continuation: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            continuation: continuation.into(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn continuation(&self) -> &str {
        &self.continuation
    }

    fn needle(&self, marker: Marker) -> &[u8] {
        match marker {
            Marker::Prompt => self.prompt.as_bytes(),
            Marker::ContinuationPrompt => self.continuation.as_bytes(),
            Marker::Newline => LINE_TERMINATOR.as_bytes(),
        }
    }
}

/// Text consumed up to (not including) a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    pub marker: Marker,
    pub before: String,
}

impl ScanMatch {
    pub fn is_prompt(&self) -> bool {
        self.marker != Marker::Newline
    }
}

#[derive(Debug)]
pub struct OutputScanner {
    pattern: PromptPattern,
    buffer: Vec<u8>,
    /// Where the next search for this set may start: no marker of the set
    /// begins before it.
    resume: Option<(MarkerSet, usize)>,
}

impl OutputScanner {
    pub fn new(pattern: PromptPattern) -> Self {
        Self {
            pattern,
            buffer: Vec::new(),
            resume: None,
        }
    }

    pub fn pattern(&self) -> &PromptPattern {
        &self.pattern
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the buffer up to and including the earliest marker of `set`.
    ///
    /// The earliest occurrence wins; on equal start positions the marker
    /// listed first in `set` wins, so a prompt beats a newline. Returns
    /// `None` (leaving the buffer untouched) when no marker is complete yet.
    pub fn next_match(&mut self, set: MarkerSet) -> Option<ScanMatch> {
        let from = match self.resume {
            Some((resume_set, offset)) if resume_set == set => offset,
            _ => 0,
        };

        let mut best: Option<(usize, usize, Marker)> = None;
        let mut longest = 0;

        for &marker in set.markers() {
            let needle = self.pattern.needle(marker);
            if needle.is_empty() {
                continue;
            }
            longest = longest.max(needle.len());
            if let Some(pos) = find(&self.buffer, needle, from) {
                if best.is_none_or(|(best_pos, _, _)| pos < best_pos) {
                    best = Some((pos, needle.len(), marker));
                }
            }
        }

        let Some((pos, len, marker)) = best else {
            // A marker straddling the end of the buffer starts at most
            // `longest - 1` bytes back.
            let offset = self.buffer.len().saturating_sub(longest.saturating_sub(1));
            self.resume = Some((set, offset));
            return None;
        };
        self.resume = None;
        let consumed: Vec<u8> = self.buffer.drain(..pos + len).collect();

        let mut before = &consumed[..pos];
        if marker == Marker::Newline {
            before = before.strip_suffix(b"\r").unwrap_or(before);
        }

        Some(ScanMatch {
            marker,
            before: decode(before),
        })
    }

    /// Drain everything still buffered, e.g. the partial output left when
    /// the child died.
    pub fn take_remaining(&mut self) -> String {
        self.resume = None;
        let bytes = std::mem::take(&mut self.buffer);
        decode(&bytes)
    }
}

/// First occurrence of `needle` starting at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let tail = haystack.get(from..)?;
    if needle.len() > tail.len() {
        return None;
    }
    tail.windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

/// Invalid UTF-8 is replaced with U+FFFD rather than reported.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
