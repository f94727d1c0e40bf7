use disco_kernel::errors::Result;
use disco_kernel::kernel::{InterruptHandle, OutputSink, StreamName};

/// Records every chunk the kernel publishes.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub chunks: Vec<(StreamName, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn joined(&self) -> String {
        self.chunks.iter().map(|(_, text)| text.as_str()).collect()
    }
}

impl OutputSink for RecordingSink {
    fn stream(&mut self, name: StreamName, text: &str) -> Result<()> {
        self.chunks.push((name, text.to_string()));
        Ok(())
    }
}

/// Records like [`RecordingSink`] and fires an interrupt the first time a
/// chunk contains `needle`, the way a user would hit "stop" after seeing
/// some output.
#[derive(Debug)]
pub struct InterruptOnOutput {
    pub recorded: RecordingSink,
    needle: String,
    handle: InterruptHandle,
    fired: bool,
}

impl InterruptOnOutput {
    pub fn new(needle: &str, handle: InterruptHandle) -> Self {
        Self {
            recorded: RecordingSink::new(),
            needle: needle.to_string(),
            handle,
            fired: false,
        }
    }
}

impl OutputSink for InterruptOnOutput {
    fn stream(&mut self, name: StreamName, text: &str) -> Result<()> {
        if !self.fired && text.contains(&self.needle) {
            self.fired = true;
            self.handle.interrupt();
        }
        self.recorded.stream(name, text)
    }
}
