#![allow(dead_code, unused_imports)]

pub use disco_kernel_test_utils::builders;
pub use disco_kernel_test_utils::fake_repl::{FakeEvent, FakeRepl, FakeReply};
pub use disco_kernel_test_utils::mock_disco::{mock_disco_config, script_config};
pub use disco_kernel_test_utils::sinks::{InterruptOnOutput, RecordingSink};
pub use disco_kernel_test_utils::{init_tracing, with_timeout};

use tokio::sync::mpsc;

/// Drain everything already queued on a line channel.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(line) = rx.try_recv() {
        out.push(line);
    }
    out
}
