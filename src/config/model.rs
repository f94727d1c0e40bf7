// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::repl::PromptPattern;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [repl]
/// binary = "disco"
/// args = []
/// prompt = "Disco> "
/// continuation_prompt = ""
/// startup_timeout_secs = 30
/// command_timeout_secs = 30
///
/// [kernel]
/// block_begin = ":{"
/// block_end = ":}"
/// restart_notice = "Restarting Disco"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// How to launch and talk to the Disco child process, from `[repl]`.
    #[serde(default)]
    pub repl: ReplSection,

    /// Adapter behaviour, from `[kernel]`.
    #[serde(default)]
    pub kernel: KernelSection,
}

impl RawConfigFile {
    /// Replace `repl.binary` when a CLI override is present.
    pub fn with_binary_override(mut self, binary: Option<String>) -> Self {
        if let Some(binary) = binary {
            self.repl.binary = binary;
        }
        self
    }
}

/// Validated configuration.
///
/// Only constructed via `TryFrom<RawConfigFile>` (see `validate.rs`), or via
/// `Default`, whose values are known to be valid.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub repl: ReplSection,
    pub kernel: KernelSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(repl: ReplSection, kernel: KernelSection) -> Self {
        Self { repl, kernel }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ReplSection::default(), KernelSection::default())
    }
}

/// `[repl]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplSection {
    /// Program to spawn. Looked up on `PATH` when not a path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Extra arguments. Disco itself is launched with none.
    #[serde(default)]
    pub args: Vec<String>,

    /// Primary prompt printed by the interpreter when it is ready for input.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Prompt printed in the middle of a multi-line block.
    ///
    /// Empty means "never matches": Disco echoes its primary prompt inside
    /// `:{ ... :}` blocks.
    #[serde(default)]
    pub continuation_prompt: String,

    /// How long to wait for the very first prompt after spawning.
    #[serde(default = "default_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// How long buffered commands (block markers, interrupt resync) may take.
    #[serde(default = "default_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_binary() -> String {
    "disco".to_string()
}

fn default_prompt() -> String {
    "Disco> ".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ReplSection {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: Vec::new(),
            prompt: default_prompt(),
            continuation_prompt: String::new(),
            startup_timeout_secs: default_timeout_secs(),
            command_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ReplSection {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn prompt_pattern(&self) -> PromptPattern {
        PromptPattern::new(&self.prompt, &self.continuation_prompt)
    }
}

/// `[kernel]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelSection {
    /// Command that opens a multi-line block in the Disco REPL.
    #[serde(default = "default_block_begin")]
    pub block_begin: String,

    /// Command that closes a multi-line block.
    #[serde(default = "default_block_end")]
    pub block_end: String,

    /// Appended to the output when the child died and was restarted.
    #[serde(default = "default_restart_notice")]
    pub restart_notice: String,
}

fn default_block_begin() -> String {
    ":{".to_string()
}

fn default_block_end() -> String {
    ":}".to_string()
}

fn default_restart_notice() -> String {
    "Restarting Disco".to_string()
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            block_begin: default_block_begin(),
            block_end: default_block_end(),
            restart_notice: default_restart_notice(),
        }
    }
}
