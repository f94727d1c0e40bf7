#![allow(dead_code)]

use disco_kernel::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn binary(mut self, binary: &str) -> Self {
        self.config.repl.binary = binary.to_string();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.repl.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.config.repl.prompt = prompt.to_string();
        self
    }

    pub fn continuation_prompt(mut self, prompt: &str) -> Self {
        self.config.repl.continuation_prompt = prompt.to_string();
        self
    }

    pub fn startup_timeout_secs(mut self, secs: u64) -> Self {
        self.config.repl.startup_timeout_secs = secs;
        self
    }

    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.config.repl.command_timeout_secs = secs;
        self
    }

    pub fn block_markers(mut self, begin: &str, end: &str) -> Self {
        self.config.kernel.block_begin = begin.to_string();
        self.config.kernel.block_end = end.to_string();
        self
    }

    pub fn restart_notice(mut self, notice: &str) -> Self {
        self.config.kernel.restart_notice = notice.to_string();
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
