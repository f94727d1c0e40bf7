// src/kernel/info.rs

use serde::Serialize;

pub const IMPLEMENTATION: &str = "disco_lang_kernel";
pub const IMPLEMENTATION_VERSION: &str = "0.1";
pub const LANGUAGE_VERSION: &str = "0.1";

/// Static kernel metadata, read once by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelInfo {
    pub implementation: String,
    pub implementation_version: String,
    pub language_info: LanguageInfo,
    pub banner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub version: String,
    pub codemirror_mode: String,
    pub mimetype: String,
    pub file_extension: String,
}

impl KernelInfo {
    pub fn disco() -> Self {
        Self {
            implementation: IMPLEMENTATION.to_string(),
            implementation_version: IMPLEMENTATION_VERSION.to_string(),
            language_info: LanguageInfo {
                name: "Disco".to_string(),
                version: LANGUAGE_VERSION.to_string(),
                codemirror_mode: "shell".to_string(),
                mimetype: "text/x-disco-lang".to_string(),
                file_extension: ".disco".to_string(),
            },
            banner: format!("Disco {LANGUAGE_VERSION}"),
        }
    }
}

impl Default for KernelInfo {
    fn default() -> Self {
        Self::disco()
    }
}
