//! Command results, printed as text or as JSON with `--json`.

use anyhow::Result;
use h5tree_core::AttrValue;
use serde::Serialize;
use std::io::{self, Write};

pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `data` as JSON, or whatever `text_fn` renders in text mode.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        let mut stdout = io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, data)?;
            writeln!(stdout)?;
        } else {
            stdout.write_all(text_fn().as_bytes())?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Errors go to stderr, as `{"success": false, ...}` in JSON mode.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let message = format!("{:#}", error);
        let rendered = if self.json {
            serde_json::to_string_pretty(&ErrorOutput {
                success: false,
                result_code,
                error: message,
            })
            .unwrap_or_default()
        } else {
            format!("Error: {}", message)
        };
        let _ = writeln!(io::stderr(), "{}", rendered);
    }
}

// JSON shapes, one per command.

#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub file: String,
}

/// Output for `mkdir` command.
#[derive(Debug, Serialize)]
pub struct MkdirOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub groups_created: usize,
}

/// Output for `mkds` command.
#[derive(Debug, Serialize)]
pub struct MkdsOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub shape: Vec<u64>,
    pub groups_created: usize,
}

/// Output for `link` command.
#[derive(Debug, Serialize)]
pub struct LinkOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub target: String,
}

/// Child entry for `ls` command.
#[derive(Debug, Clone, Serialize)]
pub struct ChildInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub children: Vec<ChildInfo>,
}

/// Output for `attrs` command.
#[derive(Debug, Serialize)]
pub struct AttrsOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub attributes: Vec<String>,
}

/// Output for `set-attr` command.
#[derive(Debug, Serialize)]
pub struct SetAttrOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub name: String,
    pub value: AttrValue,
}

/// Output for `probe` command.
#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub name: String,
    pub present: bool,
}

/// Output for `stat` command.
#[derive(Debug, Serialize)]
pub struct StatOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub parent: String,
    pub name: String,
    pub attributes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<usize>,
}
