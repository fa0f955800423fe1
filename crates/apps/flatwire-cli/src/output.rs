use anyhow::Result;
use serde::Serialize;

use crate::config::OutputFormat;

#[derive(Debug, Clone)]
pub struct Output {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn emit_lines(&self, lines: &[String]) {
        if self.quiet {
            return;
        }
        for line in lines {
            println!("{line}");
        }
    }

    pub fn emit_message(&self, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        println!("{}", message.as_ref());
    }

    pub fn emit_hex(&self, bytes: &[u8]) {
        self.emit_message(hex::encode(bytes));
    }
}
