use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{CliConfig, OutputFormat};
use crate::input::EnvelopeInput;
use crate::inspect::inspect;
use crate::output::Output;

#[derive(Debug, Serialize)]
struct EncodeSummary<'a> {
    len: usize,
    path: Option<&'a str>,
    hex: Option<String>,
}

/// Encode the envelope described by `input` into a finished buffer.
pub fn encode_bytes(input: &Path, config: &CliConfig) -> Result<Vec<u8>> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let envelope = EnvelopeInput::from_toml(&raw)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    envelope.encode(config.builder)
}

pub fn encode_file(
    input: &Path,
    out: Option<&Path>,
    config: &CliConfig,
    output: &Output,
) -> Result<()> {
    let bytes = encode_bytes(input, config)?;
    match out {
        Some(path) => {
            fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            if output.is_json() {
                let path = path.to_string_lossy();
                output.emit_json(&EncodeSummary {
                    len: bytes.len(),
                    path: Some(path.as_ref()),
                    hex: None,
                })
            } else {
                output.emit_message(format!("wrote {} bytes to {}", bytes.len(), path.display()));
                Ok(())
            }
        }
        None => match output.format {
            OutputFormat::Json => output.emit_json(&EncodeSummary {
                len: bytes.len(),
                path: None,
                hex: Some(hex::encode(&bytes)),
            }),
            OutputFormat::Text | OutputFormat::Hex => {
                output.emit_hex(&bytes);
                Ok(())
            }
        },
    }
}

/// Read an envelope buffer, raw or as a hex dump.
pub fn read_buffer(path: &Path, hex_input: bool) -> Result<Vec<u8>> {
    if !hex_input {
        return fs::read(path).with_context(|| format!("failed to read {}", path.display()));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let digits: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(digits).with_context(|| format!("invalid hex in {}", path.display()))
}

pub fn inspect_file(path: &Path, hex_input: bool, output: &Output) -> Result<()> {
    let bytes = read_buffer(path, hex_input)?;
    let report =
        inspect(&bytes).with_context(|| format!("{} is not an envelope", path.display()))?;
    match output.format {
        OutputFormat::Json => output.emit_json(&report),
        OutputFormat::Hex => {
            output.emit_hex(&bytes);
            Ok(())
        }
        OutputFormat::Text => {
            output.emit_lines(&report.lines());
            Ok(())
        }
    }
}
