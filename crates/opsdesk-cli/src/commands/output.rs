//! Rendering of decoded responses for the terminal.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use opsdesk_core::request::ApiResponse;

/// Prints `response` to stdout, or writes its raw body to `output`.
pub fn emit(response: ApiResponse, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let bytes = body_bytes(response)?;
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}",
                format!("Wrote {} bytes to {}", bytes.len(), path.display()).green()
            );
        }
        None => println!("{}", render(&response)?),
    }
    Ok(())
}

pub fn render(response: &ApiResponse) -> Result<String> {
    Ok(match response {
        ApiResponse::Json(value) => serde_json::to_string_pretty(value)?,
        ApiResponse::Text(text) => text.clone(),
        ApiResponse::Binary(binary) => format!(
            "<{} bytes of {}; use --output to save>",
            binary.bytes.len(),
            binary.content_type.as_deref().unwrap_or("binary data")
        )
        .bright_black()
        .to_string(),
        ApiResponse::Empty => "(no content)".bright_black().to_string(),
    })
}

fn body_bytes(response: ApiResponse) -> Result<Vec<u8>> {
    Ok(match response {
        ApiResponse::Json(value) => serde_json::to_vec_pretty(&value)?,
        ApiResponse::Text(text) => text.into_bytes(),
        ApiResponse::Binary(binary) => binary.bytes,
        ApiResponse::Empty => Vec::new(),
    })
}
