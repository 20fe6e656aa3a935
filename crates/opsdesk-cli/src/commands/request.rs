use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use opsdesk_core::request::{HttpMethod, MultipartForm, RequestDescriptor, ResponseKind};
use serde_json::Value;

use crate::app::AppContext;
use crate::commands::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// GET, POST, PUT, PATCH or DELETE
    #[arg(value_parser = parse_method)]
    pub method: HttpMethod,

    /// Path relative to the API base, e.g. `books/42?expand=author`
    pub path: String,

    /// JSON body
    #[arg(long, conflicts_with_all = ["form", "file"])]
    pub json: Option<String>,

    /// Multipart text field, `name=value` (repeatable)
    #[arg(long, value_name = "NAME=VALUE")]
    pub form: Vec<String>,

    /// Multipart file field, `name=path` (repeatable)
    #[arg(long, value_name = "NAME=PATH")]
    pub file: Vec<String>,

    /// How to decode the response: auto, json, text or binary
    #[arg(long, default_value = "auto", value_parser = parse_kind)]
    pub kind: ResponseKind,

    /// Write the raw response body to this file instead of printing it
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn parse_method(raw: &str) -> Result<HttpMethod, String> {
    raw.parse().map_err(|_| format!("unknown method '{}'", raw))
}

fn parse_kind(raw: &str) -> Result<ResponseKind, String> {
    raw.parse().map_err(|_| format!("unknown response kind '{}'", raw))
}

pub async fn run(ctx: &AppContext, args: RequestArgs) -> Result<()> {
    let descriptor = build_descriptor(&args)?;
    let response = ctx.client.execute(descriptor).await?;
    output::emit(response, args.output.as_deref())
}

pub async fn download(ctx: &AppContext, path: &str, file: &Path) -> Result<()> {
    let binary = ctx.client.download(path).await?;
    std::fs::write(file, &binary.bytes)
        .with_context(|| format!("Failed to write {}", file.display()))?;
    println!(
        "{}",
        format!(
            "Saved {} bytes ({}) to {}",
            binary.bytes.len(),
            binary.content_type.as_deref().unwrap_or("unknown type"),
            file.display()
        )
        .green()
    );
    Ok(())
}

pub fn build_descriptor(args: &RequestArgs) -> Result<RequestDescriptor> {
    let mut descriptor = RequestDescriptor::new(args.method, args.path.clone()).expect(args.kind);

    if let Some(raw) = &args.json {
        let value: Value = serde_json::from_str(raw).context("--json is not valid JSON")?;
        descriptor = descriptor.with_json(value);
    } else if !args.form.is_empty() || !args.file.is_empty() {
        descriptor = descriptor.with_form(build_form(&args.form, &args.file)?);
    }

    if descriptor.body.is_some() && !args.method.allows_body() {
        tracing::warn!("{} requests carry no body; ignoring it", args.method);
    }
    Ok(descriptor)
}

fn build_form(fields: &[String], files: &[String]) -> Result<MultipartForm> {
    let mut form = MultipartForm::new();
    for field in fields {
        let (name, value) = split_pair(field, "--form")?;
        form = form.text(name, value);
    }
    for file in files {
        let (name, path) = split_pair(file, "--file")?;
        let path = Path::new(path);
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string());
        form = form.file(name, file_name, content_type, bytes);
    }
    Ok(form)
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => bail!("{} expects NAME=VALUE, got '{}'", flag, raw),
    }
}
