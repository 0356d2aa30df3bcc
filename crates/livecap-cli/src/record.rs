//! `livecap capture`.

use anyhow::{bail, Context, Result};
use capconf::LiveConfig;
use clap::Args;
use livecap::{presets, CaptureSession, CompletedSegment, Headers, HttpSettings, HttpSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Live stream URL
    pub url: String,

    /// Output file, e.g. room.flv; relative paths land in output.dir
    pub output: PathBuf,

    /// Rotate after this many bytes (0 = single file)
    #[arg(long)]
    pub max_segment_bytes: Option<u64>,

    /// Read buffer size in bytes
    #[arg(long)]
    pub chunk_bytes: Option<usize>,

    /// Extra request header, `name: value`
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Header preset (bilibili)
    #[arg(long)]
    pub preset: Option<String>,

    /// Proxy URL for the stream request
    #[arg(long)]
    pub proxy: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
}

pub async fn run(args: CaptureArgs, config: &LiveConfig, cancel: CancellationToken) -> Result<()> {
    let output = resolve_output(&config.output.dir, &args.output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let headers = build_headers(config, args.preset.as_deref(), &args.headers)?;

    let settings = HttpSettings {
        connect_timeout: Duration::from_millis(config.http.connect_timeout_ms),
        proxy: args.proxy.clone().or_else(|| config.http.proxy.clone()),
        accept_invalid_certs: args.insecure || config.http.accept_invalid_certs,
        user_agent: config.http.user_agent.clone(),
    };
    let source = HttpSource::from_settings(&settings).context("Failed to build HTTP client")?;

    let max_segment_bytes = args.max_segment_bytes.unwrap_or(config.output.max_segment_bytes);
    let chunk_bytes = args.chunk_bytes.unwrap_or(config.output.chunk_bytes);

    info!("📼 livecap capture");
    info!("   URL: {}", args.url);
    info!("   Output: {}", output.display());
    info!("   Max segment: {} bytes", max_segment_bytes);

    let mut session = CaptureSession::new(source, args.url.as_str(), &output, max_segment_bytes)?
        .with_chunk_size(chunk_bytes);

    let summary = session
        .capture(
            &headers,
            &mut |segment: &CompletedSegment| -> anyhow::Result<()> {
                println!("{}", segment.path.display());
                Ok(())
            },
            &cancel,
        )
        .await
        .with_context(|| format!("Capture of {} failed", args.url))?;

    info!(
        "Capture finished ({:?}): {} bytes in {} segment(s)",
        summary.stop,
        summary.total_bytes,
        summary.segments.len()
    );

    Ok(())
}

/// Relative outputs are placed under the configured directory.
fn resolve_output(dir: &Path, output: &Path) -> PathBuf {
    if output.is_absolute() {
        output.to_path_buf()
    } else {
        dir.join(output)
    }
}

/// Preset, then `[headers]`, then `-H` flags; later entries win.
fn build_headers(
    config: &LiveConfig,
    cli_preset: Option<&str>,
    extra: &[(String, String)],
) -> Result<Headers> {
    let mut headers = Headers::new();

    if let Some(name) = cli_preset.or(config.http.preset.as_deref()) {
        match presets::by_name(name) {
            Some(preset) => headers.extend(preset),
            None => bail!(
                "Unknown header preset '{}' (known: {})",
                name,
                presets::PRESET_NAMES.join(", ")
            ),
        }
    }

    for (name, value) in &config.headers {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    for (name, value) in extra {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }

    Ok(headers)
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name: value`, got `{}`", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{}`", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
