//! `sightline stream` — newline-delimited JSON in, one narration per line out.
//!
//! Requests are served in arrival order by one pipeline, so narrations from
//! earlier lines are remembered by later ones. A bad line yields an
//! `{"error": ...}` line and the stream continues.

use sightline_narration::{AssemblyPipeline, NarrationQuery};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline()?;
    info!(backend = %pipeline.backend_name(), "Streaming narrations from stdin");

    let served = serve(
        &pipeline,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!(served, "Input closed");
    Ok(())
}

/// Serve every line of `reader`; returns how many requests were answered.
pub async fn serve<R, W>(
    pipeline: &AssemblyPipeline,
    reader: R,
    mut writer: W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut served = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = respond(pipeline, line).await;
        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        served += 1;
    }

    Ok(served)
}

async fn respond(pipeline: &AssemblyPipeline, line: &str) -> serde_json::Value {
    let query: NarrationQuery = match serde_json::from_str(line) {
        Ok(query) => query,
        Err(e) => {
            warn!(error = %e, "Skipping malformed request");
            return error_line(format!("invalid request: {e}"));
        }
    };

    match pipeline.describe(query).await {
        Ok(output) => serde_json::to_value(&output).unwrap_or_else(error_line),
        Err(e) => error_line(e),
    }
}

fn error_line(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}
