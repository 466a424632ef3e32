//! `sightline describe` — Narrate one request read from a JSON file.

use sightline_narration::NarrationQuery;
use std::path::PathBuf;

pub async fn run(request: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&request)
        .map_err(|e| format!("Failed to read {}: {e}", request.display()))?;
    let query: NarrationQuery = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid request in {}: {e}", request.display()))?;

    let pipeline = super::load_pipeline()?;
    let output = pipeline.describe(query).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
