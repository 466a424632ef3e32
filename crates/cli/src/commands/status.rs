//! `sightline status` — Show system status.

use sightline_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let backend = &config.backend;
    let narration = &config.narration;

    println!("🧭 Sightline Status");
    println!("===================");
    println!("  Config dir:      {}", AppConfig::config_dir().display());
    println!("  Strategy:        {}", backend.strategy);
    println!("  Provider:        {}", backend.provider);
    println!("  Vision model:    {}", backend.vision_model);
    println!("  Language model:  {}", backend.language_model);
    println!("  Temperature:     {}", backend.temperature);
    println!("  Call timeout:    {}s", backend.call_timeout_secs);
    println!("  Concurrency:     {}", backend.describe_concurrency);
    println!("  Language:        {}", narration.default_language);
    println!("  Max distance:    {} m", narration.max_distance);
    println!("  Max count:       {}", narration.max_count);
    println!("  Deadline:        {}s", narration.request_deadline_secs);
    println!(
        "  Past narrations: {}",
        if config.memory.use_past_explanations { "in prompt" } else { "not in prompt" }
    );
    println!("  Annotations:     {}", config.annotations_path().display());
    println!(
        "  Request log:     {}",
        config.narration.log_dir.as_deref().unwrap_or("disabled")
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `sightline onboard` first");
    }

    Ok(())
}
