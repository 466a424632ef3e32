//! `sightline doctor` — Diagnose system health.

use sightline_config::AppConfig;
use sightline_memory::JsonFileAnnotations;

use super::needs_api_key;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Sightline Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — defaults in use, run `sightline onboard`");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config and re-run doctor.");
            return Ok(());
        }
    };

    let provider_name = &config.backend.provider;
    if !needs_api_key(provider_name) || config.provider_api_key(provider_name).is_some() {
        println!("  ✅ Credentials for provider '{provider_name}'");
    } else {
        println!("  ⚠️  No API key for provider '{provider_name}' — set SIGHTLINE_API_KEY");
        issues += 1;
    }

    match JsonFileAnnotations::open(config.annotations_path()) {
        Ok(store) => {
            let count = store.count().await;
            if count == 0 {
                println!("  ⚠️  No annotations in {}", store.path().display());
                issues += 1;
            } else {
                println!("  ✅ {count} annotation(s) loaded");
            }
        }
        Err(e) => {
            println!("  ❌ Annotations unreadable: {e}");
            issues += 1;
        }
    }

    let router = sightline_providers::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{provider_name}' reachable"),
            Ok(false) => {
                println!("  ⚠️  Provider '{provider_name}' did not answer");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{provider_name}' health check failed: {e}");
                issues += 1;
            }
        },
        None => {
            println!("  ❌ Provider '{provider_name}' is not available");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
