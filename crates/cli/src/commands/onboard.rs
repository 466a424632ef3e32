//! `sightline onboard` — First-time setup.

use sightline_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🧭 Sightline — First-Time Setup");
    println!("===============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // An empty array is a valid annotation file
    let annotations_path = AppConfig::default().annotations_path();
    if !annotations_path.exists() {
        std::fs::write(&annotations_path, "[]\n")?;
        println!("✅ Created {}", annotations_path.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("   2. Add annotations to {}", annotations_path.display());
        println!("   3. Run: sightline describe --request request.json\n");
    }

    println!("🎉 Setup complete! Run `sightline doctor` to check everything is in place.\n");

    Ok(())
}
