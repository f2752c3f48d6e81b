//! Environment readiness check.

use crate::cli::output::{self, is_json};
use crate::config::ManifestPaths;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability and whether a manifest is ready to download.
pub async fn run() -> Result<()> {
    let chromium_path = find_chromium();
    let manifest = ManifestPaths::default();
    let urls_present = manifest.urls.exists();
    let titles_present = manifest.titles.exists();

    if is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium_path.as_ref().map(|p| p.display().to_string()),
            "urls_file": urls_present,
            "titles_file": titles_present,
            "ready": chromium_path.is_some(),
        }));
        return Ok(());
    }

    println!("Postgrab Doctor");
    println!("===============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set POSTGRAB_CHROMIUM_PATH."
        ),
    }

    for (path, present) in [(&manifest.urls, urls_present), (&manifest.titles, titles_present)] {
        if present {
            println!("[OK] Manifest file {} present", path.display());
        } else {
            println!("[--] Manifest file {} not found (run `postgrab harvest`)", path.display());
        }
    }

    println!();
    if chromium_path.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
