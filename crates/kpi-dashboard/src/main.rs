mod bootstrap;
mod render;

use anyhow::{Context, Result};
use kpi_core::settings::Settings;
use kpi_data::analysis::{analyze, profile_tables};
use kpi_data::reader::load_tables;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    let _log_guard = bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("KPI dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let data_dir = bootstrap::resolve_data_dir(settings.data_dir.as_deref());
    tracing::info!(
        "Data: {}, View: {}, Format: {}",
        data_dir.display(),
        settings.view,
        settings.format
    );

    let json = settings.format == "json";

    match settings.view.as_str() {
        "raw" | "explore" => {
            let loaded = load_tables(&data_dir)
                .with_context(|| format!("Cannot load tables from {}", data_dir.display()))?;

            if settings.view == "raw" {
                if json {
                    let doc =
                        render::raw_json(&loaded.tables, settings.preview_rows, &loaded.failures);
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                } else {
                    println!("{}", render::render_raw(&loaded.tables, settings.preview_rows));
                }
            } else {
                let profiles = profile_tables(&loaded.tables);
                if json {
                    let doc = render::profiles_json(&profiles, &loaded.failures);
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                } else {
                    println!("{}", render::render_profiles(&profiles));
                }
            }

            if !json && !loaded.failures.is_empty() {
                eprintln!("{}", render::render_load_failures(&loaded.failures));
            }
        }

        "kpis" => {
            let result = analyze(&data_dir, &settings.kpi_config())
                .with_context(|| format!("Cannot analyze {}", data_dir.display()))?;

            if result.report.is_empty() {
                tracing::warn!("{}", render::NO_KPI_MESSAGE);
            }

            if json {
                let doc =
                    render::report_json(&result.report, &result.metadata, &result.load_failures);
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}", render::render_report(&result.report));
                if !result.load_failures.is_empty() {
                    eprintln!("{}", render::render_load_failures(&result.load_failures));
                }
            }
        }

        unknown => anyhow::bail!("Unknown view mode: {}", unknown),
    }

    Ok(())
}
