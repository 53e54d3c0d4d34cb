mod bootstrap;

use anyhow::Result;
use cohort_core::settings::Settings;
use cohort_data::analysis::analyze_paths;
use cohort_data::filter::CohortFilter;
use cohort_ui::app::App;
use cohort_ui::report::render_report;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Cohort dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("View: {}, Theme: {}", settings.view, settings.theme);

    let filter = CohortFilter::new(settings.cohort_months()?, settings.date_range()?)?;

    let paths = bootstrap::resolve_dataset(
        settings.data_dir.as_deref(),
        settings.cash_file.as_deref(),
        settings.fees_file.as_deref(),
    )?;
    let result = analyze_paths(&paths)?;

    match settings.view.as_str() {
        "dashboard" => {
            tracing::info!("Starting dashboard...");
            let app = App::new(&settings.theme, &result, filter, settings.head_rows);
            // The loop exits on 'q' / Ctrl+C inside the TUI.
            app.run()?;
        }

        "report" => {
            let rows = filter.apply(&result.metrics);
            print!("{}", render_report(&result, &rows, &filter, settings.head_rows));
        }

        "json" => {
            let rows = filter.apply(&result.metrics);
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    Ok(())
}
