mod bootstrap;
mod render;

use anyhow::{Context, Result};
use attendance_core::settings::Settings;
use attendance_data::reader::load_records;
use attendance_data::report::{
    employee_label, group_by_employee, records_for_employee, MonthReport, TeamSummary,
};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("attendance-report v{} starting", env!("CARGO_PKG_VERSION"));

    let records_path = settings
        .records
        .clone()
        .or_else(bootstrap::discover_data_path)
        .context("no attendance export found; pass --records <PATH>")?;

    let records = load_records(&records_path, settings.timezone_handler())
        .with_context(|| format!("loading {}", records_path.display()))?;

    let month = settings.target_month();
    let policy = settings.policy();
    let as_json = settings.format == "json";

    tracing::info!(
        "View: {}, month: {}, shift start: {}, grace: {}m",
        settings.view,
        month,
        policy.shift_start.format("%H:%M"),
        policy.grace_minutes
    );

    let output = match settings.view.as_str() {
        "team" => {
            let summary = TeamSummary::build(&records, month, &policy);
            if as_json {
                render::to_json(&summary)?
            } else {
                render::render_team(&summary)
            }
        }
        "calendar" => {
            // First named employee; records without an id only when there is none.
            let employee = settings
                .employee
                .clone()
                .or_else(|| group_by_employee(&records).into_keys().flatten().next());

            let own = records_for_employee(&records, employee.as_deref());
            if own.is_empty() {
                tracing::warn!(
                    "No records for employee {}",
                    employee_label(employee.as_deref())
                );
            }

            let report = MonthReport::build(
                employee.as_deref(),
                &own,
                month,
                &policy,
                settings.use_12h(),
            );
            if as_json {
                render::to_json(&report)?
            } else {
                render::render_calendar(&report)
            }
        }
        unknown => anyhow::bail!("Unknown view: {}", unknown),
    };

    println!("{}", output);
    Ok(())
}
