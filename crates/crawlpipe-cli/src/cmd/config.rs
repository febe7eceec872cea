//! Config subcommand - show the effective configuration

use anyhow::Result;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Data directory",
        &config.input.data_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Output directory",
        &config.output.dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Analytics import",
        if config.analytics.enabled {
            "enabled"
        } else {
            "disabled"
        },
    ]);
    if config.features.extract.is_empty() {
        table.add_row(vec!["Extract rules", "none"]);
    }
    for rule in &config.features.extract {
        table.add_row(vec![
            "Extract rule",
            &format!("{} -> {} ({})", rule.name, rule.es_field, rule.agg),
        ]);
    }

    eprintln!("\n{table}");
    Ok(())
}
