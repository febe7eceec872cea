//! Fields subcommand - public fields of the enabled features

use anyhow::Result;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use crawlpipe_features::{Feature, PublicField, feature_fields};

use crate::config::Config;

/// Features whose fields are exposed for this configuration
pub fn enabled_features(config: &Config) -> Vec<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| *f != Feature::Visits || config.analytics.enabled)
        .collect()
}

pub fn run(config: &Config) -> Result<()> {
    let fields = feature_fields(&enabled_features(config), &config.features);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Field").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Multiple").fg(Color::Cyan),
            Cell::new("Group").fg(Color::Cyan),
            Cell::new("Settings").fg(Color::Cyan),
        ]);
    for field in &fields {
        table.add_row(row(field));
    }

    println!("{table}");
    log::info!("{} public fields", fields.len());
    Ok(())
}

fn row(field: &PublicField) -> Vec<Cell> {
    let settings: Vec<&str> = field.settings.iter().map(|s| s.as_str()).collect();
    vec![
        Cell::new(&field.field),
        Cell::new(&field.name),
        Cell::new(field.value_type.as_str()),
        if field.multiple {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        },
        Cell::new(field.group.as_deref().unwrap_or("-")),
        Cell::new(settings.join(", ")),
    ]
}
