// Subcommand implementations
//
// Each command returns the text to print so it can be tested without a
// terminal. Edit-path failures propagate as `CliError`.

use std::collections::BTreeSet;
use std::sync::Arc;

use itemrender_config::{ConfigManager, ConfigWatcher, RenderTarget, Validator, View};

use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;
use crate::router::{SetArgs, TargetKind};

/// Pretty JSON of the stored record
pub fn get(manager: &ConfigManager, id: &str) -> CliResult<String> {
    let record = manager.load_record_for_edit(id)?;
    serde_json::to_string_pretty(&record)
        .map_err(|e| CliError::invalid_argument(format!("cannot display record: {}", e)))
}

pub fn list(manager: &ConfigManager, style: &OutputStyle) -> String {
    let ids: BTreeSet<String> = manager.list_available().into_iter().collect();
    let enabled = manager.enabled_ids();

    let mut lines = vec![style.header(&format!("{} item(s)", ids.len()))];
    for id in &ids {
        let marker = if enabled.contains(id) { "*" } else { " " };
        lines.push(format!("{} {}", marker, style.id(id)));
    }
    lines.join("\n")
}

pub fn enabled(manager: &ConfigManager, style: &OutputStyle) -> String {
    let ids: BTreeSet<String> = manager.enabled_ids().into_iter().collect();
    ids.iter()
        .map(|id| style.id(id))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn set_enabled(
    manager: &ConfigManager,
    style: &OutputStyle,
    id: &str,
    enabled: bool,
) -> CliResult<String> {
    manager.set_enabled(id, enabled)?;
    let verb = if enabled { "Enabled" } else { "Disabled" };
    Ok(style.success(&format!("{} {}", verb, style.id(id))))
}

/// Apply the given transform components to one view
pub fn set(manager: &ConfigManager, style: &OutputStyle, args: &SetArgs) -> CliResult<String> {
    let changes = [
        args.scale, args.rot_x, args.rot_y, args.rot_z, args.tx, args.ty, args.tz,
    ];
    if changes.iter().all(Option::is_none) {
        return Err(CliError::invalid_argument(
            "nothing to set; pass at least one of --scale, --rot-x/y/z, --tx/ty/tz",
        ));
    }

    let view = View::from(args.view);
    let record = manager.mutate(&args.id, |record| {
        let settings = record.settings_mut(view);
        if let Some(scale) = args.scale {
            settings.scale = scale;
        }
        if let Some(x) = args.rot_x {
            settings.rotation.x = x;
        }
        if let Some(y) = args.rot_y {
            settings.rotation.y = y;
        }
        if let Some(z) = args.rot_z {
            settings.rotation.z = z;
        }
        if let Some(x) = args.tx {
            settings.translate.x = x;
        }
        if let Some(y) = args.ty {
            settings.translate.y = y;
        }
        if let Some(z) = args.tz {
            settings.translate.z = z;
        }
    })?;

    let settings = record.settings(view);
    Ok(style.success(&format!(
        "{} {}: scale {} rotation ({}, {}, {}) translate ({}, {}, {})",
        style.id(&args.id),
        view.key(),
        settings.scale,
        settings.rotation.x,
        settings.rotation.y,
        settings.rotation.z,
        settings.translate.x,
        settings.translate.y,
        settings.translate.z
    )))
}

pub fn target(
    manager: &ConfigManager,
    style: &OutputStyle,
    id: &str,
    kind: TargetKind,
    reference: Option<&str>,
) -> CliResult<String> {
    let target = match (kind, reference) {
        (TargetKind::Block, Some(block)) => RenderTarget::AsBlock(block.to_string()),
        (TargetKind::Entity, Some(entity)) => RenderTarget::AsEntity(entity.to_string()),
        (TargetKind::Neither, _) => RenderTarget::Neither,
        (_, None) => {
            return Err(CliError::invalid_argument(
                "block and entity targets need a reference id",
            ))
        }
    };

    let description = match &target {
        RenderTarget::AsBlock(block) => format!("block {}", block),
        RenderTarget::AsEntity(entity) => format!("entity {}", entity),
        RenderTarget::Neither => "stock model".to_string(),
    };
    manager.mutate(id, |record| record.target = target)?;

    Ok(style.success(&format!("{} now renders as {}", style.id(id), description)))
}

pub fn delete(manager: &ConfigManager, style: &OutputStyle, id: &str) -> CliResult<String> {
    manager.delete_record(id)?;
    Ok(style.success(&format!("Deleted {}", style.id(id))))
}

pub fn reload(manager: &ConfigManager, style: &OutputStyle) -> CliResult<String> {
    manager.invalidate_and_reload()?;
    Ok(style.success(&format!(
        "Reloaded; {} item(s) enabled",
        manager.enabled_ids().len()
    )))
}

pub fn stats(manager: &ConfigManager) -> String {
    manager.stats().summary()
}

/// Probe writability and validate every stored record
pub fn check(manager: &ConfigManager, style: &OutputStyle) -> CliResult<String> {
    let mut lines = Vec::new();
    let mut failures = 0;

    if manager.is_writable() {
        lines.push(style.success(&format!(
            "{} is writable",
            manager.root().display()
        )));
    } else {
        failures += 1;
        lines.push(style.error(&format!(
            "{} is not writable",
            manager.root().display()
        )));
    }

    let validator = Validator::new();
    let ids: BTreeSet<String> = manager.list_available().into_iter().collect();
    for id in &ids {
        let record = match manager.load_record_for_edit(id) {
            Ok(record) => record,
            Err(e) => {
                failures += 1;
                lines.push(style.error(&format!("{}: {}", id, e)));
                continue;
            }
        };

        let result = validator.validate_record(&record);
        for error in &result.errors {
            lines.push(style.error(&format!("{}: {}", id, error)));
        }
        for warning in &result.warnings {
            lines.push(style.warning(&format!("{}: {}", id, warning)));
        }
        if !result.is_valid() {
            failures += 1;
        }
    }

    let report = lines.join("\n");
    if failures > 0 {
        return Err(CliError::CheckFailed { failures, report });
    }

    Ok(format!(
        "{}\n{}",
        report,
        style.success(&format!("{} record(s) checked", ids.len()))
    ))
}

/// Watch the root until Enter is pressed
pub fn watch(manager: Arc<ConfigManager>, style: &OutputStyle) -> CliResult<String> {
    let root = manager.root().display().to_string();
    let _watcher = ConfigWatcher::spawn(manager)?;

    println!(
        "{}",
        style.success(&format!("Watching {}; press Enter to stop", root))
    );
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    Ok(String::new())
}
