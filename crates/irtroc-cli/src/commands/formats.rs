//! The `irtroc formats` command.

use std::path::PathBuf;

use anyhow::Result;

use irtroc_core::config::load_config_from;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let registry = config.format_registry();

    for (name, format) in registry.iter() {
        let marker = if name == config.default_format {
            " (default)"
        } else {
            ""
        };
        println!(
            "{name}{marker}: user={} exercise={} time_taken={} correct={}",
            format.user, format.exercise, format.time_taken, format.correct
        );
    }

    Ok(())
}
