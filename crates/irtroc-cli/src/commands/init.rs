//! The `irtroc init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("irtroc.toml").exists() {
        println!("irtroc.toml already exists, skipping.");
    } else {
        std::fs::write("irtroc.toml", SAMPLE_CONFIG)?;
        println!("Created irtroc.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set evaluation_index if your data flags held-out responses");
    println!("  2. Run: irtroc formats");
    println!("  3. Run: irtroc run --model model.json --test-data test.csv --output roc.csv");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# irtroc configuration

# Data-format profile used when --data-format is not given.
default_format = "simple"

# Column holding the held-out flag ("true"/"True"). Leave unset to hold out
# one random response per user.
# evaluation_index = 4

# Seed for the random held-out choice.
# seed = 42

# Custom profiles: zero-based column positions.
[formats.export]
user = 0
exercise = 1
time_taken = 2
correct = 3
"#;
