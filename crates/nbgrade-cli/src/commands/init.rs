//! The `nbgrade init` command.

use anyhow::Result;

use nbgrade_core::config::CONFIG_TEMPLATE;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("nbgrade.toml");
    if path.exists() {
        println!("nbgrade.toml already exists, skipping.");
    } else {
        std::fs::write(path, CONFIG_TEMPLATE)?;
        println!("Created nbgrade.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point data_dir at the folder holding the assignment data files");
    println!("  2. Check that `jupyter kernelspec list` shows the R kernel");
    println!("  3. Run: nbgrade grade --notebook submissions/homework.ipynb --format all");

    Ok(())
}
