use std::path::Path;

use anyhow::{Context, Result};
use fretwork_core::{Score, import_file};

pub fn run(path: &Path) -> Result<()> {
    let mut score = Score::new();
    import_file(path, &mut score)
        .with_context(|| format!("failed to import {}", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&score)?);
    Ok(())
}
