use std::path::Path;

use anyhow::{Context, Result};
use fretwork_core::export::format_score_summary;
use fretwork_core::{Score, export_file, import_file};
use tracing::info;

pub fn run(input: &Path, output: &Path) -> Result<()> {
    let mut score = Score::new();
    import_file(input, &mut score)
        .with_context(|| format!("failed to import {}", input.display()))?;
    info!("imported {}", format_score_summary(&score));

    export_file(output, &score)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {}", output.display());
    Ok(())
}
