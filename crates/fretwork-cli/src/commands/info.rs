use std::path::Path;

use anyhow::{Context, Result};
use fretwork_core::export::format_score_console;
use fretwork_core::{Score, import_file};

pub fn run(path: &Path) -> Result<()> {
    let mut score = Score::new();
    import_file(path, &mut score)
        .with_context(|| format!("failed to import {}", path.display()))?;

    println!("{}", format_score_console(&score));
    Ok(())
}
