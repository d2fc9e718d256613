//! Console output formatting with colored display

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use crate::score::Score;

/// Format a decoded score for console display with colored output.
///
/// Returns a multi-line string with a boxed format: song header, one
/// line per player, then content counts.
pub fn format_score_console(score: &Score) -> String {
    let mut output = String::new();
    let song = &score.info.song;

    let title = if song.title.is_empty() {
        "(untitled)".to_string()
    } else {
        song.title.clone()
    };
    let title_line = if song.artist.is_empty() {
        format!("  {}", title.bold())
    } else {
        format!("  {} / {}", title.bold(), song.artist)
    };

    let border_width = (title.len() + song.artist.len() + 8).max(50);
    let border: String = "━".repeat(border_width);
    let border_dim = border.dimmed();

    let _ = writeln!(output, "{}", border_dim);
    let _ = writeln!(output, "{}", title_line);
    let _ = writeln!(output, "{}", border_dim);

    if !song.author.composer.is_empty() {
        let _ = writeln!(output, "  COMPOSER : {}", song.author.composer);
    }
    if !song.album.is_empty() {
        let _ = writeln!(output, "  ALBUM    : {}", song.album);
    }

    for (i, player) in score.players.iter().enumerate() {
        let capo = if player.tuning.capo() > 0 {
            format!(" (capo {})", player.tuning.capo())
        } else {
            String::new()
        };
        let _ = writeln!(
            output,
            "  PLAYER {} : {} [{}{}]",
            i + 1,
            player.description.cyan(),
            player.tuning.to_string().green(),
            capo
        );
    }

    let positions: usize = score
        .systems
        .iter()
        .flat_map(|s| &s.staves)
        .flat_map(|s| &s.voices)
        .map(|v| v.positions.len())
        .sum();

    let _ = writeln!(
        output,
        "  CONTENT  : {} systems, {} positions, {} instruments",
        score.systems.len().yellow(),
        positions.yellow(),
        score.instruments.len().yellow()
    );
    let _ = write!(output, "{}", border_dim);

    output
}

/// Simple score summary for logging
pub fn format_score_summary(score: &Score) -> String {
    format!(
        "{} ({} players, {} systems)",
        if score.info.song.title.is_empty() {
            "(untitled)"
        } else {
            &score.info.song.title
        },
        score.players.len(),
        score.systems.len()
    )
}
