//! Serializes a score into the native container: the shared header
//! block followed by an object stream rooted at the score object.
//!
//! Players and instruments are serialized in full inside the score
//! body's object sequences; player changes then reference them through
//! the identity maps, so each body appears exactly once no matter how
//! many changes point at it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::NATIVE_SIGNATURE;
use crate::score::{Barline, Note, PlayerChange, Position, Score, Staff, System, Tuning};
use crate::stream::{HEADER_BLOCK_SIZE, OutputStream};

use super::object_stream::{ObjectKey, ObjectWriter};

pub const CLASS_SCORE: &str = "Score";
pub const CLASS_PLAYER: &str = "Player";
pub const CLASS_TUNING: &str = "Tuning";
pub const CLASS_INSTRUMENT: &str = "Instrument";
pub const CLASS_SYSTEM: &str = "System";

/// Encodes a score into a file at `path`.
pub fn export_file(path: impl AsRef<Path>, score: &Score) -> Result<()> {
    let file = File::create(path)?;
    let mut sink = BufWriter::new(file);
    export_bytes(score, &mut sink)?;
    sink.flush().map_err(|e| Error::StreamWrite(e.to_string()))
}

/// Encodes a score into any byte sink.
///
/// The identity maps live exactly as long as this call; partial output
/// from a failed export must be discarded by the caller.
pub fn export_bytes(score: &Score, sink: impl Write) -> Result<()> {
    let mut out = OutputStream::new(sink);
    write_header(&mut out)?;

    let mut writer = ObjectWriter::new(out);
    writer.write_object(ObjectKey::new(CLASS_SCORE, 0), |w| write_score(w, score))?;
    Ok(())
}

fn write_header(out: &mut OutputStream<impl Write>) -> Result<()> {
    let signature = NATIVE_SIGNATURE.as_bytes();
    out.write_u8(signature.len() as u8)?;
    out.write_bytes(signature)?;
    let padding = HEADER_BLOCK_SIZE - 1 - signature.len();
    out.write_bytes(&vec![0u8; padding])
}

fn write_score(w: &mut ObjectWriter<impl Write>, score: &Score) -> Result<()> {
    let song = &score.info.song;
    for text in [
        &song.title,
        &song.artist,
        &song.album,
        &song.author.composer,
        &song.author.lyricist,
        &song.arranger,
        &song.transcriber,
        &song.copyright,
        &song.lyrics,
        &song.performance_notes,
    ] {
        w.stream().write_wide_string(text)?;
    }

    w.write_count(score.players.len())?;
    for (i, player) in score.players.iter().enumerate() {
        w.write_object(ObjectKey::new(CLASS_PLAYER, i as u32), |w| {
            w.stream().write_wide_string(&player.description)?;
            write_tuning(w, i as u32, &player.tuning)
        })?;
    }

    w.write_count(score.instruments.len())?;
    for (i, instrument) in score.instruments.iter().enumerate() {
        w.write_object(ObjectKey::new(CLASS_INSTRUMENT, i as u32), |w| {
            w.stream().write_wide_string(&instrument.description)?;
            w.stream().write_u8(instrument.midi_preset)
        })?;
    }

    w.write_count(score.systems.len())?;
    for (i, system) in score.systems.iter().enumerate() {
        w.write_object(ObjectKey::new(CLASS_SYSTEM, i as u32), |w| {
            write_system(w, score, system)
        })?;
    }

    Ok(())
}

fn write_tuning(w: &mut ObjectWriter<impl Write>, ordinal: u32, tuning: &Tuning) -> Result<()> {
    w.write_object(ObjectKey::new(CLASS_TUNING, ordinal), |w| {
        w.stream().write_u8(tuning.capo())?;
        // Open-string pitches are plain bytes, the small-vector case.
        w.write_small_vector(tuning.pitches())
    })?;
    Ok(())
}

fn write_system(
    w: &mut ObjectWriter<impl Write>,
    score: &Score,
    system: &System,
) -> Result<()> {
    w.write_count(system.staves.len())?;
    for staff in &system.staves {
        write_staff(w, staff)?;
    }

    w.write_count(system.barlines.len())?;
    for barline in &system.barlines {
        write_barline(w, barline)?;
    }

    w.write_count(system.player_changes.len())?;
    for change in &system.player_changes {
        write_player_change(w, score, change)?;
    }

    Ok(())
}

fn write_staff(w: &mut ObjectWriter<impl Write>, staff: &Staff) -> Result<()> {
    w.stream().write_u8(staff.clef as u8)?;
    w.stream().write_u8(staff.string_count)?;
    w.write_count(staff.voices.len())?;
    for voice in &staff.voices {
        w.write_count(voice.positions.len())?;
        for position in &voice.positions {
            write_position(w, position)?;
        }
    }
    Ok(())
}

fn write_position(w: &mut ObjectWriter<impl Write>, position: &Position) -> Result<()> {
    let out = w.stream();
    out.write_u32(position.position)?;
    out.write_i8(position.duration.to_wire())?;

    out.write_bool(position.tuplet.is_some())?;
    if let Some(tuplet) = position.tuplet {
        out.write_u8(tuplet)?;
    }

    out.write_u32(position.properties.bits())?;

    out.write_bool(position.tremolo_bar.is_some())?;
    if let Some(tremolo) = position.tremolo_bar {
        out.write_u8(tremolo.event as u8)?;
        out.write_u8(tremolo.pitch)?;
    }

    let notes = u8::try_from(position.notes.len()).map_err(|_| {
        Error::inconsistent(
            "note count",
            format!("{} notes on one position", position.notes.len()),
        )
    })?;
    out.write_u8(notes)?;
    for note in &position.notes {
        write_note(out, note)?;
    }
    Ok(())
}

fn write_note(out: &mut OutputStream<impl Write>, note: &Note) -> Result<()> {
    out.write_u8(note.string)?;
    out.write_u8(note.fret)?;
    out.write_u32(note.properties.bits())?;

    out.write_bool(note.tapped_harmonic_fret.is_some())?;
    if let Some(fret) = note.tapped_harmonic_fret {
        out.write_u8(fret)?;
    }
    out.write_bool(note.trilled_fret.is_some())?;
    if let Some(fret) = note.trilled_fret {
        out.write_u8(fret)?;
    }
    out.write_bool(note.artificial_harmonic.is_some())?;
    if let Some(offset) = note.artificial_harmonic {
        out.write_u8(offset)?;
    }
    out.write_bool(note.bend.is_some())?;
    if let Some(bend) = note.bend {
        out.write_u8(bend.kind as u8)?;
        out.write_u8(bend.pitch)?;
    }
    Ok(())
}

fn write_barline(w: &mut ObjectWriter<impl Write>, barline: &Barline) -> Result<()> {
    let out = w.stream();
    out.write_u32(barline.position)?;
    out.write_u8(barline.bar_type as u8)?;
    out.write_u8(barline.repeat_count)?;
    out.write_bool(barline.rehearsal_sign.is_some())?;
    if let Some(sign) = &barline.rehearsal_sign {
        out.write_wide_string(&sign.letters)?;
        out.write_wide_string(&sign.description)?;
    }
    Ok(())
}

/// Active players are written as references to the player and
/// instrument objects serialized earlier; the identity maps resolve
/// them to bare indices.
fn write_player_change(
    w: &mut ObjectWriter<impl Write>,
    score: &Score,
    change: &PlayerChange,
) -> Result<()> {
    w.stream().write_u32(change.position)?;
    w.write_count(change.staves.len())?;
    for actives in &change.staves {
        w.write_count(actives.len())?;
        for active in actives {
            let player = score.players.get(active.player as usize).ok_or_else(|| {
                Error::inconsistent("player index", format!("{} out of range", active.player))
            })?;
            w.write_object(ObjectKey::new(CLASS_PLAYER, active.player), |w| {
                w.stream().write_wide_string(&player.description)?;
                write_tuning(w, active.player, &player.tuning)
            })?;

            let instrument = score
                .instruments
                .get(active.instrument as usize)
                .ok_or_else(|| {
                    Error::inconsistent(
                        "instrument index",
                        format!("{} out of range", active.instrument),
                    )
                })?;
            w.write_object(ObjectKey::new(CLASS_INSTRUMENT, active.instrument), |w| {
                w.stream().write_wide_string(&instrument.description)?;
                w.stream().write_u8(instrument.midi_preset)
            })?;
        }
    }
    Ok(())
}
