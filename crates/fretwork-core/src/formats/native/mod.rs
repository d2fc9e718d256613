//! Decoder for the native container: the read side of the object
//! stream written by [`crate::export`].
//!
//! The stream interleaves class-information records, object bodies and
//! back-references. A new object's token always equals the number of
//! objects decoded so far, which is what distinguishes a body from a
//! reference without a marker byte. References resolve through the same
//! identity bookkeeping the writer used, mapped back onto score-model
//! indices.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::export::{
    CLASS_INSTRUMENT, CLASS_PLAYER, CLASS_SCORE, CLASS_SYSTEM, CLASS_TUNING, NEW_CLASS_TAG,
};
use crate::score::{
    ActivePlayer, BarType, Barline, Bend, BendKind, Clef, DurationType, Instrument, Note,
    NoteProperties, Player, PlayerChange, Position, PositionProperties, PositionProperty,
    RehearsalSign, ScoreBuilder, SongData, TremoloBar, TremoloEvent, Tuning,
};
use crate::stream::InputStream;

/// One object encounter: a body to decode, or a back-reference.
enum ObjectToken {
    New(u32),
    Reference(u32),
}

/// Reader-side counterpart of the serializer's identity bookkeeping.
struct ObjectReader<'s, 'a> {
    stream: &'s mut InputStream<'a>,
    classes: Vec<String>,
    objects_seen: u32,
}

impl<'s, 'a> ObjectReader<'s, 'a> {
    fn new(stream: &'s mut InputStream<'a>) -> Self {
        Self {
            stream,
            classes: Vec::new(),
            objects_seen: 0,
        }
    }

    /// Reads a class reference, consuming the class-information record
    /// on first sight, and checks it names the expected class.
    fn expect_class(&mut self, expected: &str) -> Result<()> {
        let tag = self.stream.read_u16()?;
        let index = if tag == NEW_CLASS_TAG {
            let name = self.stream.read_string()?;
            let declared = self.stream.read_u16()?;
            if declared as usize != self.classes.len() {
                return Err(Error::inconsistent(
                    "class index",
                    format!("{declared} declared, {} expected", self.classes.len()),
                ));
            }
            self.classes.push(name);
            declared
        } else {
            tag
        };

        let name = self.classes.get(index as usize).ok_or_else(|| {
            Error::inconsistent("class index", format!("{index} out of range"))
        })?;
        if name != expected {
            return Err(Error::inconsistent(
                "class name",
                format!("expected {expected}, found {name}"),
            ));
        }
        Ok(())
    }

    fn read_object_token(&mut self) -> Result<ObjectToken> {
        let token = self.stream.read_u32()?;
        if token == self.objects_seen {
            self.objects_seen += 1;
            Ok(ObjectToken::New(token))
        } else if token < self.objects_seen {
            Ok(ObjectToken::Reference(token))
        } else {
            Err(Error::inconsistent(
                "object index",
                format!("{token} ahead of object count {}", self.objects_seen),
            ))
        }
    }

    fn read_small_vector(&mut self) -> Result<Vec<u8>> {
        let count = self.stream.read_u8()? as usize;
        Ok(self.stream.read_bytes(count)?.to_vec())
    }
}

/// Identity-to-model index maps built up during one import.
#[derive(Default)]
struct ReferenceMaps {
    players: HashMap<u32, u32>,
    instruments: HashMap<u32, u32>,
    tunings: HashMap<u32, Tuning>,
}

/// Decodes a native container (positioned after the header block) into
/// the builder's score.
pub fn import(stream: &mut InputStream<'_>, builder: &mut ScoreBuilder<'_>) -> Result<()> {
    let mut reader = ObjectReader::new(stream);
    let mut maps = ReferenceMaps::default();

    reader
        .expect_class(CLASS_SCORE)
        .map_err(|e| e.at_stage("score object"))?;
    match reader.read_object_token().map_err(|e| e.at_stage("score object"))? {
        ObjectToken::New(_) => {}
        ObjectToken::Reference(_) => {
            return Err(Error::inconsistent(
                "object index",
                "score root cannot be a reference".to_string(),
            ));
        }
    }

    let song = read_song_data(&mut reader).map_err(|e| e.at_stage("score object"))?;
    builder.set_song_data(song);

    let players = read_count(&mut reader).map_err(|e| e.at_stage("players"))?;
    for _ in 0..players {
        read_player(&mut reader, builder, &mut maps).map_err(|e| e.at_stage("players"))?;
    }

    let instruments = read_count(&mut reader).map_err(|e| e.at_stage("instruments"))?;
    for _ in 0..instruments {
        read_instrument(&mut reader, builder, &mut maps)
            .map_err(|e| e.at_stage("instruments"))?;
    }

    let systems = read_count(&mut reader).map_err(|e| e.at_stage("systems"))?;
    for _ in 0..systems {
        read_system(&mut reader, builder, &mut maps).map_err(|e| e.at_stage("systems"))?;
    }

    Ok(())
}

fn read_count(reader: &mut ObjectReader<'_, '_>) -> Result<u32> {
    reader.stream.read_u32()
}

fn read_song_data(reader: &mut ObjectReader<'_, '_>) -> Result<SongData> {
    let mut song = SongData::default();
    for field in [
        &mut song.title,
        &mut song.artist,
        &mut song.album,
        &mut song.author.composer,
        &mut song.author.lyricist,
        &mut song.arranger,
        &mut song.transcriber,
        &mut song.copyright,
        &mut song.lyrics,
        &mut song.performance_notes,
    ] {
        *field = reader.stream.read_wide_string()?;
    }
    Ok(song)
}

/// Reads a player encounter, decoding the body on first sight and
/// resolving references afterwards. Returns the model index.
fn read_player(
    reader: &mut ObjectReader<'_, '_>,
    builder: &mut ScoreBuilder<'_>,
    maps: &mut ReferenceMaps,
) -> Result<u32> {
    reader.expect_class(CLASS_PLAYER)?;
    match reader.read_object_token()? {
        ObjectToken::Reference(object) => maps.players.get(&object).copied().ok_or_else(|| {
            Error::inconsistent("object index", format!("{object} is not a player"))
        }),
        ObjectToken::New(object) => {
            let description = reader.stream.read_wide_string()?;
            let tuning = read_tuning(reader, maps)?;
            let index = builder.add_player(Player::new(description, tuning)) as u32;
            maps.players.insert(object, index);
            Ok(index)
        }
    }
}

fn read_tuning(reader: &mut ObjectReader<'_, '_>, maps: &mut ReferenceMaps) -> Result<Tuning> {
    reader.expect_class(CLASS_TUNING)?;
    match reader.read_object_token()? {
        ObjectToken::Reference(object) => maps.tunings.get(&object).cloned().ok_or_else(|| {
            Error::inconsistent("object index", format!("{object} is not a tuning"))
        }),
        ObjectToken::New(object) => {
            let capo = reader.stream.read_u8()?;
            let pitches = reader.read_small_vector()?;
            let tuning = Tuning::new(pitches, capo);
            maps.tunings.insert(object, tuning.clone());
            Ok(tuning)
        }
    }
}

fn read_instrument(
    reader: &mut ObjectReader<'_, '_>,
    builder: &mut ScoreBuilder<'_>,
    maps: &mut ReferenceMaps,
) -> Result<u32> {
    reader.expect_class(CLASS_INSTRUMENT)?;
    match reader.read_object_token()? {
        ObjectToken::Reference(object) => {
            maps.instruments.get(&object).copied().ok_or_else(|| {
                Error::inconsistent("object index", format!("{object} is not an instrument"))
            })
        }
        ObjectToken::New(object) => {
            let description = reader.stream.read_wide_string()?;
            let midi_preset = reader.stream.read_u8()?;
            let index = builder.add_instrument(Instrument::new(description, midi_preset)) as u32;
            maps.instruments.insert(object, index);
            Ok(index)
        }
    }
}

fn read_system(
    reader: &mut ObjectReader<'_, '_>,
    builder: &mut ScoreBuilder<'_>,
    maps: &mut ReferenceMaps,
) -> Result<()> {
    reader.expect_class(CLASS_SYSTEM)?;
    match reader.read_object_token()? {
        ObjectToken::New(_) => {}
        ObjectToken::Reference(_) => {
            return Err(Error::inconsistent(
                "object index",
                "a system is never shared".to_string(),
            ));
        }
    }

    builder.begin_system();

    let staves = read_count(reader)?;
    for _ in 0..staves {
        let clef_byte = reader.stream.read_u8()?;
        let clef = Clef::from_u8(clef_byte)
            .ok_or_else(|| Error::inconsistent("clef", format!("unknown value {clef_byte}")))?;
        let string_count = reader.stream.read_u8()?;
        let voices = read_count(reader)?;
        let staff = builder.add_staff(clef, string_count, voices as usize)?;

        for voice in 0..voices {
            builder.select_voice(staff, voice as usize)?;
            let positions = read_count(reader)?;
            for _ in 0..positions {
                let position = read_position(reader, string_count)?;
                builder.append_position(position)?;
            }
        }
    }

    let barlines = read_count(reader)?;
    for _ in 0..barlines {
        let barline = read_barline(reader)?;
        builder.add_barline(barline)?;
    }

    let changes = read_count(reader)?;
    for _ in 0..changes {
        let change = read_player_change(reader, builder, maps)?;
        builder.record_player_change(change)?;
    }

    Ok(())
}

fn read_position(reader: &mut ObjectReader<'_, '_>, strings: u8) -> Result<Position> {
    let offset = reader.stream.read_u32()?;
    let raw_duration = reader.stream.read_i8()?;
    let duration = DurationType::from_wire(raw_duration).ok_or_else(|| {
        Error::inconsistent("duration", format!("unknown value {raw_duration}"))
    })?;

    let mut position = Position::new(offset, duration);

    if reader.stream.read_bool()? {
        position.tuplet = Some(reader.stream.read_u8()?);
    }

    let bits = reader.stream.read_u32()?;
    position.properties = PositionProperties::from_bits(bits).ok_or_else(|| {
        Error::inconsistent("position properties", format!("unknown bits {bits:#x}"))
    })?;
    if position.has_property(PositionProperty::Dotted)
        && position.has_property(PositionProperty::DoubleDotted)
    {
        warn!("position at offset {offset} is both dotted and double dotted");
        position.properties.clear(PositionProperty::Dotted);
    }

    if reader.stream.read_bool()? {
        let raw_event = reader.stream.read_u8()?;
        let event = TremoloEvent::from_u8(raw_event).ok_or_else(|| {
            Error::inconsistent("tremolo event", format!("unknown value {raw_event}"))
        })?;
        let pitch = reader.stream.read_u8()?;
        position.tremolo_bar = Some(TremoloBar { event, pitch });
    }

    let notes = reader.stream.read_u8()?;
    if notes > strings {
        return Err(Error::inconsistent(
            "note count",
            format!("{notes} notes on a {strings}-string staff"),
        ));
    }
    for _ in 0..notes {
        let note = read_note(reader, strings)?;
        position.notes.push(note);
    }

    Ok(position)
}

fn read_note(reader: &mut ObjectReader<'_, '_>, strings: u8) -> Result<Note> {
    let string = reader.stream.read_u8()?;
    if string >= strings {
        return Err(Error::inconsistent(
            "string index",
            format!("{string} out of range for {strings} strings"),
        ));
    }
    let fret = reader.stream.read_u8()?;
    let mut note = Note::new(string, fret);

    let bits = reader.stream.read_u32()?;
    note.properties = NoteProperties::from_bits(bits).ok_or_else(|| {
        Error::inconsistent("note properties", format!("unknown bits {bits:#x}"))
    })?;

    if reader.stream.read_bool()? {
        note.tapped_harmonic_fret = Some(reader.stream.read_u8()?);
    }
    if reader.stream.read_bool()? {
        note.trilled_fret = Some(reader.stream.read_u8()?);
    }
    if reader.stream.read_bool()? {
        note.artificial_harmonic = Some(reader.stream.read_u8()?);
    }
    if reader.stream.read_bool()? {
        let raw_kind = reader.stream.read_u8()?;
        let kind = BendKind::from_u8(raw_kind).ok_or_else(|| {
            Error::inconsistent("bend kind", format!("unknown value {raw_kind}"))
        })?;
        let pitch = reader.stream.read_u8()?;
        note.bend = Some(Bend { kind, pitch });
    }

    note.check_exclusive_marks()?;
    Ok(note)
}

fn read_barline(reader: &mut ObjectReader<'_, '_>) -> Result<Barline> {
    let position = reader.stream.read_u32()?;
    let type_byte = reader.stream.read_u8()?;
    let bar_type = BarType::from_u8(type_byte)
        .ok_or_else(|| Error::inconsistent("bar type", format!("unknown value {type_byte}")))?;

    let mut barline = Barline::new(position, bar_type);
    barline.repeat_count = reader.stream.read_u8()?;

    if reader.stream.read_bool()? {
        let letters = reader.stream.read_wide_string()?;
        let description = reader.stream.read_wide_string()?;
        barline.rehearsal_sign = Some(RehearsalSign::new(letters, description));
    }
    Ok(barline)
}

fn read_player_change(
    reader: &mut ObjectReader<'_, '_>,
    builder: &mut ScoreBuilder<'_>,
    maps: &mut ReferenceMaps,
) -> Result<PlayerChange> {
    let position = reader.stream.read_u32()?;
    let staves = read_count(reader)?;

    let mut change = PlayerChange::new(position, Vec::with_capacity(staves as usize));
    for _ in 0..staves {
        let actives = read_count(reader)?;
        let mut staff_actives = Vec::with_capacity(actives as usize);
        for _ in 0..actives {
            let player = read_player(reader, builder, maps)?;
            let instrument = read_instrument(reader, builder, maps)?;
            staff_actives.push(ActivePlayer::new(player, instrument));
        }
        change.staves.push(staff_actives);
    }
    Ok(change)
}
