//! Decoder for the Guitar Pro binary dialect family (versions 3 to 5).
//!
//! The file is one long record sequence with no backtracking: song
//! metadata, the 64-entry channel table, measure headers, track
//! definitions, then per measure / per track / per voice the beat
//! stream. Almost everything past the fixed tables is gated by bit
//! flags; a sub-record is read exactly when its bit is set, since an
//! unconditional read would desynchronize the cursor for every record
//! that follows.

mod channel;

pub use channel::{CHANNEL_COUNT, Channel};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::formats::FileVersion;
use crate::score::{
    ActivePlayer, BarType, Barline, Bend, BendKind, Clef, DurationType, Note, NoteProperty,
    Player, PlayerChange, Position, PositionProperty, RehearsalSign, ScoreBuilder, SongData,
    TremoloBar, TremoloEvent, Tuning,
};
use crate::stream::InputStream;

/// Measures packed into one system. Real layout is the arranger's job;
/// the codec only needs a deterministic grouping.
const MEASURES_PER_SYSTEM: usize = 4;

const TRACK_NAME_BLOCK: usize = 40;
const MAX_STRINGS: usize = 7;
const MAX_TRACKS: u32 = 64;
const MAX_MEASURES: u32 = 16384;
const MAX_BEATS_PER_MEASURE: u32 = 1024;
const MAX_EFFECT_POINTS: u32 = 64;

// Beat header flags.
const BEAT_DOTTED: u8 = 0x01;
const BEAT_CHORD_DIAGRAM: u8 = 0x02;
const BEAT_TEXT: u8 = 0x04;
const BEAT_EFFECTS: u8 = 0x08;
const BEAT_MIX_TABLE: u8 = 0x10;
const BEAT_TUPLET: u8 = 0x20;
const BEAT_STATUS: u8 = 0x40;
const BEAT_DOUBLE_DOTTED: u8 = 0x80;

const BEAT_STATUS_EMPTY: u8 = 0x00;
const BEAT_STATUS_REST: u8 = 0x02;

// Measure header flags.
const MEASURE_NUMERATOR: u8 = 0x01;
const MEASURE_DENOMINATOR: u8 = 0x02;
const MEASURE_REPEAT_START: u8 = 0x04;
const MEASURE_REPEAT_END: u8 = 0x08;
const MEASURE_ALTERNATE_ENDING: u8 = 0x10;
const MEASURE_MARKER: u8 = 0x20;
const MEASURE_KEY_CHANGE: u8 = 0x40;
const MEASURE_DOUBLE_BAR: u8 = 0x80;

// Note header flags.
const NOTE_INDEPENDENT_DURATION: u8 = 0x01;
const NOTE_HEAVY_ACCENT: u8 = 0x02;
const NOTE_GHOST: u8 = 0x04;
const NOTE_EFFECTS: u8 = 0x08;
const NOTE_DYNAMICS: u8 = 0x10;
const NOTE_TYPE: u8 = 0x20;
const NOTE_ACCENT: u8 = 0x40;
const NOTE_FINGERING: u8 = 0x80;

const NOTE_TYPE_NORMAL: u8 = 1;
const NOTE_TYPE_TIED: u8 = 2;
const NOTE_TYPE_MUTED: u8 = 3;

// Beat effect flags, first byte.
const EFFECT_VIBRATO: u8 = 0x01;
const EFFECT_WIDE_VIBRATO: u8 = 0x02;
const EFFECT_NATURAL_HARMONIC: u8 = 0x04;
const EFFECT_ARTIFICIAL_HARMONIC: u8 = 0x08;
const EFFECT_FADE_IN: u8 = 0x10;
const EFFECT_TAP: u8 = 0x20;
const EFFECT_STROKE: u8 = 0x40;
const EFFECT_TREMOLO_BAR: u8 = 0x80;

// Beat effect flags, second byte (v4 and later).
const EFFECT2_RASGUEADO: u8 = 0x01;
const EFFECT2_ARPEGGIO: u8 = 0x02;

// Note effect flags, first byte.
const NOTE_EFFECT_BEND: u8 = 0x01;
const NOTE_EFFECT_HAMMER: u8 = 0x02;
const NOTE_EFFECT_GP3_SLIDE: u8 = 0x04;
const NOTE_EFFECT_LET_RING: u8 = 0x08;
const NOTE_EFFECT_GRACE: u8 = 0x10;

// Note effect flags, second byte (v4 and later).
const NOTE_EFFECT2_STACCATO: u8 = 0x01;
const NOTE_EFFECT2_PALM_MUTE: u8 = 0x02;
const NOTE_EFFECT2_TREMOLO_PICKING: u8 = 0x04;
const NOTE_EFFECT2_SLIDE: u8 = 0x08;
const NOTE_EFFECT2_HARMONIC: u8 = 0x10;
const NOTE_EFFECT2_TRILL: u8 = 0x20;
const NOTE_EFFECT2_VIBRATO: u8 = 0x40;
const NOTE_EFFECT2_OCTAVE: u8 = 0x80;

const HARMONIC_NONE: u8 = 0;
const HARMONIC_NATURAL: u8 = 1;
const HARMONIC_ARTIFICIAL: u8 = 2;
const HARMONIC_TAPPED: u8 = 3;

/// One parsed measure header; time signature and key change fields are
/// consumed but not represented in the score model.
struct MeasureHeader {
    repeat_start: bool,
    repeat_end: Option<u8>,
    double_bar: bool,
    rehearsal_sign: Option<RehearsalSign>,
}

/// Per-track decoding state carried through the beat stage.
struct TrackState {
    player: u32,
    instrument: u32,
    string_count: u8,
    clef: Clef,
    /// Which strings have sounded so far, per voice; drives the
    /// hammer-on-from-nowhere distinction.
    strings_seen: [[bool; MAX_STRINGS]; 2],
}

/// Harmonic marks announced at beat level (version 3 files only) that
/// apply to every note of the beat.
#[derive(Default, Clone, Copy)]
struct PendingHarmonics {
    natural: bool,
    artificial: bool,
}

/// Staged decoder for one Guitar Pro file.
pub struct GpImporter {
    version: FileVersion,
    rehearsal_count: u32,
}

impl GpImporter {
    pub fn new(version: FileVersion) -> Self {
        Self {
            version,
            rehearsal_count: 0,
        }
    }

    fn voices(&self) -> usize {
        if self.version >= FileVersion::Gp5 { 2 } else { 1 }
    }

    /// Decodes the stream (positioned just after the header block) into
    /// the builder's score. All-or-nothing: the first failure aborts and
    /// the caller discards the partial score.
    pub fn import(
        mut self,
        stream: &mut InputStream<'_>,
        builder: &mut ScoreBuilder<'_>,
    ) -> Result<()> {
        let song = self
            .read_song_data(stream)
            .map_err(|e| e.at_stage("header"))?;
        builder.set_song_data(song);

        let channels = channel::read_channels(stream).map_err(|e| e.at_stage("channels"))?;

        let (measure_count, track_count) =
            self.read_counts(stream).map_err(|e| e.at_stage("measures"))?;

        let headers = self
            .read_measure_headers(stream, measure_count)
            .map_err(|e| e.at_stage("measures"))?;

        let mut tracks = self
            .read_tracks(stream, builder, track_count, &channels)
            .map_err(|e| e.at_stage("tracks"))?;

        self.read_systems(stream, builder, &headers, &mut tracks)
            .map_err(|e| e.at_stage("beats"))
    }

    fn read_song_data(&self, stream: &mut InputStream<'_>) -> Result<SongData> {
        let mut song = SongData::default();

        song.title = stream.read_long_string()?;
        let subtitle = stream.read_long_string()?;
        if !subtitle.is_empty() {
            debug!("discarding subtitle {subtitle:?}");
        }
        song.artist = stream.read_long_string()?;
        song.album = stream.read_long_string()?;

        if self.version >= FileVersion::Gp5 {
            song.author.lyricist = stream.read_long_string()?;
            song.author.composer = stream.read_long_string()?;
        } else {
            // "Words & Music" convention: one author field credits both.
            let author = stream.read_long_string()?;
            song.author.composer = author.clone();
            song.author.lyricist = author;
        }

        song.copyright = stream.read_long_string()?;
        song.transcriber = stream.read_long_string()?;
        song.performance_notes = stream.read_long_string()?;

        let notice_lines = stream.read_u32()?;
        for _ in 0..notice_lines {
            let line = stream.read_long_string()?;
            debug!("notice: {line}");
        }

        if self.version <= FileVersion::Gp4 {
            let _triplet_feel = stream.read_bool()?;
        }

        if self.version >= FileVersion::Gp4 {
            song.lyrics = self.read_lyrics(stream)?;
        }

        let _tempo = stream.read_u32()?;
        let _key = stream.read_i8()?;
        let _octave = stream.read_u8()?;

        Ok(song)
    }

    /// Reads the lyric section: a track number plus five lines, each
    /// with a start measure. Only the first non-empty line is kept.
    fn read_lyrics(&self, stream: &mut InputStream<'_>) -> Result<String> {
        let _track = stream.read_u32()?;
        let mut first = String::new();
        for _ in 0..5 {
            let _start_measure = stream.read_u32()?;
            let line = stream.read_long_string()?;
            if first.is_empty() {
                first = line;
            }
        }
        Ok(first)
    }

    fn read_counts(&self, stream: &mut InputStream<'_>) -> Result<(u32, u32)> {
        let measures = stream.read_u32()?;
        if measures > MAX_MEASURES {
            return Err(Error::inconsistent(
                "measure count",
                format!("{measures} exceeds {MAX_MEASURES}"),
            ));
        }
        let tracks = stream.read_u32()?;
        if tracks == 0 || tracks > MAX_TRACKS {
            return Err(Error::inconsistent(
                "track count",
                format!("{tracks} outside 1..={MAX_TRACKS}"),
            ));
        }
        Ok((measures, tracks))
    }

    fn read_measure_headers(
        &mut self,
        stream: &mut InputStream<'_>,
        count: u32,
    ) -> Result<Vec<MeasureHeader>> {
        let mut headers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let flags = stream.read_u8()?;

            if flags & MEASURE_NUMERATOR != 0 {
                let _numerator = stream.read_u8()?;
            }
            if flags & MEASURE_DENOMINATOR != 0 {
                let _denominator = stream.read_u8()?;
            }

            let repeat_end = if flags & MEASURE_REPEAT_END != 0 {
                Some(stream.read_u8()?)
            } else {
                None
            };
            if flags & MEASURE_ALTERNATE_ENDING != 0 {
                let _ending = stream.read_u8()?;
            }

            let rehearsal_sign = if flags & MEASURE_MARKER != 0 {
                Some(self.read_rehearsal_sign(stream)?)
            } else {
                None
            };

            if flags & MEASURE_KEY_CHANGE != 0 {
                let _key = stream.read_i8()?;
                let _minor = stream.read_u8()?;
            }

            headers.push(MeasureHeader {
                repeat_start: flags & MEASURE_REPEAT_START != 0,
                repeat_end,
                double_bar: flags & MEASURE_DOUBLE_BAR != 0,
                rehearsal_sign,
            });
        }
        Ok(headers)
    }

    /// Reads a marker and assigns it the next free rehearsal letter
    /// (A, B, ..., Z, AA, AB, ...).
    fn read_rehearsal_sign(&mut self, stream: &mut InputStream<'_>) -> Result<RehearsalSign> {
        let description = stream.read_long_string()?;
        let _color = stream.read_u32()?;

        let mut letters = String::new();
        let mut n = self.rehearsal_count;
        loop {
            letters.insert(0, (b'A' + (n % 26) as u8) as char);
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        self.rehearsal_count += 1;

        Ok(RehearsalSign::new(letters, description))
    }

    fn read_tracks(
        &self,
        stream: &mut InputStream<'_>,
        builder: &mut ScoreBuilder<'_>,
        count: u32,
        channels: &[Channel],
    ) -> Result<Vec<TrackState>> {
        let mut tracks = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let _flags = stream.read_u8()?;
            let name = stream.read_fixed_string(TRACK_NAME_BLOCK)?;

            let string_count = stream.read_u32()?;
            if string_count == 0 || string_count as usize > MAX_STRINGS {
                return Err(Error::inconsistent(
                    "string count",
                    format!("{string_count} outside 1..={MAX_STRINGS}"),
                ));
            }

            // Wire order is highest string first; the model stores
            // low-to-high.
            let mut pitches = Vec::with_capacity(string_count as usize);
            for slot in 0..MAX_STRINGS {
                let pitch = stream.read_u32()?;
                if (slot as u32) < string_count {
                    let pitch = u8::try_from(pitch)
                        .ok()
                        .filter(|&p| p <= 127)
                        .ok_or_else(|| {
                            Error::inconsistent("tuning pitch", format!("{pitch} not a MIDI note"))
                        })?;
                    pitches.push(pitch);
                }
            }
            pitches.reverse();

            let _port = stream.read_u32()?;
            let channel_index = stream.read_u32()?;
            if channel_index == 0 || channel_index as usize > channels.len() {
                return Err(Error::inconsistent(
                    "channel index",
                    format!("{channel_index} outside 1..={}", channels.len()),
                ));
            }
            let _effect_channel = stream.read_u32()?;
            let _fret_count = stream.read_u32()?;
            let capo = stream.read_u32()?;
            let capo = u8::try_from(capo)
                .map_err(|_| Error::inconsistent("capo fret", format!("{capo} out of range")))?;
            let clef_byte = stream.read_u8()?;
            let clef = Clef::from_u8(clef_byte)
                .ok_or_else(|| Error::inconsistent("clef", format!("unknown value {clef_byte}")))?;
            let _color = stream.read_u32()?;

            let patch = channels[channel_index as usize - 1].patch;
            let patch = u8::try_from(patch).map_err(|_| {
                Error::inconsistent("instrument patch", format!("{patch} out of range"))
            })?;
            let instrument = builder.find_or_add_instrument(patch)? as u32;
            let player = builder.add_player(Player::new(name, Tuning::new(pitches, capo))) as u32;

            tracks.push(TrackState {
                player,
                instrument,
                string_count: string_count as u8,
                clef,
                strings_seen: [[false; MAX_STRINGS]; 2],
            });
        }
        Ok(tracks)
    }

    /// Groups measures into systems and drives the beat stage.
    ///
    /// Each system gets one staff per track and a player change at
    /// offset 0 reflecting the assignments in force when it starts;
    /// mix-table instrument changes emit further player changes at the
    /// position where they occur.
    fn read_systems(
        &self,
        stream: &mut InputStream<'_>,
        builder: &mut ScoreBuilder<'_>,
        headers: &[MeasureHeader],
        tracks: &mut [TrackState],
    ) -> Result<()> {
        let voices = self.voices();

        for chunk in headers.chunks(MEASURES_PER_SYSTEM) {
            builder.begin_system();
            for track in tracks.iter() {
                builder.add_staff(track.clef, track.string_count, voices)?;
            }

            let mut opening = Barline::new(0, BarType::Single);
            if chunk[0].repeat_start {
                opening.bar_type = BarType::RepeatStart;
            }
            opening.rehearsal_sign = chunk[0].rehearsal_sign.clone();
            builder.add_barline(opening)?;

            builder.record_player_change(player_change_at(0, tracks))?;

            let mut offsets = vec![[0u32; 2]; tracks.len()];

            for (local, header) in chunk.iter().enumerate() {
                for t in 0..tracks.len() {
                    for voice in 0..voices {
                        builder.select_voice(t, voice)?;

                        let beat_count = stream.read_u32()?;
                        if beat_count > MAX_BEATS_PER_MEASURE {
                            return Err(Error::inconsistent(
                                "beat count",
                                format!("{beat_count} exceeds {MAX_BEATS_PER_MEASURE}"),
                            ));
                        }

                        for _ in 0..beat_count {
                            let offset = offsets[t][voice];
                            let (position, new_patch) =
                                self.read_beat(stream, &mut tracks[t], voice, offset)?;
                            builder.append_position(position)?;
                            offsets[t][voice] += 1;

                            if let Some(patch) = new_patch {
                                let instrument = builder.find_or_add_instrument(patch)? as u32;
                                if instrument != tracks[t].instrument {
                                    tracks[t].instrument = instrument;
                                    builder
                                        .record_player_change(player_change_at(offset, tracks))?;
                                }
                            }
                        }
                    }
                }

                let mut closing = Barline::new(offsets[0][0], BarType::Single);
                if let Some(count) = header.repeat_end {
                    closing.bar_type = BarType::RepeatEnd;
                    closing.repeat_count = count;
                } else if chunk.get(local + 1).is_some_and(|next| next.repeat_start) {
                    closing.bar_type = BarType::RepeatStart;
                } else if header.double_bar {
                    closing.bar_type = BarType::Double;
                }
                if let Some(next) = chunk.get(local + 1) {
                    closing.rehearsal_sign = next.rehearsal_sign.clone();
                }
                builder.add_barline(closing)?;
            }
        }
        Ok(())
    }

    /// Reads one beat into a position at the given offset. Returns the
    /// position plus a new MIDI patch when the beat's mix table changes
    /// the track's instrument.
    fn read_beat(
        &self,
        stream: &mut InputStream<'_>,
        track: &mut TrackState,
        voice: usize,
        offset: u32,
    ) -> Result<(Position, Option<u8>)> {
        let flags = stream.read_u8()?;

        let status = if flags & BEAT_STATUS != 0 {
            let status = stream.read_u8()?;
            if status != BEAT_STATUS_EMPTY && status != BEAT_STATUS_REST {
                return Err(Error::inconsistent(
                    "beat status",
                    format!("unknown value {status}"),
                ));
            }
            Some(status)
        } else {
            None
        };

        let raw_duration = stream.read_i8()?;
        let duration = DurationType::from_wire(raw_duration).ok_or_else(|| {
            Error::inconsistent("duration", format!("unknown value {raw_duration}"))
        })?;

        let mut position = Position::new(offset, duration);

        if flags & BEAT_DOTTED != 0 {
            position.set_property(PositionProperty::Dotted);
        }
        if flags & BEAT_DOUBLE_DOTTED != 0 {
            if position.has_property(PositionProperty::Dotted) {
                warn!("beat at offset {offset} is both dotted and double dotted");
                position.properties.clear(PositionProperty::Dotted);
            }
            position.set_property(PositionProperty::DoubleDotted);
        }

        if flags & BEAT_TUPLET != 0 {
            let tuplet = stream.read_u32()?;
            let tuplet = u8::try_from(tuplet)
                .ok()
                .filter(|&t| t >= 2)
                .ok_or_else(|| {
                    Error::inconsistent("tuplet", format!("{tuplet} not a valid grouping"))
                })?;
            position.tuplet = Some(tuplet);
        }

        if flags & BEAT_CHORD_DIAGRAM != 0 {
            self.read_chord_diagram(stream, track.string_count)?;
        }
        if flags & BEAT_TEXT != 0 {
            let text = stream.read_long_string()?;
            debug!("discarding beat text {text:?}");
        }

        let mut pending = PendingHarmonics::default();
        if flags & BEAT_EFFECTS != 0 {
            pending = self.read_beat_effects(stream, &mut position)?;
        }

        let mut new_patch = None;
        if flags & BEAT_MIX_TABLE != 0 {
            new_patch = self.read_mix_table(stream)?;
        }

        if status.is_none() {
            self.read_notes(stream, &mut position, track, voice, pending)?;
        }

        Ok((position, new_patch))
    }

    fn read_beat_effects(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
    ) -> Result<PendingHarmonics> {
        let flags = stream.read_u8()?;
        let flags2 = if self.version >= FileVersion::Gp4 {
            stream.read_u8()?
        } else {
            0
        };

        if flags & EFFECT_VIBRATO != 0 {
            position.set_property(PositionProperty::Vibrato);
        }
        if flags & EFFECT_WIDE_VIBRATO != 0 {
            position.set_property(PositionProperty::WideVibrato);
        }
        if flags & EFFECT_FADE_IN != 0 {
            debug!("discarding fade-in");
        }
        if flags & EFFECT_TAP != 0 {
            let kind = stream.read_u8()?;
            if kind == 1 {
                position.set_property(PositionProperty::Tap);
            } else {
                debug!("discarding slap/pop effect {kind}");
            }
        }
        if flags & EFFECT_STROKE != 0 {
            let down = stream.read_u8()?;
            let up = stream.read_u8()?;
            if down > 0 {
                position.set_property(PositionProperty::PickStrokeDown);
            } else if up > 0 {
                position.set_property(PositionProperty::PickStrokeUp);
            }
        }
        if flags & EFFECT_TREMOLO_BAR != 0 {
            self.read_tremolo_bar(stream, position)?;
        }

        if flags2 & EFFECT2_RASGUEADO != 0 {
            debug!("discarding rasgueado");
        }
        if flags2 & EFFECT2_ARPEGGIO != 0 {
            let direction = stream.read_u8()?;
            match direction {
                1 => position.set_property(PositionProperty::ArpeggioUp),
                2 => position.set_property(PositionProperty::ArpeggioDown),
                other => debug!("ignoring unknown arpeggio direction {other}"),
            }
        }

        Ok(PendingHarmonics {
            natural: flags & EFFECT_NATURAL_HARMONIC != 0,
            artificial: flags & EFFECT_ARTIFICIAL_HARMONIC != 0,
        })
    }

    fn read_tremolo_bar(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
    ) -> Result<()> {
        let raw_event = stream.read_u8()?;
        let event = TremoloEvent::from_u8(raw_event).ok_or_else(|| {
            Error::inconsistent("tremolo event", format!("unknown value {raw_event}"))
        })?;
        let pitch = stream.read_u32()?;
        let pitch = u8::try_from(pitch)
            .map_err(|_| Error::inconsistent("tremolo pitch", format!("{pitch} out of range")))?;

        self.skip_effect_points(stream)?;

        position.tremolo_bar = Some(TremoloBar { event, pitch });
        Ok(())
    }

    /// Consumes a point list shared by bend and tremolo-bar records.
    fn skip_effect_points(&self, stream: &mut InputStream<'_>) -> Result<()> {
        let points = stream.read_u32()?;
        if points > MAX_EFFECT_POINTS {
            return Err(Error::inconsistent(
                "effect points",
                format!("{points} exceeds {MAX_EFFECT_POINTS}"),
            ));
        }
        for _ in 0..points {
            let _time = stream.read_u32()?;
            let _value = stream.read_u32()?;
            let _vibrato = stream.read_u8()?;
        }
        Ok(())
    }

    /// Consumes a chord diagram. Diagrams are not represented in the
    /// score model, but the record must be walked precisely to keep the
    /// cursor aligned.
    fn read_chord_diagram(&self, stream: &mut InputStream<'_>, strings: u8) -> Result<()> {
        let format = stream.read_u8()?;
        match format {
            0 => {
                let name = stream.read_byte_string()?;
                debug!("discarding old-style chord {name:?}");
                let base_fret = stream.read_u32()?;
                if base_fret > 0 {
                    for _ in 0..strings {
                        let _fret = stream.read_u32()?;
                    }
                }
            }
            1 => {
                let name = stream.read_long_string()?;
                debug!("discarding chord diagram {name:?}");
                let _base_fret = stream.read_u32()?;
                for _ in 0..MAX_STRINGS {
                    let _fret = stream.read_i32()?;
                }
            }
            other => {
                return Err(Error::inconsistent(
                    "chord diagram format",
                    format!("unknown value {other}"),
                ));
            }
        }
        Ok(())
    }

    /// Consumes a mix-table change, returning the new MIDI patch when
    /// the event changes the instrument.
    fn read_mix_table(&self, stream: &mut InputStream<'_>) -> Result<Option<u8>> {
        let patch = stream.read_i8()?;
        let volume = stream.read_i8()?;
        let pan = stream.read_i8()?;
        let chorus = stream.read_i8()?;
        let reverb = stream.read_i8()?;
        let phaser = stream.read_i8()?;
        let tremolo = stream.read_i8()?;
        let tempo = stream.read_i32()?;

        // Each changed value carries a transition duration.
        for value in [volume, pan, chorus, reverb, phaser, tremolo] {
            if value >= 0 {
                let _duration = stream.read_u8()?;
            }
        }
        if tempo >= 0 {
            let _duration = stream.read_u8()?;
        }
        if self.version >= FileVersion::Gp4 {
            let _apply_to_all = stream.read_u8()?;
        }

        Ok((patch >= 0).then_some(patch as u8))
    }

    fn read_notes(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
        track: &mut TrackState,
        voice: usize,
        pending: PendingHarmonics,
    ) -> Result<()> {
        let mask = stream.read_u8()?;
        let valid = ((1u16 << track.string_count) - 1) << (MAX_STRINGS - track.string_count as usize);
        if u16::from(mask) & !valid != 0 {
            return Err(Error::inconsistent(
                "string index",
                format!("mask {mask:#04x} references strings beyond {}", track.string_count),
            ));
        }

        for string in 0..track.string_count {
            if mask & (1u8 << (MAX_STRINGS as u8 - 1 - string)) == 0 {
                continue;
            }
            let seen = &mut track.strings_seen[voice][string as usize];
            let note = self.read_note(stream, position, string, *seen, pending)?;
            note.check_exclusive_marks()?;
            *seen = true;
            position.notes.push(note);
        }
        Ok(())
    }

    fn read_note(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
        string: u8,
        string_seen: bool,
        pending: PendingHarmonics,
    ) -> Result<Note> {
        let flags = stream.read_u8()?;
        let mut note = Note::new(string, 0);

        if flags & NOTE_TYPE != 0 {
            let kind = stream.read_u8()?;
            match kind {
                NOTE_TYPE_NORMAL => {}
                NOTE_TYPE_TIED => note.set_property(NoteProperty::Tied),
                NOTE_TYPE_MUTED => note.set_property(NoteProperty::Muted),
                other => {
                    return Err(Error::inconsistent(
                        "note type",
                        format!("unknown value {other}"),
                    ));
                }
            }
            note.fret = stream.read_u8()?;
        }

        if flags & NOTE_HEAVY_ACCENT != 0 {
            position.set_property(PositionProperty::Marcato);
        }
        if flags & NOTE_ACCENT != 0 {
            position.set_property(PositionProperty::Sforzando);
        }
        if flags & NOTE_GHOST != 0 {
            note.set_property(NoteProperty::GhostNote);
        }

        if flags & NOTE_INDEPENDENT_DURATION != 0 {
            let _duration = stream.read_i8()?;
            let _tuplet = stream.read_u8()?;
        }
        if flags & NOTE_DYNAMICS != 0 {
            let _dynamics = stream.read_u8()?;
        }
        if flags & NOTE_FINGERING != 0 {
            let _left = stream.read_i8()?;
            let _right = stream.read_i8()?;
        }

        if flags & NOTE_EFFECTS != 0 {
            if self.version >= FileVersion::Gp4 {
                self.read_note_effects(stream, position, &mut note, string_seen)?;
            } else {
                self.read_note_effects_gp3(stream, position, &mut note, string_seen)?;
            }
        }

        if pending.natural {
            note.set_property(NoteProperty::NaturalHarmonic);
        }
        if pending.artificial {
            note.artificial_harmonic = Some(12);
        }

        Ok(note)
    }

    fn read_note_effects(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
        note: &mut Note,
        string_seen: bool,
    ) -> Result<()> {
        let flags = stream.read_u8()?;
        let flags2 = stream.read_u8()?;

        if flags & NOTE_EFFECT_BEND != 0 {
            self.read_bend(stream, note)?;
        }
        if flags & NOTE_EFFECT_HAMMER != 0 {
            set_hammer(note, string_seen);
        }
        if flags & NOTE_EFFECT_LET_RING != 0 {
            position.set_property(PositionProperty::LetRing);
        }
        if flags & NOTE_EFFECT_GRACE != 0 {
            self.read_grace_note(stream, position)?;
        }

        if flags2 & NOTE_EFFECT2_STACCATO != 0 {
            position.set_property(PositionProperty::Staccato);
        }
        if flags2 & NOTE_EFFECT2_PALM_MUTE != 0 {
            position.set_property(PositionProperty::PalmMuting);
        }
        if flags2 & NOTE_EFFECT2_TREMOLO_PICKING != 0 {
            let _speed = stream.read_u8()?;
            position.set_property(PositionProperty::TremoloPicking);
        }
        if flags2 & NOTE_EFFECT2_SLIDE != 0 {
            self.read_slide(stream, note)?;
        }
        if flags2 & NOTE_EFFECT2_HARMONIC != 0 {
            self.read_harmonic(stream, note)?;
        }
        if flags2 & NOTE_EFFECT2_TRILL != 0 {
            let fret = stream.read_u8()?;
            let _period = stream.read_u8()?;
            note.trilled_fret = Some(fret);
        }
        if flags2 & NOTE_EFFECT2_VIBRATO != 0 {
            position.set_property(PositionProperty::Vibrato);
        }
        if flags2 & NOTE_EFFECT2_OCTAVE != 0 {
            let marker = stream.read_u8()?;
            let property = match marker {
                1 => NoteProperty::Octave8va,
                2 => NoteProperty::Octave8vb,
                3 => NoteProperty::Octave15ma,
                4 => NoteProperty::Octave15mb,
                other => {
                    return Err(Error::inconsistent(
                        "octave marker",
                        format!("unknown value {other}"),
                    ));
                }
            };
            note.set_property(property);
        }

        Ok(())
    }

    /// Version 3 files use a single effect flag byte with a reduced
    /// vocabulary.
    fn read_note_effects_gp3(
        &self,
        stream: &mut InputStream<'_>,
        position: &mut Position,
        note: &mut Note,
        string_seen: bool,
    ) -> Result<()> {
        let flags = stream.read_u8()?;

        if flags & NOTE_EFFECT_BEND != 0 {
            self.read_bend(stream, note)?;
        }
        if flags & NOTE_EFFECT_HAMMER != 0 {
            set_hammer(note, string_seen);
        }
        if flags & NOTE_EFFECT_GP3_SLIDE != 0 {
            note.set_property(NoteProperty::ShiftSlide);
        }
        if flags & NOTE_EFFECT_LET_RING != 0 {
            position.set_property(PositionProperty::LetRing);
        }
        if flags & NOTE_EFFECT_GRACE != 0 {
            self.read_grace_note(stream, position)?;
        }

        Ok(())
    }

    fn read_bend(&self, stream: &mut InputStream<'_>, note: &mut Note) -> Result<()> {
        let raw_kind = stream.read_u8()?;
        let kind = BendKind::from_u8(raw_kind)
            .ok_or_else(|| Error::inconsistent("bend kind", format!("unknown value {raw_kind}")))?;
        let pitch = stream.read_u32()?;
        let pitch = u8::try_from(pitch)
            .map_err(|_| Error::inconsistent("bend pitch", format!("{pitch} out of range")))?;

        self.skip_effect_points(stream)?;

        note.bend = Some(Bend { kind, pitch });
        Ok(())
    }

    fn read_slide(&self, stream: &mut InputStream<'_>, note: &mut Note) -> Result<()> {
        let kind = stream.read_i8()?;
        let property = match kind {
            1 => Some(NoteProperty::ShiftSlide),
            2 => Some(NoteProperty::LegatoSlide),
            3 => Some(NoteProperty::SlideOutOfDownwards),
            4 => Some(NoteProperty::SlideOutOfUpwards),
            -1 => Some(NoteProperty::SlideIntoFromBelow),
            -2 => Some(NoteProperty::SlideIntoFromAbove),
            other => {
                debug!("ignoring unknown slide kind {other}");
                None
            }
        };
        if let Some(property) = property {
            note.set_property(property);
        }
        Ok(())
    }

    fn read_harmonic(&self, stream: &mut InputStream<'_>, note: &mut Note) -> Result<()> {
        let kind = stream.read_u8()?;
        match kind {
            HARMONIC_NONE => {}
            HARMONIC_NATURAL => note.set_property(NoteProperty::NaturalHarmonic),
            HARMONIC_ARTIFICIAL => {
                let offset = stream.read_u8()?;
                note.artificial_harmonic = Some(offset);
            }
            HARMONIC_TAPPED => {
                let fret = stream.read_u8()?;
                note.tapped_harmonic_fret = Some(fret);
            }
            other => {
                return Err(Error::inconsistent(
                    "harmonic kind",
                    format!("unknown value {other}"),
                ));
            }
        }
        Ok(())
    }

    /// Consumes a grace note, which the model represents only as an
    /// acciaccatura mark on the position.
    fn read_grace_note(&self, stream: &mut InputStream<'_>, position: &mut Position) -> Result<()> {
        let _fret = stream.read_u8()?;
        let _dynamic = stream.read_u8()?;
        let _transition = stream.read_u8()?;
        let _duration = stream.read_u8()?;
        position.set_property(PositionProperty::Acciaccatura);
        Ok(())
    }
}

fn set_hammer(note: &mut Note, string_seen: bool) {
    if string_seen {
        note.set_property(NoteProperty::HammerOnOrPullOff);
    } else {
        note.set_property(NoteProperty::HammerOnFromNowhere);
    }
}

/// Snapshot of the current player/instrument assignment, one staff per
/// track.
fn player_change_at(position: u32, tracks: &[TrackState]) -> PlayerChange {
    PlayerChange::new(
        position,
        tracks
            .iter()
            .map(|t| vec![ActivePlayer::new(t.player, t.instrument)])
            .collect(),
    )
}
