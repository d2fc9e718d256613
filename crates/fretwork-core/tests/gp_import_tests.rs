//! Import tests for the Guitar Pro dialect family.
//!
//! Fixture files are built byte-by-byte in code, mirroring the wire
//! layout the decoder consumes.

use fretwork_core::error::Error;
use fretwork_core::score::{
    Clef, DurationType, NoteProperty, PositionProperty, Score,
};
use fretwork_core::{BarType, import_bytes};

const GP3: &str = "FICHIER GUITAR PRO v3.00";
const GP4: &str = "FICHIER GUITAR PRO v4.06";
const GP5: &str = "FICHIER GUITAR PRO v5.00";

/// Byte-level fixture writer for Guitar Pro files.
struct GpFile {
    data: Vec<u8>,
    gp5: bool,
    gp3: bool,
}

impl GpFile {
    fn new(signature: &str) -> Self {
        let mut data = vec![signature.len() as u8];
        data.extend_from_slice(signature.as_bytes());
        data.resize(30, 0);
        Self {
            data,
            gp5: signature == GP5,
            gp3: signature == GP3,
        }
    }

    fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    fn i8(&mut self, value: i8) -> &mut Self {
        self.data.push(value as u8);
        self
    }

    fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// u32 field length, u8 string length, then the bytes.
    fn long_string(&mut self, text: &str) -> &mut Self {
        self.u32(text.len() as u32 + 1);
        self.u8(text.len() as u8);
        self.data.extend_from_slice(text.as_bytes());
        self
    }

    /// u8 length plus a fixed block.
    fn fixed_string(&mut self, text: &str, block: usize) -> &mut Self {
        self.u8(text.len() as u8);
        let start = self.data.len();
        self.data.extend_from_slice(text.as_bytes());
        self.data.resize(start + block, 0);
        self
    }

    fn song_data(&mut self, title: &str, artist: &str) -> &mut Self {
        self.song_data_full(title, artist, "", "", "", "", "")
    }

    fn song_data_full(
        &mut self,
        title: &str,
        artist: &str,
        album: &str,
        author: &str,
        copyright: &str,
        transcriber: &str,
        instructions: &str,
    ) -> &mut Self {
        self.long_string(title);
        self.long_string(""); // subtitle
        self.long_string(artist);
        self.long_string(album);
        if self.gp5 {
            self.long_string(author); // words
            self.long_string(author); // music
        } else {
            self.long_string(author);
        }
        self.long_string(copyright);
        self.long_string(transcriber);
        self.long_string(instructions);
        self.u32(0); // notice lines
        if !self.gp5 {
            self.u8(0); // triplet feel
        }
        if !self.gp3 {
            // lyric section: track plus five lines
            self.u32(0);
            for _ in 0..5 {
                self.u32(0);
                self.long_string("");
            }
        }
        self.u32(120); // tempo
        self.i8(0); // key
        self.u8(0) // octave
    }

    /// 64-entry channel table; listed patches fill the first slots.
    fn channels(&mut self, patches: &[u32]) -> &mut Self {
        for slot in 0..64 {
            let patch = patches.get(slot).copied().unwrap_or(0);
            self.u32(patch);
            self.data.extend_from_slice(&[100, 64, 0, 0, 0, 0, 0, 0]);
        }
        self
    }

    fn counts(&mut self, measures: u32, tracks: u32) -> &mut Self {
        self.u32(measures);
        self.u32(tracks)
    }

    fn simple_measure(&mut self) -> &mut Self {
        self.u8(0)
    }

    /// Measure header carrying a rehearsal marker.
    fn marked_measure(&mut self, marker: &str) -> &mut Self {
        self.u8(0x20);
        self.long_string(marker);
        self.u32(0xFF0000) // marker color
    }

    fn track(
        &mut self,
        name: &str,
        pitches_low_to_high: &[u8],
        channel: u32,
        capo: u32,
        clef: u8,
    ) -> &mut Self {
        self.u8(0); // flags
        self.fixed_string(name, 40);
        self.u32(pitches_low_to_high.len() as u32);
        // Wire order is highest string first, padded to seven slots.
        for slot in 0..7 {
            let pitch = pitches_low_to_high
                .iter()
                .rev()
                .nth(slot)
                .copied()
                .unwrap_or(0);
            self.u32(pitch as u32);
        }
        self.u32(1); // port
        self.u32(channel);
        self.u32(2); // effect channel
        self.u32(24); // fret count
        self.u32(capo);
        self.u8(clef);
        self.u32(0) // color
    }

    fn beat_count(&mut self, count: u32) -> &mut Self {
        self.u32(count)
    }

    /// One quarter-note beat holding a single plain note.
    fn simple_beat(&mut self, string: u8, fret: u8) -> &mut Self {
        self.u8(0); // beat flags
        self.i8(0); // quarter note
        self.u8(1 << (6 - string)); // string mask
        self.u8(0x20); // note flags: type and fret present
        self.u8(1); // normal note
        self.u8(fret)
    }

    fn rest_beat(&mut self, duration: i8) -> &mut Self {
        self.u8(0x40);
        self.u8(0x02); // rest status
        self.i8(duration)
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

fn import(file: &GpFile) -> Score {
    let mut score = Score::new();
    import_bytes(file.bytes(), &mut score).expect("fixture must decode");
    score
}

#[test]
fn test_score_metadata() {
    let mut file = GpFile::new(GP4);
    file.song_data_full(
        "The title",
        "The artist",
        "The album",
        "The author",
        "The copyright date",
        "The transcriber",
        "The instructions",
    )
    .channels(&[26])
    .counts(1, 1)
    .simple_measure()
    .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
    .beat_count(1)
    .simple_beat(0, 0);

    let score = import(&file);
    let song = &score.info.song;
    assert_eq!(song.title, "The title");
    assert_eq!(song.artist, "The artist");
    assert_eq!(song.album, "The album");
    // "Words & Music" convention: one author field credits both.
    assert_eq!(song.author.composer, "The author");
    assert_eq!(song.author.lyricist, "The author");
    assert_eq!(song.copyright, "The copyright date");
    assert_eq!(song.transcriber, "The transcriber");
    assert_eq!(song.performance_notes, "The instructions");
    assert_eq!(song.arranger, "");
    assert_eq!(song.lyrics, "");
}

#[test]
fn test_four_track_import() {
    let mut file = GpFile::new(GP4);
    file.song_data("Tracks", "")
        .channels(&[26, 30, 30, 33])
        .counts(1, 4)
        .simple_measure()
        .track("Jazz Guitar", &[38, 45, 50, 55, 59, 64], 1, 2, 0)
        .track("Distortion Guitar", &[35, 40, 45, 50, 55, 59, 64], 2, 0, 0)
        .track("Distortion Guitar", &[40, 45, 50, 55, 59, 64], 3, 0, 1)
        .track("Electric Bass", &[28, 33, 38, 43], 4, 0, 1);
    for _ in 0..4 {
        file.beat_count(1).simple_beat(0, 3);
    }

    let score = import(&file);

    assert_eq!(score.players.len(), 4);
    assert_eq!(score.instruments.len(), 3);

    let player = &score.players[0];
    assert_eq!(player.description, "Jazz Guitar");
    assert_eq!(player.tuning.capo(), 2);
    assert_eq!(player.tuning.to_string(), "D A D G B E");

    let player = &score.players[1];
    assert_eq!(player.description, "Distortion Guitar");
    assert_eq!(player.tuning.capo(), 0);
    assert_eq!(player.tuning.to_string(), "B E A D G B E");

    let player = &score.players[3];
    assert_eq!(player.description, "Electric Bass");
    assert_eq!(player.tuning.to_string(), "E A D G");

    assert_eq!(score.instruments[0].description, "Electric Guitar (jazz)");
    assert_eq!(score.instruments[0].midi_preset, 26);
    assert_eq!(score.instruments[1].description, "Distortion Guitar");
    assert_eq!(score.instruments[2].description, "Electric Bass (finger)");

    // One system with a staff per player, clefs taken from the tracks.
    assert_eq!(score.systems.len(), 1);
    let system = &score.systems[0];
    assert_eq!(system.staves.len(), 4);
    assert_eq!(system.staves[0].clef, Clef::Treble);
    assert_eq!(system.staves[1].clef, Clef::Treble);
    assert_eq!(system.staves[2].clef, Clef::Bass);
    assert_eq!(system.staves[3].clef, Clef::Bass);

    // An initial player change assigns the players and instruments.
    assert_eq!(system.player_changes.len(), 1);
    let change = &system.player_changes[0];
    assert_eq!(change.position, 0);
    for (staff, instrument) in [(0u32, 0u32), (1, 1), (2, 1), (3, 2)] {
        let active = change.active_players(staff as usize);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].player, staff);
        assert_eq!(active[0].instrument, instrument);
    }
}

#[test]
fn test_position_and_note_flags() {
    let mut file = GpFile::new(GP4);
    file.song_data("Notes", "")
        .channels(&[27])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(6);

    // Beat 0: plain quarter note, nothing special.
    file.simple_beat(0, 1);

    // Beat 1: dotted quarter, sforzando accent, tapped.
    file.u8(0x01 | 0x08); // dotted, beat effects
    file.i8(0);
    file.u8(0x20).u8(0); // effects: tap kind follows
    file.u8(1); // tap
    file.u8(1 << 5); // string 1
    file.u8(0x20 | 0x40); // type/fret, accent
    file.u8(1).u8(3);

    // Beat 2: double-dotted eighth, wide vibrato; the note carries an
    // octave-below sign and a hammer-on with no preceding note.
    file.u8(0x80 | 0x08); // double dotted, beat effects
    file.i8(1); // eighth
    file.u8(0x02).u8(0); // wide vibrato
    file.u8(1 << 4); // string 2
    file.u8(0x20 | 0x08); // type/fret, note effects
    file.u8(1).u8(5);
    file.u8(0x02); // hammer-on
    file.u8(0x80); // octave marker follows
    file.u8(2); // 8vb

    // Beat 3: eighth rest.
    file.rest_beat(1);

    // Beat 4: natural harmonic.
    file.u8(0);
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(12);
    file.u8(0x00);
    file.u8(0x10); // harmonic kind follows
    file.u8(1); // natural

    // Beat 5: tapped harmonic at fret 9, sliding out upwards, and a
    // second hammer-on on string 2, which now has a preceding note.
    file.u8(0);
    file.i8(0);
    file.u8(1 << 4);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(7);
    file.u8(0x02); // hammer-on
    file.u8(0x10 | 0x08); // harmonic, slide
    file.i8(4); // slide out upwards
    file.u8(3).u8(9); // tapped harmonic, fret 9

    let score = import(&file);
    let voice = &score.systems[0].staves[0].voices[0];
    assert_eq!(voice.positions.len(), 6);

    let pos = &voice.positions[0];
    assert_eq!(pos.duration, DurationType::Quarter);
    assert!(pos.properties.is_empty());
    assert!(!pos.is_rest());
    let note = &pos.notes[0];
    assert!(note.properties.is_empty());
    assert!(!note.has_tapped_harmonic());
    assert!(!note.has_trill());
    assert!(!note.has_artificial_harmonic());

    let pos = &voice.positions[1];
    assert!(pos.has_property(PositionProperty::Dotted));
    assert!(!pos.has_property(PositionProperty::DoubleDotted));
    assert!(pos.has_property(PositionProperty::Sforzando));
    assert!(pos.has_property(PositionProperty::Tap));
    assert_eq!(pos.notes[0].fret, 3);
    assert_eq!(pos.notes[0].string, 1);

    let pos = &voice.positions[2];
    assert_eq!(pos.duration, DurationType::Eighth);
    assert!(pos.has_property(PositionProperty::DoubleDotted));
    assert!(!pos.has_property(PositionProperty::Marcato));
    assert!(pos.has_property(PositionProperty::WideVibrato));
    let note = &pos.notes[0];
    assert!(note.has_property(NoteProperty::Octave8vb));
    assert!(note.has_property(NoteProperty::HammerOnFromNowhere));
    assert!(!note.has_property(NoteProperty::HammerOnOrPullOff));

    let pos = &voice.positions[3];
    assert_eq!(pos.duration, DurationType::Eighth);
    assert!(pos.is_rest());

    let note = &voice.positions[4].notes[0];
    assert!(note.has_property(NoteProperty::NaturalHarmonic));

    let note = &voice.positions[5].notes[0];
    assert!(note.has_tapped_harmonic());
    assert_eq!(note.tapped_harmonic_fret, Some(9));
    assert!(note.has_property(NoteProperty::SlideOutOfUpwards));
    // String 2 sounded at beat 2, so this is a plain hammer-on.
    assert!(note.has_property(NoteProperty::HammerOnOrPullOff));
    assert!(!note.has_property(NoteProperty::HammerOnFromNowhere));
}

#[test]
fn test_double_dotted_marcato_wide_vibrato_scenario() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(1);

    file.u8(0x80 | 0x08); // double dotted, beat effects
    file.i8(1); // eighth
    file.u8(0x02).u8(0); // wide vibrato
    file.u8(1 << 6);
    file.u8(0x20 | 0x02 | 0x08); // type/fret, heavy accent, note effects
    file.u8(1).u8(0);
    file.u8(0x02); // hammer-on, no preceding note
    file.u8(0x80); // octave marker follows
    file.u8(2); // 8vb

    let score = import(&file);
    let pos = &score.systems[0].staves[0].voices[0].positions[0];
    assert_eq!(pos.duration, DurationType::Eighth);
    assert!(pos.has_property(PositionProperty::DoubleDotted));
    assert!(pos.has_property(PositionProperty::Marcato));
    assert!(pos.has_property(PositionProperty::WideVibrato));
    // Exactly those three position flags and nothing else.
    let expected = [
        PositionProperty::DoubleDotted,
        PositionProperty::Marcato,
        PositionProperty::WideVibrato,
    ]
    .iter()
    .fold(0u32, |bits, &p| bits | (1 << p as u8));
    assert_eq!(pos.properties.bits(), expected);

    let note = &pos.notes[0];
    assert!(note.has_property(NoteProperty::Octave8vb));
    assert!(note.has_property(NoteProperty::HammerOnFromNowhere));
    let expected = [NoteProperty::Octave8vb, NoteProperty::HammerOnFromNowhere]
        .iter()
        .fold(0u32, |bits, &p| bits | (1 << p as u8));
    assert_eq!(note.properties.bits(), expected);
}

#[test]
fn test_double_dotted_wins_over_dotted() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(1);

    file.u8(0x01 | 0x80); // both dotted and double dotted
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20).u8(1).u8(0);

    let score = import(&file);
    let pos = &score.systems[0].staves[0].voices[0].positions[0];
    assert!(pos.has_property(PositionProperty::DoubleDotted));
    assert!(!pos.has_property(PositionProperty::Dotted));
}

#[test]
fn test_bend_and_trill() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(2);

    // Bend with a two-point curve.
    file.u8(0);
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(5);
    file.u8(0x01); // bend
    file.u8(0x00);
    file.u8(1); // kind: bend
    file.u32(4); // one full step
    file.u32(2); // points
    file.u32(0).u32(0).u8(0);
    file.u32(60).u32(4).u8(0);

    // Trill at fret 4.
    file.u8(0);
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(2);
    file.u8(0x00);
    file.u8(0x20); // trill
    file.u8(4).u8(2); // fret, period

    let score = import(&file);
    let voice = &score.systems[0].staves[0].voices[0];

    let bend = voice.positions[0].notes[0].bend.expect("bend decoded");
    assert_eq!(bend.pitch, 4);

    let note = &voice.positions[1].notes[0];
    assert!(note.has_trill());
    assert_eq!(note.trilled_fret, Some(4));
}

#[test]
fn test_barlines_and_rehearsal_signs() {
    let mut file = GpFile::new(GP4);
    file.song_data("Bars", "")
        .channels(&[0])
        .counts(3, 1)
        .marked_measure("Intro")
        .simple_measure()
        .marked_measure("Custom Section")
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0);
    for _ in 0..3 {
        file.beat_count(1).simple_beat(0, 0);
    }

    let score = import(&file);
    let system = &score.systems[0];
    assert_eq!(system.barlines.len(), 4);

    let bar = &system.barlines[0];
    assert!(bar.has_rehearsal_sign());
    let sign = bar.rehearsal_sign.as_ref().unwrap();
    assert_eq!(sign.letters, "A");
    assert_eq!(sign.description, "Intro");

    assert!(!system.barlines[1].has_rehearsal_sign());

    let bar = &system.barlines[2];
    assert!(bar.has_rehearsal_sign());
    let sign = bar.rehearsal_sign.as_ref().unwrap();
    assert_eq!(sign.letters, "B");
    assert_eq!(sign.description, "Custom Section");

    assert!(!system.barlines[3].has_rehearsal_sign());

    // Barline offsets advance with the positions of the first staff.
    let offsets: Vec<u32> = system.barlines.iter().map(|b| b.position).collect();
    assert_eq!(offsets, [0, 1, 2, 3]);
}

#[test]
fn test_repeat_barlines() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(2, 1)
        .u8(0x04); // measure 0: repeat start
    file.u8(0x08).u8(2); // measure 1: repeat end, two repeats
    file.track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0);
    for _ in 0..2 {
        file.beat_count(1).simple_beat(0, 0);
    }

    let score = import(&file);
    let system = &score.systems[0];
    assert_eq!(system.barlines[0].bar_type, BarType::RepeatStart);
    assert_eq!(system.barlines[2].bar_type, BarType::RepeatEnd);
    assert_eq!(system.barlines[2].repeat_count, 2);
}

#[test]
fn test_measures_grouped_into_systems() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "").channels(&[0]).counts(6, 1);
    for _ in 0..6 {
        file.simple_measure();
    }
    file.track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0);
    for _ in 0..6 {
        file.beat_count(1).simple_beat(0, 0);
    }

    let score = import(&file);
    assert_eq!(score.systems.len(), 2);
    assert_eq!(score.systems[0].staves[0].voices[0].positions.len(), 4);
    assert_eq!(score.systems[1].staves[0].voices[0].positions.len(), 2);
    // Every system carries its own initial player change.
    assert_eq!(score.systems[0].player_changes.len(), 1);
    assert_eq!(score.systems[1].player_changes.len(), 1);
}

#[test]
fn test_mix_table_emits_player_change() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[26])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(2);

    file.simple_beat(0, 0);

    // Mix-table change to a distortion patch on the second beat.
    file.u8(0x10); // mix table
    file.i8(0);
    file.i8(30); // new patch
    file.i8(-1).i8(-1).i8(-1).i8(-1).i8(-1).i8(-1);
    file.i32(-1); // tempo unchanged
    file.u8(0); // apply to all tracks
    file.u8(1 << 6);
    file.u8(0x20).u8(1).u8(0);

    let score = import(&file);
    assert_eq!(score.instruments.len(), 2);

    let system = &score.systems[0];
    assert_eq!(system.player_changes.len(), 2);
    assert_eq!(system.player_changes[0].position, 0);
    assert_eq!(system.player_changes[0].active_players(0)[0].instrument, 0);
    assert_eq!(system.player_changes[1].position, 1);
    assert_eq!(system.player_changes[1].active_players(0)[0].instrument, 1);
}

#[test]
fn test_gp5_reads_two_voices() {
    let mut file = GpFile::new(GP5);
    file.song_data("Voices", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0);
    file.beat_count(1).simple_beat(0, 5); // voice 0
    file.beat_count(1).rest_beat(0); // voice 1

    let score = import(&file);
    let staff = &score.systems[0].staves[0];
    assert_eq!(staff.voices.len(), 2);
    assert_eq!(staff.voices[0].positions[0].notes.len(), 1);
    assert!(staff.voices[1].positions[0].is_rest());
}

#[test]
fn test_gp5_separate_author_fields() {
    let mut file = GpFile::new(GP5);
    file.song_data_full("", "", "", "The author", "", "", "")
        .channels(&[0])
        .counts(0, 1)
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0);

    let score = import(&file);
    assert_eq!(score.info.song.author.composer, "The author");
    assert_eq!(score.info.song.author.lyricist, "The author");
}

#[test]
fn test_gp3_note_effects() {
    let mut file = GpFile::new(GP3);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(1);

    // Version 3 effects are a single flag byte; slides have no payload.
    file.u8(0);
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(7);
    file.u8(0x04 | 0x08); // slide, let ring

    let score = import(&file);
    let pos = &score.systems[0].staves[0].voices[0].positions[0];
    assert!(pos.has_property(PositionProperty::LetRing));
    assert!(pos.notes[0].has_property(NoteProperty::ShiftSlide));
}

#[test]
fn test_unknown_harmonic_kind_is_error() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(1);

    file.u8(0);
    file.i8(0);
    file.u8(1 << 6);
    file.u8(0x20 | 0x08);
    file.u8(1).u8(0);
    file.u8(0x00);
    file.u8(0x10);
    file.u8(7); // not a harmonic kind

    let mut score = Score::new();
    let result = import_bytes(file.bytes(), &mut score);
    assert!(matches!(
        result,
        Err(Error::InconsistentData { field: "harmonic kind", .. })
    ));
}

#[test]
fn test_out_of_range_channel_is_error() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 65, 0, 0); // channel 65

    let mut score = Score::new();
    let result = import_bytes(file.bytes(), &mut score);
    assert!(matches!(
        result,
        Err(Error::InconsistentData { field: "channel index", .. })
    ));
}

#[test]
fn test_string_mask_beyond_track_is_error() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Bass", &[28, 33, 38, 43], 1, 0, 1)
        .beat_count(1);

    file.u8(0);
    file.i8(0);
    file.u8(0x01); // bit 0 names a seventh string on a four-string staff

    let mut score = Score::new();
    let result = import_bytes(file.bytes(), &mut score);
    assert!(matches!(
        result,
        Err(Error::InconsistentData { field: "string index", .. })
    ));
}

#[test]
fn test_truncated_file_names_stage() {
    let mut file = GpFile::new(GP4);
    file.song_data("Cut short", "");
    // Channel table missing entirely.

    let mut score = Score::new();
    let result = import_bytes(file.bytes(), &mut score);
    assert!(matches!(result, Err(Error::Truncated { stage: "channels" })));
}

#[test]
fn test_truncated_beats_name_stage() {
    let mut file = GpFile::new(GP4);
    file.song_data("", "")
        .channels(&[0])
        .counts(1, 1)
        .simple_measure()
        .track("Guitar", &[40, 45, 50, 55, 59, 64], 1, 0, 0)
        .beat_count(3)
        .simple_beat(0, 0);
    // Two beats missing.

    let mut score = Score::new();
    let result = import_bytes(file.bytes(), &mut score);
    assert!(matches!(result, Err(Error::Truncated { stage: "beats" })));
}

#[test]
fn test_unrecognized_signature() {
    let mut data = vec![20u8];
    data.extend_from_slice(b"NOT A TABLATURE FILE");
    data.resize(30, 0);

    let mut score = Score::new();
    let result = import_bytes(&data, &mut score);
    match result {
        Err(Error::UnrecognizedFormat(signature)) => {
            assert_eq!(signature, "NOT A TABLATURE FILE");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
