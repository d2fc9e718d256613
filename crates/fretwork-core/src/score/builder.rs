use crate::error::{Error, Result};

use super::{
    Barline, Clef, Instrument, Note, Player, PlayerChange, Position, RehearsalSign, Score,
    SongData, Staff, System, Voice, midi,
};

/// Append-only façade over a [`Score`] under construction.
///
/// Decoders drive the builder in strict order: metadata, players and
/// instruments, then systems with their staves, voices, positions and
/// notes. Every append returns a stable index usable by later
/// cross-references (player changes, rehearsal signs). Appends that need
/// a current container fail with inconsistent-data when called out of
/// order; decoders are expected to respect the ordering, not to be
/// forgiven for breaking it.
pub struct ScoreBuilder<'a> {
    score: &'a mut Score,
    selected_voice: Option<(usize, usize)>,
}

impl<'a> ScoreBuilder<'a> {
    pub fn new(score: &'a mut Score) -> Self {
        Self {
            score,
            selected_voice: None,
        }
    }

    pub fn set_song_data(&mut self, song: SongData) {
        self.score.info.song = song;
    }

    pub fn add_player(&mut self, player: Player) -> usize {
        self.score.players.push(player);
        self.score.players.len() - 1
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> usize {
        self.score.instruments.push(instrument);
        self.score.instruments.len() - 1
    }

    /// Returns the index of the instrument with the given MIDI preset,
    /// creating it with its General MIDI description on first sight.
    pub fn find_or_add_instrument(&mut self, midi_preset: u8) -> Result<usize> {
        if let Some(index) = self
            .score
            .instruments
            .iter()
            .position(|i| i.midi_preset == midi_preset)
        {
            return Ok(index);
        }

        let description = midi::preset_name(midi_preset).ok_or_else(|| {
            Error::inconsistent(
                "instrument patch",
                format!("{midi_preset} outside the General MIDI range"),
            )
        })?;
        Ok(self.add_instrument(Instrument::new(description, midi_preset)))
    }

    /// Starts a new system; subsequent staff and barline appends target it.
    pub fn begin_system(&mut self) -> usize {
        self.score.systems.push(System::default());
        self.selected_voice = None;
        self.score.systems.len() - 1
    }

    fn current_system(&mut self) -> Result<&mut System> {
        self.score
            .systems
            .last_mut()
            .ok_or_else(|| Error::inconsistent("score structure", "no system started"))
    }

    /// Appends a staff (with `voices` empty voices) to the current system.
    pub fn add_staff(&mut self, clef: Clef, string_count: u8, voices: usize) -> Result<usize> {
        let system = self.current_system()?;
        let mut staff = Staff::new(clef, string_count);
        staff.voices = vec![Voice::default(); voices];
        system.staves.push(staff);
        Ok(system.staves.len() - 1)
    }

    pub fn add_barline(&mut self, barline: Barline) -> Result<usize> {
        let system = self.current_system()?;
        system.barlines.push(barline);
        Ok(system.barlines.len() - 1)
    }

    pub fn set_rehearsal_sign(&mut self, barline: usize, sign: RehearsalSign) -> Result<()> {
        let system = self.current_system()?;
        let bar = system.barlines.get_mut(barline).ok_or_else(|| {
            Error::inconsistent("barline index", format!("{barline} out of range"))
        })?;
        bar.rehearsal_sign = Some(sign);
        Ok(())
    }

    /// Targets subsequent position/note appends at one voice of one staff
    /// in the current system.
    pub fn select_voice(&mut self, staff: usize, voice: usize) -> Result<()> {
        let system = self.current_system()?;
        let staff_ref = system
            .staves
            .get(staff)
            .ok_or_else(|| Error::inconsistent("staff index", format!("{staff} out of range")))?;
        if voice >= staff_ref.voices.len() {
            return Err(Error::inconsistent(
                "voice index",
                format!("{voice} out of range for staff {staff}"),
            ));
        }
        self.selected_voice = Some((staff, voice));
        Ok(())
    }

    fn current_voice(&mut self) -> Result<&mut Voice> {
        let (staff, voice) = self
            .selected_voice
            .ok_or_else(|| Error::inconsistent("score structure", "no voice selected"))?;
        let system = self.current_system()?;
        Ok(&mut system.staves[staff].voices[voice])
    }

    /// Appends a position to the selected voice. Position offsets within a
    /// voice must be strictly increasing.
    pub fn append_position(&mut self, position: Position) -> Result<usize> {
        let voice = self.current_voice()?;
        if let Some(last) = voice.positions.last() {
            if position.position <= last.position {
                return Err(Error::inconsistent(
                    "position offset",
                    format!(
                        "offset {} does not advance past {}",
                        position.position, last.position
                    ),
                ));
            }
        }
        voice.positions.push(position);
        Ok(voice.positions.len() - 1)
    }

    /// Appends a note to the most recent position of the selected voice.
    pub fn append_note(&mut self, note: Note) -> Result<usize> {
        let voice = self.current_voice()?;
        let position = voice
            .positions
            .last_mut()
            .ok_or_else(|| Error::inconsistent("score structure", "no position to hold note"))?;
        position.notes.push(note);
        Ok(position.notes.len() - 1)
    }

    /// Records a player change on the current system after validating
    /// every player and instrument reference.
    pub fn record_player_change(&mut self, change: PlayerChange) -> Result<()> {
        let players = self.score.players.len();
        let instruments = self.score.instruments.len();
        for active in change.staves.iter().flatten() {
            if active.player as usize >= players {
                return Err(Error::inconsistent(
                    "player index",
                    format!("{} out of range", active.player),
                ));
            }
            if active.instrument as usize >= instruments {
                return Err(Error::inconsistent(
                    "instrument index",
                    format!("{} out of range", active.instrument),
                ));
            }
        }
        let system = self.current_system()?;
        system.player_changes.push(change);
        Ok(())
    }
}
