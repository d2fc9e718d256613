use crate::error::Result;
use crate::stream::InputStream;

/// Number of channel slots in every Guitar Pro file (4 ports of 16).
pub const CHANNEL_COUNT: usize = 64;

/// One entry of the MIDI channel table.
///
/// Tracks reference these by 1-based index; the patch is what connects a
/// track to an instrument.
#[derive(Debug, Clone, Copy, Default)]
pub struct Channel {
    pub patch: u32,
    pub volume: u8,
    pub balance: u8,
    pub chorus: u8,
    pub reverb: u8,
    pub phaser: u8,
    pub tremolo: u8,
}

/// Reads the fixed 64-entry channel table.
pub fn read_channels(stream: &mut InputStream<'_>) -> Result<Vec<Channel>> {
    let mut channels = Vec::with_capacity(CHANNEL_COUNT);
    for _ in 0..CHANNEL_COUNT {
        let patch = stream.read_u32()?;
        let volume = stream.read_u8()?;
        let balance = stream.read_u8()?;
        let chorus = stream.read_u8()?;
        let reverb = stream.read_u8()?;
        let phaser = stream.read_u8()?;
        let tremolo = stream.read_u8()?;
        stream.skip(2)?; // alignment padding

        channels.push(Channel {
            patch,
            volume,
            balance,
            chorus,
            reverb,
            phaser,
            tremolo,
        });
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_channels() {
        let mut data = Vec::new();
        for i in 0..CHANNEL_COUNT as u32 {
            data.extend_from_slice(&i.to_le_bytes()); // patch
            data.extend_from_slice(&[100, 64, 0, 32, 0, 0, 0, 0]);
        }
        let mut stream = InputStream::new(&data);

        let channels = read_channels(&mut stream).unwrap();
        assert_eq!(channels.len(), CHANNEL_COUNT);
        assert_eq!(channels[0].patch, 0);
        assert_eq!(channels[63].patch, 63);
        assert_eq!(channels[10].volume, 100);
        assert_eq!(channels[10].reverb, 32);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_read_channels_truncated() {
        let data = vec![0u8; 40];
        let mut stream = InputStream::new(&data);
        assert!(read_channels(&mut stream).is_err());
    }
}
