use tracing::trace;

use super::{MidiMessage, MidiSink};
use crate::error::Result;

/// Keeps at most one note sounding: any sounding note is released before
/// the next one starts. Note 0 is a rest.
#[derive(Debug, Clone, Copy)]
pub struct NoteDispatcher {
    channel: u8,
}

impl NoteDispatcher {
    pub fn new(channel: u8) -> Self {
        Self {
            channel: channel & 0x0F,
        }
    }

    /// `current` holds every note that may be sounding on some receiver, so a
    /// note-on that failed part way is still released on cleanup.
    pub fn dispatch<S: MidiSink + ?Sized>(
        &self,
        current: &mut Option<u8>,
        note: u8,
        velocity: u8,
        sink: &mut S,
    ) -> Result<()> {
        self.release(current, sink)?;

        if note == 0 {
            trace!("rest");
            return Ok(());
        }

        *current = Some(note);
        sink.send(MidiMessage::note_on(self.channel, note, velocity))
    }

    /// Sends a note-off for the sounding note, if any.
    pub fn release<S: MidiSink + ?Sized>(
        &self,
        current: &mut Option<u8>,
        sink: &mut S,
    ) -> Result<()> {
        if let Some(note) = *current {
            sink.send(MidiMessage::note_off(self.channel, note))?;
            *current = None;
        }
        Ok(())
    }
}
