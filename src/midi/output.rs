use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use super::MidiMessage;
use crate::error::{Error, Result};

/// Destination for emitted messages. Sends are in program order; a failed
/// send must be reported, never dropped.
pub trait MidiSink {
    fn send(&mut self, message: MidiMessage) -> Result<()>;
}

/// Records messages in memory.
impl MidiSink for Vec<MidiMessage> {
    fn send(&mut self, message: MidiMessage) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// One or more midir output connections receiving every message.
pub struct MidiPortSink {
    connections: Vec<(String, MidiOutputConnection)>,
}

impl MidiPortSink {
    /// Connects to every output port whose name contains `filter`, or to all
    /// ports when no filter is given.
    pub fn open(client_name: &str, filter: Option<&str>) -> Result<Self> {
        let names = list_output_ports(client_name)?;

        let mut connections = Vec::new();
        for (index, name) in names.iter().enumerate() {
            if let Some(filter) = filter {
                if !name.contains(filter) {
                    continue;
                }
            }

            // connect() consumes the client, so each port gets its own.
            let output = MidiOutput::new(client_name)?;
            let ports = output.ports();
            let Some(port) = ports.get(index) else {
                continue;
            };
            let connection = output
                .connect(port, client_name)
                .map_err(|e| Error::MidiConnect(format!("{}: {}", name, e)))?;

            info!(port = %name, "connected MIDI output");
            connections.push((name.clone(), connection));
        }

        if connections.is_empty() {
            return Err(Error::NoMidiPorts(filter.map(str::to_string)));
        }

        Ok(Self { connections })
    }

    pub fn port_names(&self) -> Vec<&str> {
        self.connections.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn close(self) {
        for (name, connection) in self.connections {
            debug!(port = %name, "closing MIDI output");
            connection.close();
        }
    }
}

impl MidiSink for MidiPortSink {
    /// Writes to every port, even after one fails, and reports the first failure.
    fn send(&mut self, message: MidiMessage) -> Result<()> {
        let bytes = message.to_bytes();
        let mut first_error = None;
        for (name, connection) in self.connections.iter_mut() {
            if let Err(e) = connection.send(&bytes) {
                warn!(port = %name, error = %e, "MIDI send failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

pub fn list_output_ports(client_name: &str) -> Result<Vec<String>> {
    let output = MidiOutput::new(client_name)?;
    let mut names = Vec::new();
    for port in output.ports() {
        names.push(output.port_name(&port)?);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<MidiMessage> = Vec::new();
        sink.send(MidiMessage::note_off(0, 60)).unwrap();
        sink.send(MidiMessage::NoteOn {
            channel: 0,
            note: 64,
            velocity: 80,
        })
        .unwrap();
        assert_eq!(sink.len(), 2);
        assert!(!sink[0].is_note_on());
        assert_eq!(sink[1].note(), 64);
    }
}
