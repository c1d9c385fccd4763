use midir::{MidiInput, MidiInputConnection};

use crate::error::{Error, Result};
use crate::messaging::{NoteQueue, RawMidiMessage};

const CLIENT_NAME: &str = "piano-helper MIDI input";

/// Forwards raw messages from a MIDI input port into a queue the session
/// drains once per frame. The connection closes when the handler is dropped.
pub struct MidiInputHandler {
    connection: Option<MidiInputConnection<()>>,
    port_name: Option<String>,
    queue: NoteQueue<RawMidiMessage>,
}

impl MidiInputHandler {
    pub fn new(queue: NoteQueue<RawMidiMessage>) -> Self {
        Self {
            connection: None,
            port_name: None,
            queue,
        }
    }

    /// Names of the input ports currently available
    pub fn list_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|err| Error::Midi(err.to_string()))?;
        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    /// Connect to the named port, or the first available one when `port_name`
    /// is `None`. Returns the name of the port connected to.
    pub fn connect(&mut self, port_name: Option<&str>) -> Result<String> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|err| Error::Midi(err.to_string()))?;
        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| match port_name {
                Some(wanted) => midi_in.port_name(port).map(|name| name == wanted).unwrap_or(false),
                None => true,
            })
            .ok_or_else(|| match port_name {
                Some(wanted) => Error::Midi(format!("MIDI port '{wanted}' not found")),
                None => Error::Midi("no MIDI input ports available".to_string()),
            })?;
        let name = midi_in
            .port_name(&port)
            .map_err(|err| Error::Midi(err.to_string()))?;

        let queue = self.queue.clone();
        let connection = midi_in
            .connect(
                &port,
                "piano-helper-read-input",
                move |_stamp, message, _| forward(message, &queue),
                (),
            )
            .map_err(|err| Error::Midi(format!("failed to connect to '{name}': {err}")))?;

        log::info!("connected to MIDI input '{name}'");
        self.connection = Some(connection);
        self.port_name = Some(name.clone());
        Ok(name)
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            if let Some(name) = self.port_name.take() {
                log::info!("disconnected from MIDI input '{name}'");
            }
        }
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Pad short messages (program change, channel pressure) with zeros so every
/// message travels as a triple. A full queue already logs, so the error is
/// not reported again from the driver thread.
fn forward(message: &[u8], queue: &NoteQueue<RawMidiMessage>) {
    let Some(&status) = message.first() else {
        return;
    };
    let data1 = message.get(1).copied().unwrap_or(0);
    let data2 = message.get(2).copied().unwrap_or(0);
    let _ = queue.push((status, data1, data2));
}
