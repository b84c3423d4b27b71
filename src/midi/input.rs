// MIDI Input - Réception des événements MIDI

use std::sync::{Arc, Mutex};

use midir::MidiInputConnection;

use crate::midi::collector::{MidiQueueProducer, push_message};
use crate::midi::device::MidiDeviceManager;
use crate::midi::event::MidiEvent;

/// Error type for MIDI input operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("Failed to initialize MIDI input: {0}")]
    Init(String),

    #[error("No MIDI input port found matching: {0}")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    Connect(String),
}

/// An open MIDI input port feeding the capture queue.
/// Dropping it closes the connection.
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInput {
    /// Open the input port matching `query` (case-insensitive).
    ///
    /// The producer is shared so a later connection can take over the same
    /// queue after this one is dropped.
    pub fn open(query: &str, producer: Arc<Mutex<MidiQueueProducer>>) -> Result<Self, MidiError> {
        let (midi_in, port, port_name) = MidiDeviceManager::new().find_input_port(query)?;

        let connection = midi_in
            .connect(
                &port,
                "console-synth-input",
                move |timestamp_us, message, _| {
                    // MIDI callback - running on midir's thread
                    let Some(event) = MidiEvent::from_bytes(message) else {
                        return;
                    };

                    // Never wait for the lock here, drop the message instead
                    if let Ok(mut tx) = producer.try_lock() {
                        if !push_message(&mut tx, event, timestamp_us) {
                            log::warn!("MIDI queue full, event ignored");
                        }
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        log::info!("MIDI: connected to input port '{}'", port_name);

        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}
