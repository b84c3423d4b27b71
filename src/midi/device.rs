// Gestion des devices MIDI

use midir::{MidiInput as MidirInput, MidiInputPort};

use crate::midi::input::MidiError;

const CLIENT_NAME: &str = "console_synth MIDI scanner";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

pub struct MidiDeviceManager;

impl MidiDeviceManager {
    pub fn new() -> Self {
        Self
    }

    /// Liste tous les ports MIDI d'entrée disponibles
    pub fn list_input_ports(&self) -> Vec<MidiDeviceInfo> {
        let midi_in = match MidirInput::new(CLIENT_NAME) {
            Ok(midi_in) => midi_in,
            Err(e) => {
                log::warn!("MIDI: cannot scan input ports: {}", e);
                return Vec::new();
            }
        };

        midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                let name = midi_in.port_name(port).ok()?;
                Some(MidiDeviceInfo {
                    id: format!("midi_in_{}", index),
                    name,
                    // Le premier port est considéré comme défaut
                    is_default: index == 0,
                })
            })
            .collect()
    }

    /// Find an input port by name, case-insensitively.
    /// Returns the midir client, the port and the port's full name.
    pub fn find_input_port(&self, query: &str) -> Result<(MidirInput, MidiInputPort, String), MidiError> {
        let midi_in = MidirInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_in.port_name(port).unwrap_or_default())
            .collect();

        let index = best_port_match(&names, query)
            .ok_or_else(|| MidiError::PortNotFound(query.to_string()))?;

        let port = ports[index].clone();
        let name = names[index].clone();
        Ok((midi_in, port, name))
    }
}

impl Default for MidiDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the port matching `query`: an exact case-insensitive match wins,
/// otherwise the first port whose name contains the query.
pub fn best_port_match(names: &[String], query: &str) -> Option<usize> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    names
        .iter()
        .position(|name| name.to_lowercase() == query)
        .or_else(|| names.iter().position(|name| name.to_lowercase().contains(&query)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "Midi Through Port-0".to_string(),
            "Keystation 49 MIDI 1".to_string(),
            "keystation".to_string(),
        ]
    }

    #[test]
    fn test_exact_match_preferred() {
        assert_eq!(best_port_match(&names(), "KEYSTATION"), Some(2));
    }

    #[test]
    fn test_substring_match_case_insensitive() {
        assert_eq!(best_port_match(&names(), "through"), Some(0));
        assert_eq!(best_port_match(&names(), "49 midi"), Some(1));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(best_port_match(&names(), "launchpad"), None);
        assert_eq!(best_port_match(&names(), "   "), None);
    }
}
