use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::{anyhow, Result};
use ivory_domain::MidiMessage;
use midir::{Ignore, MidiInput, MidiInputConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const CLIENT_NAME: &str = "ivory";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MidiDevice {
    pub name: String,
}

pub struct MidiManager;

impl MidiManager {
    pub fn list_inputs() -> Result<Vec<MidiDevice>> {
        let input = MidiInput::new(CLIENT_NAME)?;
        Ok(input
            .ports()
            .iter()
            .map(|port| MidiDevice {
                name: input.port_name(port).unwrap_or_else(|_| "Unknown".into()),
            })
            .collect())
    }
}

/// Opens MIDI input connections.
pub trait MidiBridge {
    fn open(&mut self, input_index: usize) -> Result<MidiSubscription>;
}

/// Messages pulled off a subscription in one go.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Drained {
    pub messages: Vec<MidiMessage>,
    /// The sending side has gone away; no further messages will arrive.
    pub closed: bool,
}

/// A live MIDI input. Dropping it, or calling [`close`](Self::close), ends
/// the connection.
pub struct MidiSubscription {
    receiver: Receiver<MidiMessage>,
    connection: Option<MidiInputConnection<()>>,
    input_name: String,
}

impl MidiSubscription {
    /// Wraps a channel fed by something other than a midir connection.
    pub fn from_channel(receiver: Receiver<MidiMessage>, input_name: impl Into<String>) -> Self {
        Self {
            receiver,
            connection: None,
            input_name: input_name.into(),
        }
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => drained.messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drained.closed = true;
                    break;
                }
            }
        }
        drained
    }

    pub fn close(mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        debug!(input = %self.input_name, "midi subscription closed");
    }
}

/// Hardware MIDI through midir. Messages are forwarded from midir's callback
/// thread over a channel.
pub struct MidirBridge {
    client_name: String,
}

impl MidirBridge {
    pub fn new() -> Self {
        Self {
            client_name: CLIENT_NAME.to_string(),
        }
    }
}

impl Default for MidirBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiBridge for MidirBridge {
    fn open(&mut self, input_index: usize) -> Result<MidiSubscription> {
        let mut input = MidiInput::new(&self.client_name)?;
        input.ignore(Ignore::None);
        let ports = input.ports();
        let port = ports
            .get(input_index)
            .ok_or_else(|| anyhow!("no midi input at index {input_index}"))?;
        let input_name = input.port_name(port).unwrap_or_else(|_| "Unknown".into());
        let (tx, rx) = mpsc::channel();
        let connection = input
            .connect(
                port,
                "ivory-keyboard",
                move |_stamp, message, _| {
                    let _ = tx.send(MidiMessage::new(message));
                },
                (),
            )
            .map_err(|e| anyhow!(format!("midi connect error: {e:?}")))?;
        info!(input = %input_name, input_index, "listening for midi");
        Ok(MidiSubscription {
            receiver: rx,
            connection: Some(connection),
            input_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_inputs_does_not_panic() {
        // MIDI input availability varies by environment; just ensure no panic.
        let _ = MidiManager::list_inputs();
    }

    #[test]
    fn drain_reports_messages_then_closure() {
        let (tx, rx) = mpsc::channel();
        let subscription = MidiSubscription::from_channel(rx, "test");
        tx.send(MidiMessage::note_on(60, 90)).unwrap();
        tx.send(MidiMessage::note_off(60)).unwrap();
        let drained = subscription.drain();
        assert_eq!(drained.messages.len(), 2);
        assert!(!drained.closed);

        drop(tx);
        assert!(subscription.drain().closed);
        subscription.close();
    }
}
