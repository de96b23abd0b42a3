//! MQTT client for remote commands
//!
//! Connects to an MQTT broker and subscribes to a topic. Payloads are either
//! plain text in the socket syntax (`step`, `set smoothing 0.3`) or JSON such
//! as `{"command": "set", "name": "smoothing", "value": 0.3}`.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;

use crate::control::{parse_command, Command};
use crate::error::MarbleError;

pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "marble";

/// JSON format for incoming commands
#[derive(Deserialize)]
struct JsonCommand {
    command: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<f32>,
}

/// Decode one payload, trying JSON first and falling back to plain text
pub fn parse_payload(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonCommand>(text) {
        Ok(json) if json.command.eq_ignore_ascii_case("set") => Some(Command::Set {
            name: json.name?.to_lowercase(),
            value: json.value?,
        }),
        Ok(json) => parse_command(&json.command),
        Err(_) => parse_command(text),
    }
}

/// MQTT client that receives commands in a background thread
pub struct MqttClient {
    receiver: Receiver<Command>,
    _thread: thread::JoinHandle<()>,
}

impl MqttClient {
    /// Create a new MQTT client and connect to the broker.
    /// Fails immediately if connection cannot be established.
    pub fn new(host: &str, topic: &str) -> Result<Self, MarbleError> {
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new("marble", host, DEFAULT_PORT);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| MarbleError::Mqtt(format!("failed to subscribe to '{topic}': {e}")))?;

        // Poll once so an unreachable broker fails at startup
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                return Err(MarbleError::Mqtt(format!(
                    "failed to connect to {host}:{DEFAULT_PORT}: {e}"
                )));
            },
            None => {
                return Err(MarbleError::Mqtt(format!(
                    "failed to connect to {host}:{DEFAULT_PORT}: connection closed"
                )));
            },
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();

        let handle = thread::spawn(move || {
            Self::message_loop(connection, &sender, &topic_owned);
        });

        log::info!("MQTT connected to {host}:{DEFAULT_PORT}, subscribed to '{topic}'");

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: rumqttc::Connection, sender: &Sender<Command>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                    let Ok(text) = std::str::from_utf8(&publish.payload) else {
                        log::warn!("MQTT payload is not UTF-8, ignoring");
                        continue;
                    };
                    match parse_payload(text) {
                        Some(cmd) => {
                            if sender.send(cmd).is_err() {
                                // Main thread gone
                                break;
                            }
                        },
                        None => log::warn!("ignoring MQTT payload {:?}", text.trim()),
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    // rumqttc reconnects on the next iteration
                    log::warn!("MQTT error: {e}");
                    thread::sleep(Duration::from_secs(1));
                },
            }
        }
    }

    /// Every command received since the last poll, oldest first
    pub fn poll(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }
}
