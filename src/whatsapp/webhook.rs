//! Meta webhook envelope parsing.
//!
//! The webhook body nests messages under `entry[].changes[].value.messages`
//! for changes whose `field` is `"messages"`. Individual messages are decoded
//! one at a time so a malformed entry skips quietly instead of failing the
//! whole delivery.

use serde::Deserialize;
use tracing::debug;

use crate::whatsapp::intent::Inbound;

/// One normalized inbound message with its sender.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub from: String,
    pub inbound: Inbound,
}

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    field: String,
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

/// Message payloads, tagged by the `type` field. Unknown kinds (media,
/// reactions, …) fall into `Unsupported` and are skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawMessage {
    Text {
        from: String,
        text: TextBody,
    },
    Button {
        from: String,
        button: ButtonBody,
    },
    Interactive {
        from: String,
        interactive: InteractiveBody,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct ButtonBody {
    #[serde(default)]
    payload: String,
}

#[derive(Debug, Deserialize)]
struct InteractiveBody {
    #[serde(default)]
    button_reply: Option<ButtonReply>,
}

#[derive(Debug, Deserialize)]
struct ButtonReply {
    #[serde(default)]
    id: String,
}

impl Envelope {
    /// Flatten the envelope into normalized events.
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        for entry in self.entry {
            for change in entry.changes {
                if change.field != "messages" {
                    continue;
                }
                for raw in change.value.messages {
                    match serde_json::from_value::<RawMessage>(raw) {
                        Ok(message) => {
                            if let Some(event) = normalize(message) {
                                events.push(event);
                            }
                        }
                        Err(e) => debug!(err = %e, "skipping undecodable webhook message"),
                    }
                }
            }
        }
        events
    }
}

fn normalize(message: RawMessage) -> Option<InboundEvent> {
    match message {
        RawMessage::Text { from, text } => Some(InboundEvent {
            from,
            inbound: Inbound::Text(text.body),
        }),
        RawMessage::Button { from, button } => Some(InboundEvent {
            from,
            inbound: Inbound::Button(button.payload),
        }),
        RawMessage::Interactive { from, interactive } => {
            let reply = interactive.button_reply?;
            Some(InboundEvent {
                from,
                inbound: Inbound::Button(reply.id),
            })
        }
        RawMessage::Unsupported => None,
    }
}
