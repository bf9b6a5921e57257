//! WhatsApp chatbot — the conversational name-change flow.
//!
//! The pipeline is split so the dialogue logic stays pure and unit-testable:
//!
//! - [`webhook`] unwraps the Meta webhook envelope into [`InboundEvent`]s
//! - [`intent`] classifies free text and button payloads
//! - [`flow`] is the five-state dialogue machine — a pure function from
//!   `(session, input)` to `(new session, replies)`
//! - [`session`] holds per-phone conversational state behind an injectable
//!   [`SessionStore`]
//! - [`transport`] dispatches outbound messages (Graph API or log-only demo)
//! - [`router`] ties it together with per-phone mutual exclusion

pub mod flow;
pub mod intent;
pub mod prompts;
pub mod router;
pub mod session;
pub mod transport;
pub mod webhook;

pub use intent::Inbound;
pub use router::{ChatRouter, ChatStatus};
pub use session::{ChatSession, ChatState, InMemorySessionStore, SessionStore};
pub use transport::{GraphTransport, MessageTransport, NoopTransport};
pub use webhook::InboundEvent;
