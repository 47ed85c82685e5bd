//! Network abstraction
//!
//! Participants exchange a small set of protocol events over an abstract
//! bus. The in-process `FakeNet` delivers every message on a later
//! scheduling tick, so a broadcast never re-enters the sender
//! synchronously; the `Simulation` drives those ticks.

pub mod fake_net;
pub mod message;
pub mod simulation;

pub use fake_net::{Envelope, FakeNet};
pub use message::Message;
pub use simulation::{Participant, Simulation};
