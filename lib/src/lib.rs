//! Core of a small ICMPv4 echo client.
//!
//! A [`Prober`] walks a list of targets, sending each a number of echo
//! requests through a [`Transport`] and validating whatever comes back.

#![allow(clippy::new_without_default)]

mod error;
pub use self::error::Error;

mod buf;
pub use self::buf::{Buffer, RECV_SIZE};

pub mod icmp;

mod transport;
pub use self::transport::{Exchange, SocketTransport, Stage, Transport, TransportError};

pub mod validate;

mod prober;
pub use self::prober::{
    Event, INITIAL_SEQUENCE, Pause, ProbeConfig, ProbeOutcome, ProbeReport, Prober, Resolve,
    Sleep, SystemResolver, TargetSummary,
};
