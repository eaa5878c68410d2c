//! ICMP message layout and codecs.

mod macros;
pub mod v4;
