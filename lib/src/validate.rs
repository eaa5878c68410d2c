//! Ordered checks applied to a received echo reply.
//!
//! Checks run in a fixed order and stop at the first one which fails:
//!
//! 1. The raw reply is at least as long as an ICMP header.
//! 2. The checksum over the framed ICMP bytes is intact.
//! 3. The message is an echo reply.
//! 4. The code is zero. A non-zero code is only logged as non-standard, the
//!    reply is still accepted.
//! 5. The identifier matches the request.
//! 6. The sequence number matches the request.

use core::fmt;

use crate::icmp::v4::{EchoReply, Header, Type, UnreachableCode};

/// The values a reply has to echo back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub identifier: u16,
    pub sequence: u16,
}

/// A reply which passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Accepted {
    /// Set if the reply carried a non-zero code.
    pub nonstandard_code: Option<u8>,
}

/// Why a reply was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Reason {
    TooShort { len: usize },
    Checksum { residue: u16 },
    NotEchoReply { ty: Type, code: u8 },
    Identifier { expected: u16, actual: u16 },
    Sequence { expected: u16, actual: u16 },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Reason::TooShort { len } => write!(
                f,
                "reply is too short, it should be at least {} bytes long but was {len} bytes",
                Header::SIZE
            ),
            Reason::Checksum { residue } => {
                write!(f, "reply checksum check failed (value: 0x{residue:04x})")
            }
            Reason::NotEchoReply { ty, code } if ty == Type::UNREACHABLE => {
                write!(f, "wrong ICMP type: {ty} ({})", UnreachableCode::new(code))
            }
            Reason::NotEchoReply { ty, code } => {
                write!(f, "wrong ICMP type: {ty} (type {}, code {code})", ty.get())
            }
            Reason::Identifier { expected, actual } => write!(
                f,
                "identifier sent (0x{expected:x}) doesn't match received (0x{actual:x})"
            ),
            Reason::Sequence { expected, actual } => write!(
                f,
                "sequence sent (0x{expected:x}) doesn't match received (0x{actual:x})"
            ),
        }
    }
}

struct Input<'a> {
    reply: &'a EchoReply,
    raw: &'a [u8],
    expected: Expected,
}

type Check = fn(&Input<'_>) -> Result<(), Reason>;

const CHECKS: [Check; 6] = [length, checksum, echo_reply, code, identifier, sequence];

/// Validate `reply`, decoded from the `raw` received bytes, against the
/// request it should answer.
pub fn validate(reply: &EchoReply, raw: &[u8], expected: Expected) -> Result<Accepted, Reason> {
    let input = Input {
        reply,
        raw,
        expected,
    };

    CHECKS.iter().try_for_each(|check| check(&input))?;

    Ok(Accepted {
        nonstandard_code: (reply.code != 0).then_some(reply.code),
    })
}

fn length(input: &Input<'_>) -> Result<(), Reason> {
    if input.raw.len() < Header::SIZE {
        return Err(Reason::TooShort {
            len: input.raw.len(),
        });
    }

    Ok(())
}

fn checksum(input: &Input<'_>) -> Result<(), Reason> {
    if input.reply.residue != 0 {
        return Err(Reason::Checksum {
            residue: input.reply.residue,
        });
    }

    Ok(())
}

fn echo_reply(input: &Input<'_>) -> Result<(), Reason> {
    if input.reply.ty != Type::ECHO_REPLY {
        return Err(Reason::NotEchoReply {
            ty: input.reply.ty,
            code: input.reply.code,
        });
    }

    Ok(())
}

fn code(input: &Input<'_>) -> Result<(), Reason> {
    if input.reply.code != 0 {
        tracing::warn!(
            code = input.reply.code,
            "ICMP code is {} rather than the expected 0, accepting non-standard reply",
            input.reply.code
        );
    }

    Ok(())
}

fn identifier(input: &Input<'_>) -> Result<(), Reason> {
    if input.reply.identifier != input.expected.identifier {
        return Err(Reason::Identifier {
            expected: input.expected.identifier,
            actual: input.reply.identifier,
        });
    }

    Ok(())
}

fn sequence(input: &Input<'_>) -> Result<(), Reason> {
    if input.reply.sequence != input.expected.sequence {
        return Err(Reason::Sequence {
            expected: input.expected.sequence,
            actual: input.reply.sequence,
        });
    }

    Ok(())
}
