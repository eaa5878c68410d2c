use core::fmt;
use core::time::Duration;

use std::io;

/// An error raised while building, sending or receiving ICMP echo messages.
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(super) fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Debug for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[derive(Debug)]
pub(super) enum ErrorKind {
    Socket(io::Error),
    SetNonblocking(io::Error),
    SetFilter(io::Error),
    AsyncFd(io::Error),
    Connect(io::Error),
    ConnectReady(io::Error),
    OpenTimeout { timeout: Duration },
    Send(io::Error),
    ShortSend { sent: usize, expected: usize },
    Recv(io::Error),
    PacketTooSmall { size: usize, min: usize },
    PacketSizeOdd { size: usize },
    PacketTooLarge { size: usize, max: usize },
    ReplyTooShort { len: usize, min: usize },
    Lookup { name: String, error: io::Error },
    LookupTask,
    NoIpv4Address { name: String },
    ZeroCount,
    ZeroTimeout { field: &'static str },
}

impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(..) => write!(f, "Creating raw ICMP socket failed"),
            Self::SetNonblocking(..) => write!(f, "Failed to set socket nonblocking"),
            Self::SetFilter(..) => write!(f, "Failed to set ICMP filter on socket"),
            Self::AsyncFd(..) => write!(f, "Building asynchronous fd failed"),
            Self::Connect(..) => write!(f, "Failed to connect socket"),
            Self::ConnectReady(..) => write!(f, "Failed to await socket connect readiness"),
            Self::OpenTimeout { timeout } => {
                write!(f, "Opening socket did not complete within {timeout:?}")
            }
            Self::Send(..) => write!(f, "Failed to send to socket"),
            Self::ShortSend { sent, expected } => {
                write!(f, "Short send: wrote {sent} of {expected} bytes")
            }
            Self::Recv(..) => write!(f, "Failed to receive from socket"),
            Self::PacketTooSmall { size, min } => {
                write!(f, "Packet size {size} is smaller than the {min} byte header")
            }
            Self::PacketSizeOdd { size } => {
                write!(f, "Packet size {size} is not a multiple of 2 bytes")
            }
            Self::PacketTooLarge { size, max } => {
                write!(f, "Packet size {size} exceeds the maximum of {max} bytes")
            }
            Self::ReplyTooShort { len, min } => {
                write!(f, "Reply of {len} bytes is shorter than the {min} byte header")
            }
            Self::Lookup { name, .. } => write!(f, "Failed to resolve `{name}`"),
            Self::LookupTask => write!(f, "Name lookup task panicked"),
            Self::NoIpv4Address { name } => write!(f, "No IPv4 address found for `{name}`"),
            Self::ZeroCount => write!(f, "Probe count must be at least 1"),
            Self::ZeroTimeout { field } => write!(f, "The {field} must be greater than zero"),
        }
    }
}

impl core::error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Socket(e) => Some(e),
            ErrorKind::SetNonblocking(e) => Some(e),
            ErrorKind::SetFilter(e) => Some(e),
            ErrorKind::AsyncFd(e) => Some(e),
            ErrorKind::Connect(e) => Some(e),
            ErrorKind::ConnectReady(e) => Some(e),
            ErrorKind::Send(e) => Some(e),
            ErrorKind::Recv(e) => Some(e),
            ErrorKind::Lookup { error, .. } => Some(error),
            _ => None,
        }
    }
}
