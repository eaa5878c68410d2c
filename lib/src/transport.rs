use core::ffi::{c_int, c_void};
use core::fmt;
use core::future::Future;
use core::mem::{MaybeUninit, size_of};
use core::net::Ipv4Addr;
use core::time::Duration;

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tokio::time::{self, Instant};

use crate::Buffer;
use crate::error::{Error, ErrorKind};

macro_rules! rt {
    ($e:expr) => {{
        let n = $e;

        if n != 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }};
}

/// The step of an exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening and connecting the socket.
    Open,
    /// Writing the request.
    Send,
    /// Reading the reply.
    Receive,
}

impl fmt::Display for Stage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Open => write!(f, "open"),
            Stage::Send => write!(f, "send"),
            Stage::Receive => write!(f, "receive"),
        }
    }
}

/// A socket level failure other than a reply timeout.
#[derive(Debug)]
pub struct TransportError {
    pub stage: Stage,
    pub error: Error,
}

impl TransportError {
    #[inline]
    pub fn new(stage: Stage, error: impl Into<Error>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

impl fmt::Display for TransportError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl core::error::Error for TransportError {
    #[inline]
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// How a single request and reply cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// Something was read into the buffer.
    Reply { elapsed: Duration },
    /// Nothing arrived before the reply deadline.
    Timeout { elapsed: Duration },
}

/// Sends one request and waits for one reply.
///
/// Implementations own whatever connection they open for the duration of the
/// call, and must release it before returning.
pub trait Transport {
    /// Send `request` to `addr` and read a single reply into `buf`.
    fn send_and_receive(
        &mut self,
        addr: Ipv4Addr,
        request: &[u8],
        open_timeout: Duration,
        reply_timeout: Duration,
        buf: &mut Buffer,
    ) -> impl Future<Output = Result<Exchange, TransportError>>;
}

/// A transport which opens a raw ICMPv4 socket for every exchange.
///
/// Raw sockets deliver the whole IP datagram, so replies in the buffer are
/// prefixed by the IPv4 header. Opening one usually needs `CAP_NET_RAW`.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct SocketTransport;

impl SocketTransport {
    /// Construct a new socket transport.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SocketTransport {
    async fn send_and_receive(
        &mut self,
        addr: Ipv4Addr,
        request: &[u8],
        open_timeout: Duration,
        reply_timeout: Duration,
        buf: &mut Buffer,
    ) -> Result<Exchange, TransportError> {
        let socket = match time::timeout(open_timeout, open(addr)).await {
            Ok(socket) => socket.map_err(|e| TransportError::new(Stage::Open, e))?,
            Err(..) => {
                return Err(TransportError::new(
                    Stage::Open,
                    ErrorKind::OpenTimeout {
                        timeout: open_timeout,
                    },
                ));
            }
        };

        tracing::trace!(?addr, fd = socket.as_raw_fd(), "opened socket");

        send(&socket, request)
            .await
            .map_err(|e| TransportError::new(Stage::Send, e))?;

        buf.clear();

        let started = Instant::now();

        let exchange = match time::timeout(reply_timeout, recv(&socket, buf)).await {
            Ok(Ok(n)) => {
                let elapsed = started.elapsed();
                tracing::trace!(?addr, n, ?elapsed, "received reply");
                Exchange::Reply { elapsed }
            }
            Ok(Err(e)) => return Err(TransportError::new(Stage::Receive, e)),
            Err(..) => {
                tracing::trace!(?addr, ?reply_timeout, "reply deadline expired");
                Exchange::Timeout {
                    elapsed: reply_timeout,
                }
            }
        };

        // Dropping the socket closes it; early returns above do the same.
        drop(socket);
        Ok(exchange)
    }
}

async fn open(addr: Ipv4Addr) -> Result<AsyncFd<OwnedFd>, Error> {
    let socket = unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_ICMP);

        if fd < 0 {
            return Err(Error::new(ErrorKind::Socket(io::Error::last_os_error())));
        }

        OwnedFd::from_raw_fd(fd)
    };

    set_nonblocking(&socket).map_err(ErrorKind::SetNonblocking)?;
    set_echo_filter(&socket).map_err(ErrorKind::SetFilter)?;

    let (sockaddr, sockaddr_len) = to_sockaddr(addr);

    let result = unsafe {
        rt!(libc::connect(
            socket.as_raw_fd(),
            (&sockaddr as *const libc::sockaddr_in).cast::<libc::sockaddr>(),
            sockaddr_len,
        ))
    };

    let socket = AsyncFd::new(socket).map_err(ErrorKind::AsyncFd)?;

    match result {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => {
            _ = socket
                .writable()
                .await
                .map_err(ErrorKind::ConnectReady)?;

            if let Some(e) = take_error(socket.get_ref()).map_err(ErrorKind::ConnectReady)? {
                return Err(Error::new(ErrorKind::Connect(e)));
            }
        }
        Err(e) => return Err(Error::new(ErrorKind::Connect(e))),
    }

    Ok(socket)
}

async fn send(socket: &AsyncFd<OwnedFd>, request: &[u8]) -> Result<(), Error> {
    let sent = socket
        .async_io(Interest::WRITABLE, |socket| unsafe {
            let n = libc::send(
                socket.as_raw_fd(),
                request.as_ptr().cast::<c_void>(),
                request.len(),
                0,
            );

            if n < 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(n as usize)
        })
        .await
        .map_err(ErrorKind::Send)?;

    if sent != request.len() {
        return Err(Error::new(ErrorKind::ShortSend {
            sent,
            expected: request.len(),
        }));
    }

    Ok(())
}

async fn recv(socket: &AsyncFd<OwnedFd>, buf: &mut Buffer) -> Result<usize, Error> {
    let n = socket
        .async_io(Interest::READABLE, |socket| unsafe {
            let n = libc::recv(
                socket.as_raw_fd(),
                buf.as_uninit_mut().as_mut_ptr().cast::<c_void>(),
                buf.remaining_mut(),
                0,
            );

            if n < 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(n as usize)
        })
        .await
        .map_err(ErrorKind::Recv)?;

    buf.advance(n);
    Ok(n)
}

fn to_sockaddr(addr: Ipv4Addr) -> (libc::sockaddr_in, libc::socklen_t) {
    // SAFETY: An all-zero sockaddr_in is valid, every field we need is set
    // below.
    let mut sockaddr = unsafe { MaybeUninit::<libc::sockaddr_in>::zeroed().assume_init() };
    sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
    sockaddr.sin_port = 0;
    sockaddr.sin_addr = libc::in_addr {
        s_addr: addr.to_bits().to_be(),
    };

    (sockaddr, size_of::<libc::sockaddr_in>() as libc::socklen_t)
}

fn set_nonblocking(socket: &OwnedFd) -> io::Result<()> {
    unsafe {
        let flags = libc::fcntl(socket.as_raw_fd(), libc::F_GETFL, 0);

        if flags < 0 {
            return Err(io::Error::last_os_error());
        }

        rt!(libc::fcntl(
            socket.as_raw_fd(),
            libc::F_SETFL,
            flags | libc::O_NONBLOCK
        ))
    }
}

/// Stop the kernel from handing us echo requests, which a raw socket otherwise
/// sees when probing a local address.
fn set_echo_filter(socket: &OwnedFd) -> io::Result<()> {
    const ICMP_FILTER: c_int = 1;

    unsafe {
        let filter: u32 = 1 << crate::icmp::v4::Type::ECHO_REQUEST.get();

        rt!(libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_RAW,
            ICMP_FILTER,
            (&filter as *const u32).cast(),
            size_of::<u32>() as libc::socklen_t,
        ))
    }
}

fn take_error(socket: &OwnedFd) -> io::Result<Option<io::Error>> {
    unsafe {
        let mut error: c_int = 0;
        let mut len = size_of::<c_int>() as libc::socklen_t;

        rt!(libc::getsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            (&mut error as *mut c_int).cast(),
            &mut len,
        ))?;

        if error == 0 {
            Ok(None)
        } else {
            Ok(Some(io::Error::from_raw_os_error(error)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::icmp::v4;
    use crate::validate::{self, Expected};

    const IDENTIFIER: u16 = 0x5eed;

    async fn exchange(
        addr: Ipv4Addr,
        request: &[u8],
        reply_timeout: Duration,
        buf: &mut Buffer,
    ) -> Result<Exchange, TransportError> {
        SocketTransport::new()
            .send_and_receive(addr, request, Duration::from_secs(1), reply_timeout, buf)
            .await
    }

    #[test]
    fn sockaddr_is_network_order() {
        let (sockaddr, len) = to_sockaddr(Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(sockaddr.sin_family, libc::AF_INET as libc::sa_family_t);
        assert_eq!(sockaddr.sin_addr.s_addr.to_ne_bytes(), [127, 0, 0, 1]);
        assert_eq!(len as usize, size_of::<libc::sockaddr_in>());
    }

    #[test]
    fn transport_error_display() {
        let error = TransportError::new(
            Stage::Send,
            ErrorKind::ShortSend {
                sent: 4,
                expected: 28,
            },
        );

        assert_eq!(error.to_string(), "send failed: Short send: wrote 4 of 28 bytes");
    }

    #[tokio::test]
    #[ignore = "raw sockets need CAP_NET_RAW"]
    async fn loopback_replies() {
        let request = v4::encode_echo_request(IDENTIFIER, 1, 28).unwrap();
        let mut buf = Buffer::new();

        let result = exchange(Ipv4Addr::LOCALHOST, &request, Duration::from_secs(2), &mut buf)
            .await
            .unwrap();

        assert!(matches!(result, Exchange::Reply { .. }), "{result:?}");

        let raw = buf.as_bytes();
        let reply = v4::decode_echo_reply(raw, request.len()).unwrap();

        let expected = Expected {
            identifier: IDENTIFIER,
            sequence: 1,
        };

        let verdict = validate::validate(&reply, raw, expected);
        assert!(verdict.is_ok(), "{verdict:?}");
        assert_eq!(reply.payload, &request[v4::Header::SIZE..]);
    }

    #[tokio::test]
    #[ignore = "raw sockets need CAP_NET_RAW"]
    async fn unanswered_request_times_out() {
        let request = v4::encode_echo_request(IDENTIFIER, 2, 28).unwrap();
        let reply_timeout = Duration::from_millis(200);
        let mut buf = Buffer::new();

        let result = exchange(Ipv4Addr::new(192, 0, 2, 1), &request, reply_timeout, &mut buf)
            .await
            .unwrap();

        assert_eq!(
            result,
            Exchange::Timeout {
                elapsed: reply_timeout
            }
        );
    }

    #[tokio::test]
    #[ignore = "raw sockets need CAP_NET_RAW"]
    async fn broadcast_fails_to_open() {
        let request = v4::encode_echo_request(IDENTIFIER, 3, 28).unwrap();
        let mut buf = Buffer::new();

        let error = exchange(
            Ipv4Addr::BROADCAST,
            &request,
            Duration::from_millis(200),
            &mut buf,
        )
        .await
        .unwrap_err();

        assert_eq!(error.stage, Stage::Open);
        assert!(error.to_string().starts_with("open failed: "), "{error}");
    }
}
