use core::fmt::Write;
use core::future::Future;
use core::net::{IpAddr, Ipv4Addr};
use core::time::Duration;

use std::net::ToSocketAddrs;
use std::process;

use tokio::task;
use tokio::time;

use crate::buf::{MAX_IPV4_HEADER, RECV_SIZE};
use crate::error::{Error, ErrorKind};
use crate::icmp::v4;
use crate::transport::{Exchange, Stage, Transport};
use crate::validate::{self, Expected, Reason};
use crate::Buffer;

/// The sequence number of the first probe in a run.
pub const INITIAL_SEQUENCE: u16 = 12345;

/// Configuration for a probing run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ProbeConfig {
    /// Host names or IPv4 literals, probed in order.
    pub targets: Vec<String>,
    /// Probes sent to each target.
    pub count: u32,
    /// How long to wait for each reply.
    pub reply_timeout: Duration,
    /// Pause between consecutive probes to the same target.
    pub pause: Duration,
    /// How long opening the socket may take.
    pub open_timeout: Duration,
    /// Total size of the ICMP message, header included.
    pub packet_size: usize,
}

impl ProbeConfig {
    pub const DEFAULT_COUNT: u32 = 1;
    pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_PAUSE: Duration = Duration::from_millis(100);
    pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_PACKET_SIZE: usize = 28;
    /// The largest message whose reply still fits the receive buffer behind
    /// any IPv4 header.
    pub const MAX_PACKET_SIZE: usize = RECV_SIZE - MAX_IPV4_HEADER;

    /// Construct a configuration with default settings for the given targets.
    pub fn new<I>(targets: I) -> Self
    where
        I: IntoIterator<Item: Into<String>>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            count: Self::DEFAULT_COUNT,
            reply_timeout: Self::DEFAULT_REPLY_TIMEOUT,
            pause: Self::DEFAULT_PAUSE,
            open_timeout: Self::DEFAULT_OPEN_TIMEOUT,
            packet_size: Self::DEFAULT_PACKET_SIZE,
        }
    }

    /// Check that the configuration can be used for a run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.count == 0 {
            return Err(Error::new(ErrorKind::ZeroCount));
        }

        if self.reply_timeout.is_zero() {
            return Err(Error::new(ErrorKind::ZeroTimeout {
                field: "reply timeout",
            }));
        }

        if self.open_timeout.is_zero() {
            return Err(Error::new(ErrorKind::ZeroTimeout {
                field: "open timeout",
            }));
        }

        if self.packet_size > Self::MAX_PACKET_SIZE {
            return Err(Error::new(ErrorKind::PacketTooLarge {
                size: self.packet_size,
                max: Self::MAX_PACKET_SIZE,
            }));
        }

        // Catches undersized and odd packets.
        v4::encode_echo_request(0, 0, self.packet_size)?;
        Ok(())
    }
}

/// The result of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A matching reply arrived.
    Alive { rtt: Duration },
    /// Nothing arrived within the reply timeout.
    Timeout { elapsed: Duration },
    /// A reply arrived but was rejected.
    ValidationFailed { reason: Reason, raw: Vec<u8> },
    /// The socket failed.
    TransportError { stage: Stage, message: String },
    /// The target could not be resolved to an IPv4 address.
    ResolutionError { message: String },
}

impl ProbeOutcome {
    /// Test if the outcome is a live reply.
    pub fn is_alive(&self) -> bool {
        matches!(self, ProbeOutcome::Alive { .. })
    }
}

/// A probe outcome together with what was probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub target: String,
    /// Resolved address, missing if resolution failed.
    pub address: Option<Ipv4Addr>,
    /// Sequence number of the request, missing if nothing was sent.
    pub sequence: Option<u16>,
    pub outcome: ProbeOutcome,
}

/// Aggregated results for one resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TargetSummary {
    pub target: String,
    pub address: Ipv4Addr,
    pub sent: u32,
    pub alive: u32,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
    total: Duration,
}

impl TargetSummary {
    /// Construct an empty summary.
    pub fn new(target: &str, address: Ipv4Addr) -> Self {
        Self {
            target: target.to_owned(),
            address,
            sent: 0,
            alive: 0,
            min: None,
            max: None,
            total: Duration::ZERO,
        }
    }

    /// Account for one probe attempt.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.sent += 1;

        let ProbeOutcome::Alive { rtt } = *outcome else {
            return;
        };

        self.alive += 1;
        self.total += rtt;
        self.min = Some(self.min.map_or(rtt, |min| min.min(rtt)));
        self.max = Some(self.max.map_or(rtt, |max| max.max(rtt)));
    }

    /// Average round-trip time over live replies.
    pub fn avg(&self) -> Option<Duration> {
        if self.alive == 0 {
            return None;
        }

        Some(self.total / self.alive)
    }

    /// Percentage of probes which did not produce a live reply.
    pub fn loss(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }

        f64::from(self.sent - self.alive) * 100.0 / f64::from(self.sent)
    }
}

/// Something produced by a run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One probe attempt, or a failed resolution.
    Report(ProbeReport),
    /// All probes to a target have completed.
    Summary(TargetSummary),
}

/// Resolves target names to IPv4 addresses.
pub trait Resolve {
    fn resolve(&mut self, name: &str) -> impl Future<Output = Result<Ipv4Addr, Error>>;
}

/// Resolves through the system resolver on the blocking pool.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    async fn resolve(&mut self, name: &str) -> Result<Ipv4Addr, Error> {
        if let Ok(addr) = name.parse::<Ipv4Addr>() {
            return Ok(addr);
        }

        let name = name.to_owned();

        task::spawn_blocking(move || {
            let result = (name.as_str(), 0).to_socket_addrs();

            let addrs = match result {
                Ok(addrs) => addrs,
                Err(error) => return Err(Error::new(ErrorKind::Lookup { name, error })),
            };

            for addr in addrs {
                if let IpAddr::V4(ip) = addr.ip() {
                    return Ok(ip);
                }
            }

            Err(Error::new(ErrorKind::NoIpv4Address { name }))
        })
        .await
        .map_err(|_| Error::new(ErrorKind::LookupTask))?
    }
}

/// Waits between probes to the same target.
pub trait Pause {
    fn pause(&mut self, duration: Duration) -> impl Future<Output = ()>;
}

/// Pauses by sleeping on the runtime timer.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Sleep;

impl Pause for Sleep {
    async fn pause(&mut self, duration: Duration) {
        time::sleep(duration).await;
    }
}

/// Issues echo requests to a list of targets, one at a time.
///
/// The prober owns the identifier used in every request and a sequence number
/// which advances after each attempt across all targets.
pub struct Prober<T, R = SystemResolver, P = Sleep> {
    transport: T,
    resolver: R,
    pause: P,
    identifier: u16,
    sequence: u16,
    buf: Buffer,
}

impl<T> Prober<T>
where
    T: Transport,
{
    /// Construct a prober using the system resolver and a sleeping pause.
    pub fn new(transport: T) -> Self {
        Self::with_parts(transport, SystemResolver, Sleep)
    }
}

impl<T, R, P> Prober<T, R, P>
where
    T: Transport,
    R: Resolve,
    P: Pause,
{
    /// Construct a prober out of its collaborators.
    ///
    /// The identifier is derived from the process id.
    pub fn with_parts(transport: T, resolver: R, pause: P) -> Self {
        Self {
            transport,
            resolver,
            pause,
            identifier: (process::id() & 0xffff) as u16,
            sequence: INITIAL_SEQUENCE,
            buf: Buffer::new(),
        }
    }

    /// Override the identifier.
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    /// Override the sequence number of the next probe.
    pub fn with_sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    /// The identifier put in every request.
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// The sequence number the next probe will use.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Probe every configured target `count` times.
    ///
    /// Per-probe failures are reported through `on_event` and never end the
    /// run. Only an unusable configuration is returned as an error.
    pub async fn run(
        &mut self,
        config: &ProbeConfig,
        mut on_event: impl FnMut(Event),
    ) -> Result<Vec<TargetSummary>, Error> {
        config.validate()?;

        let mut summaries = Vec::new();

        for target in &config.targets {
            let address = match self.resolver.resolve(target).await {
                Ok(address) => address,
                Err(error) => {
                    tracing::debug!(host = %target, %error, "resolution failed");

                    on_event(Event::Report(ProbeReport {
                        target: target.clone(),
                        address: None,
                        sequence: None,
                        outcome: ProbeOutcome::ResolutionError {
                            message: chain(&error),
                        },
                    }));

                    continue;
                }
            };

            let mut summary = TargetSummary::new(target, address);

            for n in 0..config.count {
                if n > 0 {
                    self.pause.pause(config.pause).await;
                }

                let sequence = self.sequence;
                let outcome = self.probe(address, sequence, config).await?;
                self.sequence = self.sequence.wrapping_add(1);

                tracing::debug!(host = %target, %address, sequence, ?outcome, "probed");

                summary.record(&outcome);

                on_event(Event::Report(ProbeReport {
                    target: target.clone(),
                    address: Some(address),
                    sequence: Some(sequence),
                    outcome,
                }));
            }

            on_event(Event::Summary(summary.clone()));
            summaries.push(summary);
        }

        Ok(summaries)
    }

    async fn probe(
        &mut self,
        address: Ipv4Addr,
        sequence: u16,
        config: &ProbeConfig,
    ) -> Result<ProbeOutcome, Error> {
        let request = v4::encode_echo_request(self.identifier, sequence, config.packet_size)?;

        let result = self
            .transport
            .send_and_receive(
                address,
                &request,
                config.open_timeout,
                config.reply_timeout,
                &mut self.buf,
            )
            .await;

        let elapsed = match result {
            Ok(Exchange::Reply { elapsed }) => elapsed,
            Ok(Exchange::Timeout { elapsed }) => return Ok(ProbeOutcome::Timeout { elapsed }),
            Err(error) => {
                return Ok(ProbeOutcome::TransportError {
                    stage: error.stage,
                    message: chain(&error.error),
                });
            }
        };

        let raw = self.buf.as_bytes();

        let expected = Expected {
            identifier: self.identifier,
            sequence,
        };

        let verdict = match v4::decode_echo_reply(raw, request.len()) {
            Ok(reply) => validate::validate(&reply, raw, expected),
            Err(..) => Err(Reason::TooShort { len: raw.len() }),
        };

        Ok(match verdict {
            Ok(..) => ProbeOutcome::Alive { rtt: elapsed },
            Err(reason) => ProbeOutcome::ValidationFailed {
                reason,
                raw: raw.to_vec(),
            },
        })
    }
}

/// Format an error with its sources, separated by colons.
fn chain(error: &dyn core::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();

    while let Some(e) = source {
        _ = write!(out, ": {e}");
        source = e.source();
    }

    out
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::io;

    use super::*;
    use crate::icmp::v4::{Header, Type};
    use crate::transport::TransportError;

    /// What the scripted transport does with the next request.
    enum Step {
        Echo,
        EchoWith(fn(&mut Vec<u8>)),
        Bytes(&'static [u8]),
        Timeout,
        Fail(Stage),
    }

    /// A transport which answers from a script and records what it was sent.
    struct Scripted {
        steps: VecDeque<Step>,
        fallback: fn() -> Step,
        sent: Vec<(Ipv4Addr, Vec<u8>)>,
    }

    impl Scripted {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                fallback: || Step::Echo,
                sent: Vec::new(),
            }
        }

        fn always(fallback: fn() -> Step) -> Self {
            Self {
                steps: VecDeque::new(),
                fallback,
                sent: Vec::new(),
            }
        }

        fn sequences(&self) -> Vec<u16> {
            self.sent
                .iter()
                .map(|(_, r)| Header::from_bytes(r).unwrap().sequence())
                .collect()
        }
    }

    /// Turn a request into a correctly checksummed reply behind an IPv4
    /// header.
    fn echo(request: &[u8], tweak: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut reply = request.to_vec();
        reply[0] = Type::ECHO_REPLY.get();
        tweak(&mut reply);
        reply[2..4].fill(0);
        let sum = v4::checksum(&reply);
        reply[2..4].copy_from_slice(&sum.to_be_bytes());

        let mut datagram = vec![0u8; 20];
        datagram[0] = 0x45;
        datagram.extend_from_slice(&reply);
        datagram
    }

    impl Transport for Scripted {
        async fn send_and_receive(
            &mut self,
            addr: Ipv4Addr,
            request: &[u8],
            _: Duration,
            reply_timeout: Duration,
            buf: &mut Buffer,
        ) -> Result<Exchange, TransportError> {
            self.sent.push((addr, request.to_vec()));
            buf.clear();

            let step = self.steps.pop_front().unwrap_or_else(self.fallback);

            match step {
                Step::Echo => buf.extend_from_slice(&echo(request, |_| {})),
                Step::EchoWith(tweak) => buf.extend_from_slice(&echo(request, tweak)),
                Step::Bytes(bytes) => buf.extend_from_slice(bytes),
                Step::Timeout => {
                    return Ok(Exchange::Timeout {
                        elapsed: reply_timeout,
                    });
                }
                Step::Fail(stage) => {
                    let error = io::Error::from(io::ErrorKind::ConnectionRefused);
                    return Err(TransportError::new(stage, ErrorKind::Recv(error)));
                }
            }

            Ok(Exchange::Reply {
                elapsed: Duration::from_millis(3),
            })
        }
    }

    /// Resolves from a fixed table.
    struct Table(HashMap<&'static str, Ipv4Addr>);

    impl Table {
        fn new(entries: &[(&'static str, Ipv4Addr)]) -> Self {
            Self(entries.iter().copied().collect())
        }
    }

    impl Resolve for Table {
        async fn resolve(&mut self, name: &str) -> Result<Ipv4Addr, Error> {
            self.0.get(name).copied().ok_or_else(|| {
                Error::new(ErrorKind::NoIpv4Address {
                    name: name.to_owned(),
                })
            })
        }
    }

    /// Records pauses instead of sleeping.
    #[derive(Default)]
    struct Counting(Vec<Duration>);

    impl Pause for Counting {
        async fn pause(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    const A: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
    const B: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 2);

    fn table() -> Table {
        Table::new(&[("a.example", A), ("b.example", B)])
    }

    async fn collect<T, R, P>(
        prober: &mut Prober<T, R, P>,
        config: &ProbeConfig,
    ) -> (Vec<ProbeReport>, Vec<TargetSummary>)
    where
        T: Transport,
        R: Resolve,
        P: Pause,
    {
        let mut reports = Vec::new();

        let summaries = prober
            .run(config, |event| {
                if let Event::Report(report) = event {
                    reports.push(report);
                }
            })
            .await
            .unwrap();

        (reports, summaries)
    }

    #[tokio::test]
    async fn loopback_end_to_end() {
        let mut prober = Prober::with_parts(Scripted::new([]), SystemResolver, Counting::default());
        let config = ProbeConfig::new(["127.0.0.1"]);

        let (reports, _) = collect(&mut prober, &config).await;

        let [report] = &reports[..] else {
            panic!("expected one report, got {reports:?}");
        };

        assert_eq!(report.address, Some(Ipv4Addr::LOCALHOST));
        assert_eq!(report.sequence, Some(12345));
        assert!(matches!(report.outcome, ProbeOutcome::Alive { rtt } if rtt >= Duration::ZERO));

        let (addr, request) = &prober.transport.sent[0];
        let header = Header::from_bytes(request).unwrap();
        assert_eq!(*addr, Ipv4Addr::LOCALHOST);
        assert_eq!(header.ty, Type::ECHO_REQUEST);
        assert_eq!(header.code, 0);
        assert_eq!(header.identifier(), (process::id() & 0xffff) as u16);
        assert_eq!(header.sequence(), 12345);
        assert_eq!(request.len(), ProbeConfig::DEFAULT_PACKET_SIZE);
        assert_eq!(v4::checksum(request), 0);
    }

    #[tokio::test]
    async fn sequences_run_across_targets() {
        let mut prober = Prober::with_parts(Scripted::new([]), table(), Counting::default())
            .with_sequence(100);

        let mut config = ProbeConfig::new(["a.example", "b.example"]);
        config.count = 3;

        let (reports, summaries) = collect(&mut prober, &config).await;

        assert_eq!(prober.transport.sequences(), [100, 101, 102, 103, 104, 105]);
        assert_eq!(prober.sequence(), 106);

        let addrs = prober.transport.sent.iter().map(|(a, _)| *a).collect::<Vec<_>>();
        assert_eq!(addrs, [A, A, A, B, B, B]);

        assert_eq!(reports.len(), 6);
        assert!(reports.iter().all(|r| r.outcome.is_alive()));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].target, "b.example");
        assert_eq!(summaries[1].sent, 3);
        assert_eq!(summaries[1].alive, 3);
        assert_eq!(summaries[1].avg(), Some(Duration::from_millis(3)));
        assert_eq!(summaries[1].loss(), 0.0);

        // Pauses only happen between probes to the same target.
        assert_eq!(prober.pause.0.len(), 4);
    }

    #[tokio::test]
    async fn sequence_wraps() {
        let mut prober = Prober::with_parts(Scripted::new([]), table(), Counting::default())
            .with_sequence(u16::MAX);

        let mut config = ProbeConfig::new(["a.example"]);
        config.count = 2;

        collect(&mut prober, &config).await;
        assert_eq!(prober.transport.sequences(), [u16::MAX, 0]);
    }

    #[tokio::test]
    async fn timeouts_pause_between_repetitions_only() {
        let transport = Scripted::always(|| Step::Timeout);
        let mut prober = Prober::with_parts(transport, table(), Counting::default());

        let mut config = ProbeConfig::new(["a.example"]);
        config.count = 3;
        config.pause = Duration::from_millis(250);
        config.reply_timeout = Duration::from_millis(1500);

        let (reports, summaries) = collect(&mut prober, &config).await;

        assert_eq!(reports.len(), 3);

        for report in &reports {
            assert_eq!(
                report.outcome,
                ProbeOutcome::Timeout {
                    elapsed: Duration::from_millis(1500)
                }
            );
        }

        assert_eq!(prober.pause.0, [Duration::from_millis(250); 2]);
        assert_eq!(summaries[0].alive, 0);
        assert_eq!(summaries[0].loss(), 100.0);
        assert_eq!(summaries[0].avg(), None);
    }

    #[tokio::test]
    async fn mismatched_reply_keeps_raw_bytes() {
        let transport = Scripted::new([
            Step::EchoWith(|r| r[4..6].copy_from_slice(&0xbeefu16.to_be_bytes())),
            Step::EchoWith(|r| r[6..8].copy_from_slice(&7u16.to_be_bytes())),
        ]);

        let mut prober =
            Prober::with_parts(transport, table(), Counting::default()).with_identifier(0x1111);

        let mut config = ProbeConfig::new(["a.example"]);
        config.count = 2;

        let (reports, _) = collect(&mut prober, &config).await;

        let ProbeOutcome::ValidationFailed { reason, raw } = &reports[0].outcome else {
            panic!("unexpected outcome {:?}", reports[0].outcome);
        };

        assert_eq!(
            *reason,
            Reason::Identifier {
                expected: 0x1111,
                actual: 0xbeef
            }
        );

        assert_eq!(raw.len(), 20 + 28);
        assert_eq!(&raw[24..26], &[0xbe, 0xef]);

        let ProbeOutcome::ValidationFailed { reason, .. } = &reports[1].outcome else {
            panic!("unexpected outcome {:?}", reports[1].outcome);
        };

        assert_eq!(
            *reason,
            Reason::Sequence {
                expected: INITIAL_SEQUENCE + 1,
                actual: 7
            }
        );
    }

    #[tokio::test]
    async fn failures_do_not_end_the_run() {
        let transport = Scripted::new([
            Step::Fail(Stage::Open),
            Step::EchoWith(|r| r[0] = Type::UNREACHABLE.get()),
            Step::EchoWith(|r| r[1] = 3),
        ]);

        let mut prober = Prober::with_parts(transport, table(), Counting::default());

        let mut config = ProbeConfig::new(["missing.example", "a.example", "b.example"]);
        config.count = 2;

        let (reports, summaries) = collect(&mut prober, &config).await;

        assert_eq!(reports.len(), 5);

        assert_eq!(reports[0].target, "missing.example");
        assert_eq!(reports[0].sequence, None);
        assert!(matches!(
            reports[0].outcome,
            ProbeOutcome::ResolutionError { .. }
        ));

        assert!(matches!(
            &reports[1].outcome,
            ProbeOutcome::TransportError { stage: Stage::Open, message } if message.contains("refused")
        ));

        assert!(matches!(
            reports[2].outcome,
            ProbeOutcome::ValidationFailed {
                reason: Reason::NotEchoReply { .. },
                ..
            }
        ));

        // A non-zero code is accepted.
        assert!(reports[3].outcome.is_alive());
        assert!(reports[4].outcome.is_alive());

        // Resolution failures do not consume sequence numbers.
        assert_eq!(reports[1].sequence, Some(INITIAL_SEQUENCE));
        assert_eq!(reports[4].sequence, Some(INITIAL_SEQUENCE + 3));

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].alive, 0);
        assert_eq!(summaries[1].alive, 2);
    }

    #[tokio::test]
    async fn truncated_reply_is_too_short() {
        let transport = Scripted::new([Step::Bytes(&[0x45, 0, 0, 0])]);
        let mut prober = Prober::with_parts(transport, table(), Counting::default());
        let config = ProbeConfig::new(["a.example"]);

        let (reports, _) = collect(&mut prober, &config).await;

        assert_eq!(
            reports[0].outcome,
            ProbeOutcome::ValidationFailed {
                reason: Reason::TooShort { len: 4 },
                raw: vec![0x45, 0, 0, 0],
            }
        );
    }

    #[tokio::test]
    async fn invalid_config_is_an_error() {
        let mut prober = Prober::with_parts(Scripted::new([]), table(), Counting::default());

        let mut config = ProbeConfig::new(["a.example"]);
        config.count = 0;
        assert!(prober.run(&config, |_| {}).await.is_err());

        let mut config = ProbeConfig::new(["a.example"]);
        config.packet_size = 9;
        assert!(prober.run(&config, |_| {}).await.is_err());

        let mut config = ProbeConfig::new(["a.example"]);
        config.packet_size = ProbeConfig::MAX_PACKET_SIZE + 2;
        assert!(prober.run(&config, |_| {}).await.is_err());

        let mut config = ProbeConfig::new(["a.example"]);
        config.reply_timeout = Duration::ZERO;
        assert!(prober.run(&config, |_| {}).await.is_err());

        assert!(prober.transport.sent.is_empty());
    }

    #[test]
    fn error_chain_includes_sources() {
        let error = Error::new(ErrorKind::Connect(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )));

        assert_eq!(chain(&error), "Failed to connect socket: permission denied");
    }
}
