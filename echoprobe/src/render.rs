use core::fmt::{self, Write};
use core::time::Duration;

use std::time::{SystemTime, UNIX_EPOCH};

use lib::{Event, ProbeOutcome, ProbeReport, TargetSummary};

/// Render an event as one or more lines of text.
pub(crate) fn event(event: &Event) -> String {
    let mut out = String::new();

    // Writing to a string cannot fail.
    _ = match event {
        Event::Report(r) => report(&mut out, r),
        Event::Summary(s) => summary(&mut out, s),
    };

    out
}

fn report(o: &mut impl Write, report: &ProbeReport) -> fmt::Result {
    let target = &report.target;

    let Some(address) = report.address else {
        if let ProbeOutcome::ResolutionError { message } = &report.outcome {
            writeln!(o, "{target}: address resolution error: {message}")?;
        } else {
            writeln!(o, "{target}: {:?}", report.outcome)?;
        }

        return Ok(());
    };

    write!(o, "{target} ({address})")?;

    match &report.outcome {
        ProbeOutcome::Alive { rtt } => {
            write!(o, " is alive: time={}", Millis(*rtt))?;
        }
        ProbeOutcome::Timeout { elapsed } => {
            write!(o, ": no reply within {}", Millis(*elapsed))?;
        }
        ProbeOutcome::ValidationFailed { reason, .. } => {
            write!(o, ": invalid reply: {reason}")?;
        }
        ProbeOutcome::TransportError { stage, message } => {
            write!(o, ": {stage} failed: {message}")?;
        }
        ProbeOutcome::ResolutionError { message } => {
            write!(o, ": address resolution error: {message}")?;
        }
    }

    if let Some(sequence) = report.sequence {
        write!(o, " seq={sequence}")?;
    }

    writeln!(o)?;

    if let ProbeOutcome::ValidationFailed { raw, .. } = &report.outcome {
        writeln!(o, "{}", Hex(raw))?;
    }

    Ok(())
}

fn summary(o: &mut impl Write, s: &TargetSummary) -> fmt::Result {
    writeln!(o, "--- {} ({}) ---", s.target, s.address)?;
    write!(o, "{} sent, {} alive, {:.1}% loss", s.sent, s.alive, s.loss())?;

    if let (Some(min), Some(avg), Some(max)) = (s.min, s.avg(), s.max) {
        write!(
            o,
            ", rtt min/avg/max = {:.3}/{:.3}/{:.3} ms",
            millis(min),
            millis(avg),
            millis(max)
        )?;
    }

    writeln!(o)
}

/// Seconds since the unix epoch, with millisecond precision.
pub(crate) fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

struct Millis(Duration);

impl fmt::Display for Millis {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} ms", millis(self.0))
    }
}

/// Space separated upper case hex bytes.
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut it = self.0.iter();

        if let Some(b) = it.next() {
            write!(f, "{b:02X}")?;
        }

        for b in it {
            write!(f, " {b:02X}")?;
        }

        Ok(())
    }
}
