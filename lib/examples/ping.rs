use core::time::Duration;

use anyhow::Result;
use clap::Parser;
use lib::{Event, ProbeConfig, ProbeOutcome, Prober, SocketTransport};

#[derive(Parser)]
struct Opts {
    /// Number of probes to send.
    #[clap(short = 'c', default_value_t = 3)]
    count: u32,
    /// Destination to ping.
    dest: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::try_parse()?;

    let mut config = ProbeConfig::new([opts.dest]);
    config.count = opts.count;
    config.pause = Duration::from_secs(1);

    let mut prober = Prober::new(SocketTransport::new());

    prober
        .run(&config, |event| match event {
            Event::Report(report) => match report.outcome {
                ProbeOutcome::Alive { rtt } => {
                    println!("{}: seq={:?} time={rtt:?}", report.target, report.sequence)
                }
                outcome => println!("{}: {outcome:?}", report.target),
            },
            Event::Summary(summary) => {
                dbg!(summary);
            }
        })
        .await?;

    Ok(())
}
