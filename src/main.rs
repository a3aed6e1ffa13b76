use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mailbot::config::{DEFAULT_FETCH_TIMEOUT, DEFAULT_INTERVAL, DEFAULT_SNAP_URL};
use mailbot::{
    ClassifierPolicy, ConfiguredSource, DetectorConfig, Dispatch, FileSource, HttpSource, MailBot,
    RegionOfInterest, Scheduler,
};

#[derive(Parser)]
#[command(name = "mailbot")]
#[command(about = "Watch a mailbox camera and report whether mail has arrived")]
struct Cli {
    /// Snapshot URL of the mailbox camera
    #[arg(long, env = "SNAP_URL", default_value = DEFAULT_SNAP_URL)]
    url: String,

    /// Read the snapshot from a file instead of the camera (takes precedence over --url)
    #[arg(long, value_name = "IMAGE")]
    file: Option<PathBuf>,

    /// Region of interest as ROW_START:ROW_END,COL_START:COL_END
    #[arg(long, default_value = "350:720,400:900")]
    roi: RegionOfInterest,

    /// Minimum blob area in pixels
    #[arg(long)]
    min_area: Option<f32>,

    /// Minimum blob circularity, in (0, 1]
    #[arg(long)]
    min_circularity: Option<f32>,

    /// Minimum blob convexity, in (0, 1]
    #[arg(long)]
    min_convexity: Option<f32>,

    /// Minimum blob inertia ratio, in (0, 1]
    #[arg(long)]
    min_inertia_ratio: Option<f32>,

    /// Keypoint count meaning mail has arrived
    #[arg(long, default_value_t = 0)]
    arrived_count: usize,

    /// Keypoint count meaning mail has not arrived
    #[arg(long, default_value_t = 4)]
    not_arrived_count: usize,

    /// Seconds between runs
    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
    interval_secs: u64,

    /// Snapshot request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Run once and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save each run's step images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

impl Cli {
    fn detector(&self) -> DetectorConfig {
        let mut config = DetectorConfig::default();
        if let Some(min) = self.min_area {
            config.area.min = min;
        }
        if let Some(min) = self.min_circularity {
            config.circularity.min = min;
        }
        if let Some(min) = self.min_convexity {
            config.convexity.min = min;
        }
        if let Some(min) = self.min_inertia_ratio {
            config.inertia_ratio.min = min;
        }
        config
    }

    fn source(&self) -> anyhow::Result<ConfiguredSource> {
        Ok(match &self.file {
            Some(path) => ConfiguredSource::File(FileSource::new(path)),
            None => ConfiguredSource::Http(HttpSource::new(
                &self.url,
                Duration::from_secs(self.timeout_secs),
            )?),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if args.interval_secs == 0 {
        anyhow::bail!("--interval-secs must be at least 1");
    }

    let mut bot = MailBot::new(args.source()?)
        .with_roi(args.roi)?
        .with_detector(args.detector())?
        .with_policy(ClassifierPolicy {
            arrived_count: args.arrived_count,
            not_arrived_count: args.not_arrived_count,
        })?;

    if let Some(debug_dir) = args.debug_out.clone() {
        bot = bot.with_debug(debug_dir)?;
    }

    let mut scheduler = Scheduler::new(
        bot,
        Dispatch::logging(),
        Duration::from_secs(args.interval_secs),
    );

    if args.once {
        scheduler.tick().await?;
        return Ok(());
    }

    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
