use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kws_frontend::audio::adc::read_wav_mono;
use kws_frontend::audio::{NoiseAdc, ThreadTimer, ToneAdc};
use kws_frontend::telemetry;
use kws_frontend::{replay_samples, AppConfig, FeatureVector, FrontEnd, MfccPipeline};
use serde::Serialize;

/// Coefficients shown per hop in the human-readable live view
const PREVIEW_COEFFICIENTS: usize = 6;

#[derive(Parser, Debug)]
#[command(
    name = "kws_cli",
    about = "MFCC front-end harness for keyword spotting"
)]
struct Cli {
    /// JSON configuration file (defaults are used when absent or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Synthetic sine through the 12-bit converter model
    Tone,
    /// Synthetic white noise through the 12-bit converter model
    Noise,
    /// Default input device (needs the `mic` feature)
    Mic,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live chain and print the leading MFCCs of every hop
    Run {
        #[arg(long, value_enum, default_value_t = Source::Tone)]
        source: Source,
        #[arg(long, default_value_t = 1000.0)]
        tone_hz: f32,
        /// Stop after this many hops (runs until Ctrl-C otherwise)
        #[arg(long)]
        hops: Option<u64>,
        /// Emit JSON lines instead of the text preview
        #[arg(long)]
        json: bool,
    },
    /// Extract features from a WAV file as JSON lines
    File {
        #[arg(long)]
        wav: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the validated configuration and mel band layout
    Inspect,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Run {
            source,
            tone_hz,
            hops,
            json,
        } => run_live(config, source, tone_hz, hops, json),
        Commands::File { wav, output } => run_file(config, wav, output),
        Commands::Inspect => run_inspect(config),
    }
}

fn print_vector(fv: &FeatureVector, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(fv) {
            println!("{line}");
        }
        return;
    }
    let preview: Vec<String> = fv
        .coefficients
        .iter()
        .take(PREVIEW_COEFFICIENTS)
        .map(|c| format!("{c:8.3}"))
        .collect();
    println!(
        "hop {:>6} t={:>7}ms  MFCC[0..{}]: {}",
        fv.hop_index,
        fv.timestamp_ms,
        preview.len(),
        preview.join(" ")
    );
}

fn run_live(
    config: AppConfig,
    source: Source,
    tone_hz: f32,
    hops: Option<u64>,
    json: bool,
) -> Result<ExitCode> {
    let rate = config.features.sample_rate_hz;
    let sink = move |fv: &FeatureVector| print_vector(fv, json);

    let stats = match source {
        Source::Tone => {
            let adc = ToneAdc::new(tone_hz, rate, 0.5);
            let front_end = FrontEnd::start(&config, adc, ThreadTimer::new(), sink, hops)
                .context("failed to start front-end")?;
            wait_for(|| front_end.is_finished(), hops.is_some());
            front_end.stop()
        }
        Source::Noise => {
            let adc = NoiseAdc::new(0.3);
            let front_end = FrontEnd::start(&config, adc, ThreadTimer::new(), sink, hops)
                .context("failed to start front-end")?;
            wait_for(|| front_end.is_finished(), hops.is_some());
            front_end.stop()
        }
        Source::Mic => run_mic(&config, sink, hops)?,
    };

    let snapshot = telemetry::hub().snapshot();
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "stats": stats,
            "telemetry_events": snapshot.total_events,
            "recent": snapshot.recent.last(),
        }))?
    );
    Ok(ExitCode::SUCCESS)
}

/// Block until `done` reports true. Without a hop limit this only returns
/// when the process is interrupted.
fn wait_for(done: impl Fn() -> bool, bounded: bool) {
    let deadline = Instant::now() + Duration::from_secs(60);
    while !done() {
        if bounded && Instant::now() > deadline {
            tracing::warn!("[kws_cli] Hop limit not reached within 60 s, stopping");
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(feature = "mic")]
fn run_mic<S: kws_frontend::FeatureSink + 'static>(
    config: &AppConfig,
    sink: S,
    hops: Option<u64>,
) -> Result<kws_frontend::ExtractionStats> {
    use kws_frontend::audio::{MicCapture, RingBuffer};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    config.validate().context("invalid configuration")?;
    let pipeline = MfccPipeline::new(&config.features)?;
    let (producer, consumer) = RingBuffer::new(config.capture.ring_capacity);
    let consumer = consumer.with_wait_strategy(config.capture.wait_strategy);
    let mut capture = MicCapture::start(config.features.sample_rate_hz, producer)
        .context("failed to open microphone")?;

    let running = Arc::new(AtomicBool::new(true));
    let handle = kws_frontend::spawn_extraction_thread(
        consumer,
        pipeline,
        sink,
        Arc::clone(&running),
        config.telemetry.log_every_n_hops,
        hops,
    )?;
    wait_for(|| handle.is_finished(), hops.is_some());
    running.store(false, Ordering::Release);
    capture.stop();
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("extraction thread panicked"))
}

#[cfg(not(feature = "mic"))]
fn run_mic<S>(
    _config: &AppConfig,
    _sink: S,
    _hops: Option<u64>,
) -> Result<kws_frontend::ExtractionStats> {
    anyhow::bail!("microphone capture requires building with `--features mic`")
}

fn run_file(mut config: AppConfig, wav: PathBuf, output: Option<PathBuf>) -> Result<ExitCode> {
    let (samples, sample_rate) = read_wav_mono(&wav)
        .with_context(|| format!("failed to read {}", wav.display()))?;
    if sample_rate != config.features.sample_rate_hz {
        tracing::info!(
            "[kws_cli] Using WAV sample rate {} Hz instead of configured {} Hz",
            sample_rate,
            config.features.sample_rate_hz
        );
        config.features.sample_rate_hz = sample_rate;
    }

    let mut writer: Box<dyn Write + Send> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut write_error: Option<anyhow::Error> = None;
    let stats = replay_samples(&config.features, &samples, &mut |fv: &FeatureVector| {
        if write_error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut writer, fv)
            .map_err(anyhow::Error::from)
            .and_then(|_| writeln!(writer).map_err(anyhow::Error::from));
        if let Err(err) = result {
            write_error = Some(err);
        }
    })
    .context("invalid feature configuration")?;

    if let Some(err) = write_error {
        return Err(err.context("failed to write feature vectors"));
    }
    writer.flush()?;

    tracing::info!(
        "[kws_cli] {} samples -> {} feature vectors",
        samples.len(),
        stats.hops
    );
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct BandReport {
    band: usize,
    low_hz: f32,
    centre_hz: f32,
    high_hz: f32,
    bins: [usize; 3],
}

#[derive(Serialize)]
struct InspectReport<'a> {
    config: &'a AppConfig,
    hop_duration_ms: f64,
    bands: Vec<BandReport>,
}

fn run_inspect(config: AppConfig) -> Result<ExitCode> {
    if let Err(err) = config.validate() {
        eprintln!("{err}");
        return Ok(ExitCode::from(2));
    }
    let pipeline = MfccPipeline::new(&config.features)?;
    let bank = pipeline.filter_bank();
    let edges = bank.edges_hz();
    let bins = bank.bins();

    let bands = (0..bank.num_bands())
        .map(|m| BandReport {
            band: m,
            low_hz: edges[m],
            centre_hz: edges[m + 1],
            high_hz: edges[m + 2],
            bins: [bins[m], bins[m + 1], bins[m + 2]],
        })
        .collect();

    let report = InspectReport {
        config: &config,
        hop_duration_ms: config.features.hop_duration_ms(),
        bands,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}
