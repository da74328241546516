use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use echo_metronome::audio::LogHaptics;
use echo_metronome::bridge::{Action, ActionRequest, Completion, NativeBridge, PLUGIN_NAME};
use echo_metronome::config::AppConfig;
use echo_metronome::engine::{DesktopStubBackend, SoundMetronome};
use echo_metronome::plugin::{EchoPlugin, PluginHost};
use echo_metronome::{BridgeClient, PlatformInfo};
use serde_json::Value;
use tokio::runtime::Runtime;

/// Longest run accepted by `--seconds`.
const MAX_SECONDS: f64 = 3600.0;

#[derive(Parser, Debug)]
#[command(
    name = "echo-cli",
    about = "Drive the Echo metronome plugin from the command line"
)]
struct Cli {
    /// Platform identifier reported to the client (defaults to the build target)
    #[arg(long, global = true)]
    platform: Option<String>,
    /// JSON configuration file (defaults to assets/echo_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct BeatArgs {
    /// Tempo in beats per minute
    #[arg(long, default_value_t = 120.0)]
    speed: f64,
    /// Numeric step codes: 0 rest, 1 high, 2 mid, 3 low
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pattern: Vec<f64>,
    /// Symbol measure such as "eiii" (overrides --pattern)
    #[arg(long)]
    measure: Option<String>,
    /// How long to run, in seconds
    #[arg(long, default_value_t = 4.0)]
    seconds: f64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the metronome on the default output device
    Play {
        #[command(flatten)]
        beat: BeatArgs,
    },
    /// Render the metronome offline into a 16-bit mono WAV file
    Render {
        #[command(flatten)]
        beat: BeatArgs,
        #[arg(long)]
        output: PathBuf,
    },
    /// Play the tone (android platform only)
    Tone {
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
    },
}

fn main() -> ExitCode {
    echo_metronome::init_logging();
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
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    let platform = match cli.platform {
        Some(id) => PlatformInfo::new(id),
        None => PlatformInfo::detect(),
    };
    let rt = Runtime::new().context("starting tokio runtime")?;

    match cli.command {
        Commands::Play { beat } => {
            let duration = run_duration(beat.seconds)?;
            let plugin = EchoPlugin::for_platform(&config);
            let client = connect(&config, platform, plugin)?;
            rt.block_on(run_play(&client, &beat, duration))?;
        }
        Commands::Render { beat, output } => {
            let duration = run_duration(beat.seconds)?;
            run_render(&rt, &config, platform, &beat, duration, &output)?
        }
        Commands::Tone { seconds } => {
            let duration = run_duration(seconds)?;
            let plugin = EchoPlugin::for_platform(&config);
            let client = connect(&config, platform, plugin)?;
            rt.block_on(run_tone(&client, duration))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Validate `--seconds`: finite, not negative, at most an hour.
fn run_duration(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("--seconds must be a finite number >= 0 (got {seconds})");
    }
    if seconds > MAX_SECONDS {
        bail!("--seconds must be at most {MAX_SECONDS} (got {seconds})");
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn connect(
    config: &AppConfig,
    platform: PlatformInfo,
    plugin: EchoPlugin,
) -> Result<BridgeClient<Arc<PluginHost>>> {
    let host = PluginHost::new(&config.host).context("starting plugin host")?;
    host.register(PLUGIN_NAME, Arc::new(plugin));
    Ok(BridgeClient::new(Arc::new(host), platform))
}

/// Send `setBeatSpeed`. Symbol measures bypass the numeric client API and go
/// straight to the host.
async fn start_beat(client: &BridgeClient<Arc<PluginHost>>, beat: &BeatArgs) -> Result<()> {
    match &beat.measure {
        Some(measure) => {
            let (completion, rx) = Completion::channel();
            client.bridge().invoke(
                ActionRequest::new(
                    Action::SetBeatSpeed,
                    vec![Value::from(beat.speed), Value::from(measure.as_str())],
                ),
                completion,
            );
            rx.await.context("plugin host dropped the request")??;
        }
        None => {
            if beat.pattern.is_empty() {
                bail!("either --pattern or --measure is required");
            }
            client.set_beat_async(beat.speed, &beat.pattern).await?;
        }
    }
    Ok(())
}

async fn run_play(
    client: &BridgeClient<Arc<PluginHost>>,
    beat: &BeatArgs,
    duration: Duration,
) -> Result<()> {
    start_beat(client, beat).await.context("starting metronome")?;
    println!(
        "Playing at {} BPM for {}s on {}",
        beat.speed,
        duration.as_secs_f64(),
        client.platform().platform_id()
    );
    tokio::time::sleep(duration).await;
    client.stop_async().await.context("stopping metronome")?;
    Ok(())
}

async fn run_tone(client: &BridgeClient<Arc<PluginHost>>, duration: Duration) -> Result<()> {
    client.play_tone_async().await.context("starting tone")?;
    tokio::time::sleep(duration).await;
    client.stop_tone_async().await.context("stopping tone")?;
    Ok(())
}

fn run_render(
    rt: &Runtime,
    config: &AppConfig,
    platform: PlatformInfo,
    beat: &BeatArgs,
    duration: Duration,
    output: &Path,
) -> Result<()> {
    let sample_rate = config.audio.sample_rate;
    let backend = Arc::new(DesktopStubBackend::new(sample_rate));
    let metronome = SoundMetronome::new(backend.clone(), Arc::new(LogHaptics), config);
    let client = connect(config, platform, EchoPlugin::new(Arc::new(metronome)))?;

    rt.block_on(start_beat(&client, beat))
        .context("starting metronome")?;

    let frames = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
    let samples = backend.render(frames).context("rendering frames")?;

    rt.block_on(client.stop_async()).context("stopping metronome")?;
    client.bridge().shutdown();

    write_wav(output, sample_rate, &samples)?;
    println!(
        "Wrote {} frames at {} Hz to {}",
        samples.len(),
        sample_rate,
        output.display()
    );
    Ok(())
}

fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
