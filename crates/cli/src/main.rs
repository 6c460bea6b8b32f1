#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use podcast_narrator_core::config::{
    resolve_api_key, resolve_optional_string, Env, SegmentBudget, StdEnv, VoiceAssignment,
    VoiceId, DEFAULT_GUEST_LABEL, DEFAULT_GUEST_VOICE, DEFAULT_HOST_LABEL, DEFAULT_HOST_VOICE,
    DEFAULT_SEGMENT_BUDGET, ENV_SPEECH_API_KEY, ENV_SPEECH_ENDPOINT,
};
use podcast_narrator_core::pipeline::{
    CancelFlag, NarrationPipeline, PipelineConfig, SegmentStatus,
};
use podcast_narrator_core::playback::{AudioPlaybackSink, PlaybackSink};
use podcast_narrator_core::synth::{
    RemoteSpeechClient, RetryingSynthesizer, SpeechSynthesizer, Synthesizer, ToneSpeechClient,
};
use podcast_narrator_core::util::RetryConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "podcast-narrator")]
#[command(about = "Narrate a two-speaker dialogue script into a WAV file")]
struct Args {
    /// Script file; reads stdin when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(long, default_value = "narration.wav")]
    output: PathBuf,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long, default_value = DEFAULT_HOST_LABEL)]
    host_label: String,

    #[arg(long, default_value = DEFAULT_HOST_VOICE)]
    host_voice: String,

    #[arg(long, default_value = DEFAULT_GUEST_LABEL)]
    guest_label: String,

    #[arg(long, default_value = DEFAULT_GUEST_VOICE)]
    guest_voice: String,

    #[arg(long, default_value_t = DEFAULT_SEGMENT_BUDGET)]
    segment_budget: usize,

    /// Extra synthesis attempts per segment (0 = no retry)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Synthesize offline with a tone generator instead of the service
    #[arg(long)]
    offline: bool,

    /// Play the assembled track after writing the file
    #[arg(long)]
    play: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    run_narration(args, &env).await
}

async fn run_narration(args: Args, env: &impl Env) -> anyhow::Result<()> {
    let raw_script = read_script(args.script.as_deref())?;

    let voices = VoiceAssignment::two_speaker(
        &args.host_label,
        VoiceId::new(args.host_voice)?,
        &args.guest_label,
        VoiceId::new(args.guest_voice)?,
    );
    let config = PipelineConfig {
        voices,
        segment_budget: SegmentBudget::new(args.segment_budget)?,
    };

    let synth = build_synthesizer(
        args.offline,
        args.retries,
        args.endpoint,
        args.api_key,
        env,
    )?;

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, finishing with segments done so far");
                cancel.cancel();
            }
        });
    }

    let pipeline = NarrationPipeline::new(synth, config);
    let narration = pipeline.run(&raw_script, &cancel).await?;

    log_report(&narration.report);

    std::fs::write(&args.output, &narration.wav)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(
        path = %args.output.display(),
        bytes = narration.wav.len(),
        duration_ms = narration.track.duration().as_millis() as u64,
        "narration written"
    );

    if args.play {
        let sink = AudioPlaybackSink::new();
        sink.play(narration.track)
            .await
            .context("playback failed")?;
    }

    Ok(())
}

fn build_synthesizer(
    offline: bool,
    retries: u32,
    endpoint: Option<String>,
    api_key: Option<String>,
    env: &impl Env,
) -> anyhow::Result<Synthesizer> {
    let base: Arc<dyn SpeechSynthesizer> = if offline {
        Arc::new(ToneSpeechClient::new())
    } else {
        let endpoint = resolve_optional_string(endpoint, ENV_SPEECH_ENDPOINT, env)
            .context("an --endpoint (or SPEECH_ENDPOINT) is required unless --offline")?;
        let api_key = resolve_api_key(api_key, ENV_SPEECH_API_KEY, env)?
            .context("an --api-key (or SPEECH_API_KEY) is required unless --offline")?;
        Arc::new(RemoteSpeechClient::new(endpoint, api_key))
    };

    let synth = Synthesizer::new(base);
    if retries > 0 {
        let retry = RetryConfig::new(retries + 1, Duration::from_millis(500));
        Ok(Synthesizer::new(Arc::new(RetryingSynthesizer::new(
            synth, retry,
        ))))
    } else {
        Ok(synth)
    }
}

fn read_script(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display())),
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read script from stdin")?;
            Ok(buf)
        }
    }
}

fn log_report(report: &[podcast_narrator_core::pipeline::SegmentReport]) {
    for entry in report {
        match &entry.status {
            SegmentStatus::Synthesized { samples } => {
                tracing::info!(index = entry.index, chars = entry.chars, samples, "segment ok");
            }
            SegmentStatus::Failed { reason } => {
                tracing::warn!(index = entry.index, chars = entry.chars, %reason, "segment dropped");
            }
            SegmentStatus::Skipped => {
                tracing::info!(index = entry.index, chars = entry.chars, "segment skipped");
            }
        }
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
