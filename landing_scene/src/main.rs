// main.rs - Headless driver: replays scripted input against the landing scene,
// then writes a wireframe PNG snapshot and/or a JSON state dump.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use cube_matrix_landing::{
    HeadlessStage, InputOutcome, InputScript, LandingApp, SceneConfig, ScriptAction, Viewport,
    WindowAction, WireframeRenderer,
};

/// One display frame at 60 Hz
const FRAME: Duration = Duration::from_millis(16);

/// Frames simulated after the last scripted step when `--frames` is absent
const TAIL_FRAMES: u64 = 120;

/// CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Scene config JSON; defaults apply to anything it leaves out
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input script JSON (array of {frame, action})
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Frames to simulate
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Viewport width
    #[arg(short = 'W', long, default_value = "1280")]
    pub width: u32,

    /// Viewport height
    #[arg(short = 'H', long, default_value = "800")]
    pub height: u32,

    /// Pace frames at display rate instead of running flat out
    #[arg(long)]
    pub realtime: bool,

    /// PNG snapshot of the final frame; use "-" for stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON dump of the final scene and stage state
    #[arg(long)]
    pub dump_state: Option<PathBuf>,

    /// Override the config's RNG seed
    #[arg(long)]
    pub seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<SceneConfig> {
    let mut config = match &args.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

async fn write_output(path: &Path, bytes: &[u8], what: &str) -> Result<()> {
    if path == Path::new("-") {
        use std::io::Write;
        std::io::stdout()
            .write_all(bytes)
            .with_context(|| format!("Failed writing {what} to stdout"))?;
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed writing {what} {}", path.display()))?;
    info!("Saved {what} to {}", path.display());
    Ok(())
}

fn apply(
    app: &mut LandingApp<HeadlessStage>,
    action: ScriptAction,
    pending: &mut Vec<(String, oneshot::Receiver<()>)>,
) -> Result<()> {
    match action {
        ScriptAction::Input(event) => match app.handle_input(&event)? {
            InputOutcome::Navigating { page_id, done } => pending.push((page_id, done)),
            InputOutcome::Unbound { matrix } => warn!("Matrix {} has nowhere to navigate", matrix.0),
            InputOutcome::Handled | InputOutcome::Ignored => {}
        },
        ScriptAction::Window(WindowAction::Resize { width, height }) => {
            app.resize(Viewport::new(width, height))?;
        }
        ScriptAction::Window(WindowAction::Back) => {
            if let Some(done) = app.back()? {
                pending.push(("canvas".to_string(), done));
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting with {args:?}");

    let config = load_config(&args)?;
    let mut script = match &args.script {
        Some(path) => InputScript::load(path)
            .with_context(|| format!("Failed to load script {}", path.display()))?,
        None => InputScript::default(),
    };
    let frames = args
        .frames
        .unwrap_or_else(|| script.last_frame().unwrap_or(0) + TAIL_FRAMES);

    let stage = HeadlessStage::new(config.pages.iter().map(|p| p.id.clone()));
    let renderer = WireframeRenderer::new(&config.palette);
    let mut app = LandingApp::new(config, Viewport::new(args.width, args.height), stage)
        .context("Failed to assemble scene")?;

    let mut ticker = args.realtime.then(|| tokio::time::interval(FRAME));
    let mut pending = Vec::new();
    let start = Instant::now();

    for frame in 0..frames {
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        for action in script.due(frame).collect::<Vec<_>>() {
            apply(&mut app, action, &mut pending)
                .with_context(|| format!("Scripted action failed at frame {frame}"))?;
        }

        app.frame(FRAME);

        pending.retain_mut(|(target, done)| match done.try_recv() {
            Ok(()) => {
                info!("Transition to {target} settled at frame {frame}");
                false
            }
            Err(oneshot::error::TryRecvError::Empty) => true,
            Err(oneshot::error::TryRecvError::Closed) => false,
        });

        if frame > 0 && frame % 60 == 0 {
            info!("Frame {frame}/{frames}");
        }
    }

    if !script.is_finished() {
        warn!("Script has steps beyond frame {frames}; they were not replayed");
    }
    let elapsed = start.elapsed();
    info!(
        "Simulated {} frames in {:?} ({:.1} frames/sec)",
        frames,
        elapsed,
        frames as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if let Some(path) = &args.dump_state {
        let dump = serde_json::json!({
            "scene": app.snapshot(),
            "stage": app.stage(),
        });
        let bytes = serde_json::to_vec_pretty(&dump).context("Failed to serialize state")?;
        write_output(path, &bytes, "state dump").await?;
    }

    if let Some(path) = &args.output {
        let image = renderer.render(app.scene());
        let png = WireframeRenderer::encode_png(&image).context("Failed to encode PNG")?;
        write_output(path, &png, "snapshot").await?;
    }

    Ok(())
}
