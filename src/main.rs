use std::{
    env, fs,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossbeam_channel::{bounded, select, tick, unbounded};
use glam::Vec3;
use gesture_forge::{
    Config, GestureEngine, LogFeedback, VoxelScene,
    physics::BodyTag,
    pipeline::{latest_frame, start_frame_stream},
    replay::Replay,
    synthetic::{demo_script, render_script},
    types::{GestureEvent, GestureEventKind, Transform},
};

const RENDER_INTERVAL: Duration = Duration::from_millis(16);
const SCRIPT_INTERVAL: Duration = Duration::from_millis(33);
const VOXEL_CELL: f32 = 0.2;

#[derive(Default)]
struct Args {
    replay: Option<PathBuf>,
    config: Option<PathBuf>,
    record: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut raw = env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => args.config = Some(raw.next().context("--config needs a path")?.into()),
            "--record" => args.record = Some(raw.next().context("--record needs a path")?.into()),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.replay = Some(path.into()),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;

    let replay = match &args.replay {
        Some(path) => Replay::load(path)?,
        None => Replay::new(render_script(&demo_script()), SCRIPT_INTERVAL),
    };
    if let Some(path) = &args.record {
        replay.save(path)?;
        log::info!("wrote {} frames to {}", replay.frames.len(), path.display());
        return Ok(());
    }

    let mut engine = GestureEngine::new(config).context("invalid configuration")?;
    let (event_tx, event_rx) = unbounded::<GestureEvent>();
    engine.add_listener(event_tx);

    let canvas = engine
        .world_mut()
        .register(Transform::from_position(Vec3::ZERO), 1.0, BodyTag::Manipulated);
    engine
        .world_mut()
        .register(Transform::default(), 5.0, BodyTag::SceneRoot);

    let mut scene = VoxelScene::new(VOXEL_CELL);
    let mut feedback = LogFeedback;

    let (frame_tx, frame_rx) = bounded(1);
    let interval = replay.interval();
    let stream = start_frame_stream(replay.frames, interval, frame_tx);
    let render = tick(RENDER_INTERVAL);
    let mut last_tick = Instant::now();

    loop {
        select! {
            recv(frame_rx) -> frame => {
                let Ok(frame) = frame else {
                    break;
                };
                let frame = latest_frame(frame, &frame_rx);
                match engine.on_frame(&frame, &mut scene, &mut feedback) {
                    Ok(outcome) => {
                        for action in &outcome.actions {
                            log::debug!("action: {action:?}");
                        }
                    }
                    Err(err) => log::warn!("dropping frame: {err}"),
                }
                for event in event_rx.try_iter() {
                    if event.kind != GestureEventKind::Update {
                        log::info!("{:?} {}", event.kind, event.data.display_text());
                    }
                }
            }
            recv(render) -> now => {
                let Ok(now) = now else {
                    break;
                };
                let dt = now.saturating_duration_since(last_tick).as_secs_f32();
                last_tick = now;
                for tween in engine.on_render_tick(dt, now) {
                    log::debug!("tween {tween:?} finished");
                }
            }
        }
    }
    stream.stop();

    let transform = engine.world().transform(canvas)?;
    log::info!(
        "session done: {} voxels, undo depth {}, mode {:?}, camera {:.1}, canvas at {:?}",
        scene.len(),
        scene.undo_depth(),
        engine.controller().mode(),
        engine.controller().camera_distance(),
        transform.position
    );
    println!("{} voxels drawn", scene.len());
    Ok(())
}
