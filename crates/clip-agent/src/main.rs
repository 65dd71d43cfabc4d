//! # clip-agent
//!
//! InsightClip agent binary. Builds the page/privileged endpoint pair,
//! attaches the privileged handlers (screen source, downloader, settings),
//! spins up a page session, and drives one capture — or a short journey —
//! end to end from the command line.

#![deny(unsafe_code)]

mod privileged;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clip_bus::{Request, SendOptions, pair};
use clip_compose::{Compositor, FileIconLoader, IconLoader, NoIcons};
use clip_core::capture::PageTarget;
use clip_core::geometry::Coordinates;
use clip_core::state::{IconVariant, Mode};
use clip_runtime::{ClipSession, FixedTarget, PointerEvent};
use clip_settings::SettingsStore;

use privileged::FileScreenSource;

/// InsightClip capture agent.
#[derive(Parser, Debug)]
#[command(name = "clip-agent", about = "Mark a point on a page and save an annotated capture")]
struct Cli {
    /// PNG file standing in for the captured viewport.
    #[arg(long)]
    image: PathBuf,

    /// Capture point, horizontal.
    #[arg(long)]
    x: u32,

    /// Capture point, vertical.
    #[arg(long)]
    y: u32,

    /// Mode to activate: snap, annotate, transcribe, or journey.
    #[arg(long, default_value = "snap", value_parser = parse_mode)]
    mode: Mode,

    /// Marker icon variant: light, blue, or dark.
    #[arg(long, default_value = "blue", value_parser = parse_variant)]
    icon: IconVariant,

    /// Typed note composited beside the marker (annotate).
    #[arg(long)]
    note: Option<String>,

    /// Transcript text composited beside the marker (transcribe).
    #[arg(long)]
    transcript: Option<String>,

    /// URL the capture is attributed to.
    #[arg(long, default_value = "https://example.com/")]
    url: String,

    /// Directory captures are written into.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,

    /// Directory holding marker-{light,blue,dark}.png; fallback shapes
    /// are drawn when omitted.
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Persist extension state and settings to this file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Extra journey clicks as "x,y" (journey mode; repeatable).
    #[arg(long = "click", value_parser = parse_click)]
    clicks: Vec<Coordinates>,
}

fn parse_mode(raw: &str) -> Result<Mode, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| format!("unknown mode '{raw}' (snap|annotate|transcribe|journey)"))
}

fn parse_variant(raw: &str) -> Result<IconVariant, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| format!("unknown icon variant '{raw}' (light|blue|dark)"))
}

fn parse_click(raw: &str) -> Result<Coordinates, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{raw}'"))?;
    let x = x.trim().parse().map_err(|_| format!("bad x in '{raw}'"))?;
    let y = y.trim().parse().map_err(|_| format!("bad y in '{raw}'"))?;
    Ok(Coordinates::new(x, y))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // The store is the cross-context source of truth. File-backed when
    // asked to persist, otherwise seeded from the layered loader
    // (defaults → file → CLIP_* env).
    let store = match &args.settings {
        Some(path) => Arc::new(SettingsStore::open(path).context("opening settings store")?),
        None => {
            let settings =
                clip_settings::load_settings().context("loading layered settings")?;
            Arc::new(SettingsStore::with_settings(settings))
        }
    };

    // Two contexts, one wire.
    let bus = pair();
    privileged::attach(
        &bus.privileged,
        Arc::new(FileScreenSource::new(&args.image)),
        args.out_dir.clone(),
        store.clone(),
    );

    let icon_loader: Arc<dyn IconLoader> = match &args.assets_dir {
        Some(dir) => Arc::new(FileIconLoader::new(dir)),
        None => Arc::new(NoIcons),
    };
    let session = ClipSession::new(
        bus.page.clone(),
        store,
        Compositor::new(icon_loader),
        Arc::new(FixedTarget(PageTarget::new(args.url.clone()))),
    );

    // Make sure the page context is actually reachable before activating.
    bus.privileged
        .probe()
        .await
        .context("page context unreachable")?;

    // Activate from the privileged side, the way a sidebar click would.
    let _ = bus
        .privileged
        .send(
            Request::ActivateExtension {
                mode: args.mode,
                icon_variant: args.icon,
            },
            SendOptions::interactive(),
        )
        .await
        .with_context(|| format!("activating {} mode", args.mode))?;

    let origin = Coordinates::new(args.x, args.y);
    if args.mode == Mode::Journey {
        run_journey(&session, origin, &args.clicks).await?;
    } else {
        match session
            .capture_and_save(origin, args.note.clone(), args.transcript.clone())
            .await?
        {
            Some(download_id) => {
                info!(%download_id, dir = %args.out_dir.display(), "capture saved");
            }
            None => info!("capture rate limited; try again in a second"),
        }
    }

    session.controller().deactivate()?;
    Ok(())
}

/// Drive a short journey: the origin click plus any extras, spaced out so
/// the rate limiter admits them, then save the collection.
async fn run_journey(
    session: &Arc<ClipSession>,
    origin: Coordinates,
    extra_clicks: &[Coordinates],
) -> Result<()> {
    let mut points = vec![origin];
    points.extend_from_slice(extra_clicks);

    let spacing = Duration::from_millis(1100);
    for point in &points {
        let decision = session.handle_click(PointerEvent::primary_click(*point));
        info!(x = point.x, y = point.y, ?decision, "journey click");
        tokio::time::sleep(spacing).await;
    }

    let expected = points.len();
    for _ in 0..50 {
        if session.orchestrator().journey_len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let collected = session.orchestrator().journey_len();
    if collected == 0 {
        bail!("journey collected nothing — was every click rate limited?");
    }
    let saved = session.orchestrator().save_journey().await?;
    info!(saved, "journey collection saved");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
