//! FashionFactory showcase runner.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use media::AutoplayPolicy;
use showcase::{Scene, ShowcaseConfig};

/// Scroll a page of lazy videos and report when each one loads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene file (JSON); the built-in landing page is used when omitted
    #[arg(long)]
    scene: Option<String>,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Pixels scrolled between observation passes
    #[arg(long, default_value = "100")]
    step: f64,

    /// Base URL for relative media paths
    #[arg(long)]
    base_url: Option<String>,

    /// Autoplay policy: allowed, muted-only or blocked
    #[arg(long, default_value = "muted-only")]
    autoplay_policy: AutoplayPolicy,

    /// Print the page markup after scrolling
    #[arg(long)]
    dump_html: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("FashionFactory showcase v{}", showcase::VERSION);

    let mut config = ShowcaseConfig::new()
        .with_viewport(args.viewport_width, args.viewport_height)
        .with_scroll_step(args.step)?
        .with_autoplay_policy(args.autoplay_policy);
    if let Some(base) = &args.base_url {
        config = config.with_base_url(base)?;
    }

    let scene = match &args.scene {
        Some(path) => {
            Scene::from_file(path).with_context(|| format!("failed to load scene {path}"))?
        }
        None => Scene::landing(),
    };
    info!("{} media slots", scene.slots.len());

    let dump_html = args.dump_html;
    let report = showcase::run(config, scene, |page| {
        if dump_html {
            println!("{}", page.to_html());
        }
    })?;
    if report.live_observers > 0 {
        warn!("{} observers still live after unmount", report.live_observers);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
