use std::time::Duration;

use clap::Subcommand;
use pacer_core::{BreathingPattern, Config, Event, PacerSession, SessionParams, SessionSnapshot};
use tokio::time::MissedTickBehavior;

use super::CliResult;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a breathing session in the terminal
    Run {
        /// Session length in seconds (overrides --params)
        #[arg(long)]
        sec: Option<u32>,
        /// Breathing pattern as inhale-hold-exhale seconds, e.g. 4-7-8
        #[arg(long)]
        pattern: Option<String>,
        /// Launch parameters as a query string or URL (sec, pattern, back_url, back_label)
        #[arg(long)]
        params: Option<String>,
        /// Print snapshots and events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the phase and countdown at a given elapsed time
    Phase {
        /// Milliseconds since the session started
        #[arg(long)]
        elapsed_ms: u64,
        /// Session length in seconds
        #[arg(long)]
        sec: Option<u32>,
        /// Breathing pattern as inhale-hold-exhale seconds
        #[arg(long)]
        pattern: Option<String>,
    },
}

pub fn run(action: SessionAction) -> CliResult {
    let config = Config::load_or_default();

    match action {
        SessionAction::Run { sec, pattern, params, json } => {
            let mut launch = match params {
                Some(query) => SessionParams::from_query(&query, &config.session),
                None => SessionParams::defaults(&config.session),
            };
            for fallback in &launch.fallbacks {
                eprintln!("warning: {fallback}; using default");
            }
            if let Some(sec) = sec {
                launch.total_secs = sec;
            }
            if let Some(pattern) = pattern {
                launch.pattern = pattern_or_default(&pattern);
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_session(launch, config.session.poll_interval_ms, json))?;
        }
        SessionAction::Phase { elapsed_ms, sec, pattern } => {
            let pattern = match pattern {
                Some(p) => pattern_or_default(&p),
                None => config.pattern(),
            };
            let total_secs = sec.unwrap_or(config.session.default_secs);
            let (session, _) = PacerSession::start_at(total_secs, pattern, 0)?;
            let snapshot = session.snapshot_at(elapsed_ms);
            let out = serde_json::json!({
                "total_secs": total_secs,
                "pattern": session.pattern().to_string(),
                "elapsed_ms": elapsed_ms,
                "remaining_secs": snapshot.remaining_secs,
                "phase": snapshot.phase,
                "instruction": snapshot.phase.instruction(),
                "progress": snapshot.progress,
                "finished": snapshot.finished,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

async fn run_session(launch: SessionParams, poll_interval_ms: u64, json: bool) -> CliResult {
    let (mut session, started) = PacerSession::start(launch.total_secs, launch.pattern)?;
    emit_event(&started, json)?;
    if !json {
        println!(
            "{}s session, pattern {} (Ctrl-C to stop)",
            session.total_secs(),
            session.pattern()
        );
    }

    let mut interval = tokio::time::interval(Duration::from_millis(poll_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown: Option<SessionSnapshot> = None;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let poll = session.poll();
                if changed(shown.as_ref(), &poll.snapshot) {
                    render(&poll.snapshot, json)?;
                    shown = Some(poll.snapshot);
                }
                if let Some(event) = poll.event {
                    emit_event(&event, json)?;
                    if !json {
                        println!("Done!");
                        if let Some(url) = &launch.back_url {
                            println!("{}: {url}", launch.back_label);
                        }
                    }
                    break;
                }
            }
            _ = &mut ctrl_c => {
                if let Some(event) = session.cancel() {
                    emit_event(&event, json)?;
                }
                if !json {
                    println!("Cancelled.");
                }
                break;
            }
        }
    }
    Ok(())
}

/// A malformed `--pattern` falls back to 4-2-4, the same as `pattern=` in
/// launch parameters and in the config file.
fn pattern_or_default(input: &str) -> BreathingPattern {
    input.parse().unwrap_or_else(|err| {
        eprintln!("warning: {err}; using {}", BreathingPattern::default());
        BreathingPattern::default()
    })
}

/// Only redraw when the whole-second countdown or the phase moves.
fn changed(prev: Option<&SessionSnapshot>, next: &SessionSnapshot) -> bool {
    match prev {
        Some(prev) => prev.remaining_secs != next.remaining_secs || prev.phase != next.phase,
        None => true,
    }
}

fn render(snapshot: &SessionSnapshot, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }
    const WIDTH: usize = 20;
    let filled = ((snapshot.progress * WIDTH as f64).round() as usize).min(WIDTH);
    println!(
        "{:>5}s  {:<12} [{}{}]",
        snapshot.remaining_secs,
        snapshot.phase.instruction(),
        "#".repeat(filled),
        ".".repeat(WIDTH - filled)
    );
    Ok(())
}

fn emit_event(event: &Event, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
