use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use workbackwards_core::{local_now, Config, Event, SessionState, Ticker};

use super::{open_controller, print_events, Controller};

const PROMPT: &str = "Session over. Did it go well? Answer with `workbackwards session yes|no`.";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let now = local_now();
    let mut controller = open_controller(&config, now)?;
    print_events(&controller.initialize(now)?)?;
    // First poll sets the baseline for fired-notification detection.
    controller.poll_fired(now);

    let shared = Arc::new(Mutex::new(controller));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut ticker = Ticker::new();
        let tick_target = Arc::clone(&shared);
        let mut output_closed = false;
        ticker.start(config.tick_interval(), move || {
            let Ok(mut controller) = tick_target.lock() else {
                tracing::warn!("controller lock poisoned, skipping tick");
                return;
            };
            let lines = tick(&mut controller);
            if output_closed {
                return;
            }
            if let Err(e) = write_lines(&lines) {
                // Keep ticking so transitions are still persisted.
                tracing::warn!(error = %e, "stdout unavailable, output disabled");
                output_closed = true;
            }
        });

        tokio::signal::ctrl_c().await?;
        ticker.shutdown().await;
        println!();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// One tick of the watch loop. Returns the lines to show, the countdown last.
fn tick(controller: &mut Controller) -> Vec<String> {
    let now = local_now();
    // Pick up outcomes and settings saved by other commands meanwhile.
    controller.reload();
    let mut events = controller.tick(now);
    events.extend(controller.poll_fired(now));

    let mut lines: Vec<String> = events.iter().filter_map(describe).collect();
    lines.push(match controller.countdown(now) {
        Some(countdown) => format!("{} {countdown}", countdown.label()),
        None => "Sessions not running".to_string(),
    });
    lines
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::NotificationFired { title, body, .. } => Some(format!("{title}: {body}")),
        Event::StateChanged {
            to: SessionState::PostSession { .. },
            ..
        } => Some(PROMPT.to_string()),
        other => match serde_json::to_string(other) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode event");
                None
            }
        },
    }
}

/// Events on their own lines; the countdown rewrites the current line.
fn write_lines(lines: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if let Some((countdown, events)) = lines.split_last() {
        for line in events {
            writeln!(out, "\r{line}")?;
        }
        write!(out, "\r{countdown}    ")?;
    }
    out.flush()
}
