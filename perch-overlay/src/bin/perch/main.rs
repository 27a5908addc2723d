//! Entry point for the perch binary.

mod args;
mod tracing_setup;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use perch_overlay::perch_core::{
    auto_position, compute_placement, score_candidates, CloseReason, OverlayCoordinator,
    OverlayEvent,
};
use perch_overlay::{EventBus, PerchConfig};
use serde::Serialize;

use crate::args::{Cli, Command, OverlayArg};

#[allow(clippy::print_stderr)]
fn load_config(cli: &Cli) -> Result<PerchConfig> {
    if let Some(path) = &cli.config {
        return PerchConfig::load_from(path);
    }
    Ok(PerchConfig::load_default().unwrap_or_else(|err| {
        eprintln!("Warning: failed to load perch.toml: {err:#}");
        eprintln!("Using default configuration");
        PerchConfig::default()
    }))
}

#[allow(clippy::print_stdout)]
fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Open each overlay in turn, confirming it before the next one, and collect
/// every notification the coordinator publishes.
fn simulate_stack(config: &PerchConfig, overlays: &[OverlayArg]) -> Result<Vec<OverlayEvent>> {
    let mut coordinator = OverlayCoordinator::new(config.layers);
    let mut bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    bus.subscribe(move |event| sink.lock().push(event.clone()));

    for overlay in overlays {
        let record =
            coordinator.request_open(overlay.id.as_str(), overlay.layer, overlay.priority)?;
        coordinator.confirm_opened(&record.id)?;
        for event in coordinator.drain_events() {
            bus.emit(&event);
        }
    }

    // Tear down from the top of the stack. Overlays excluded earlier already
    // have their close request outstanding.
    let mut open: Vec<_> = coordinator
        .list_open(None)
        .into_iter()
        .map(|record| record.id.clone())
        .collect();
    open.reverse();
    for top in open {
        coordinator.request_close(&top, CloseReason::Escape)?;
        coordinator.confirm_closing(&top)?;
        coordinator.confirm_closed(&top)?;
        for event in coordinator.drain_events() {
            bus.emit(&event);
        }
    }

    let events = std::mem::take(&mut *log.lock());
    Ok(events)
}

#[allow(clippy::print_stdout)]
fn run(cli: Cli, config: &PerchConfig) -> Result<()> {
    match cli.command {
        Command::Place {
            geometry,
            placement,
        } => {
            let options = geometry.options(&config.positioning);
            let result = compute_placement(
                &geometry.trigger,
                &geometry.content,
                placement,
                &options,
                &geometry.viewport(),
            )?;
            print_json(&result)
        }
        Command::Auto {
            geometry,
            candidates,
            scores,
        } => {
            let options = geometry.options(&config.positioning);
            let candidates = if candidates.is_empty() {
                options.preferred_placements.clone()
            } else {
                candidates
            };
            let viewport = geometry.viewport();
            let result = auto_position(
                &geometry.trigger,
                &geometry.content,
                &candidates,
                &options,
                &viewport,
            )?;
            if scores {
                let scored: Vec<serde_json::Value> = score_candidates(
                    &geometry.trigger,
                    &geometry.content,
                    &candidates,
                    &options,
                    &viewport,
                )?
                .into_iter()
                .map(|(placement, ratio)| {
                    serde_json::json!({ "placement": placement, "ratio": ratio })
                })
                .collect();
                print_json(&serde_json::json!({ "result": result, "scores": scored }))
            } else {
                print_json(&result)
            }
        }
        Command::Tokens => {
            println!("{}", config.z_index_css());
            Ok(())
        }
        Command::Stack { overlays } => print_json(&simulate_stack(config, &overlays)?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_setup::init(&config.logging);
    log::debug!("starting perch");

    run(cli, &config)
}

#[cfg(test)]
mod tests {
    use perch_overlay::perch_core::{LayerType, OverlayId};

    use super::*;

    fn overlay(layer: LayerType, id: &str, priority: i32) -> OverlayArg {
        OverlayArg {
            layer,
            id: id.to_string(),
            priority,
        }
    }

    #[test]
    fn stack_simulation_reports_exclusions_and_teardown() {
        let events = simulate_stack(
            &PerchConfig::default(),
            &[
                overlay(LayerType::Portal, "menu", 0),
                overlay(LayerType::Modal, "settings", 10),
            ],
        )
        .expect("simulation");

        assert_eq!(
            events.get(2),
            Some(&OverlayEvent::CloseRequested {
                id: OverlayId::from("menu"),
                reason: CloseReason::Excluded {
                    by: OverlayId::from("settings"),
                },
            })
        );
        assert!(matches!(
            events.get(3),
            Some(OverlayEvent::OpenRequested { z_index: 1060, .. })
        ));
        let closed: Vec<&OverlayId> = events
            .iter()
            .filter_map(|event| match event {
                OverlayEvent::Closed { id } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(
            closed,
            [&OverlayId::from("settings"), &OverlayId::from("menu")]
        );
    }

    #[test]
    fn duplicate_ids_in_a_stack_fail() {
        let result = simulate_stack(
            &PerchConfig::default(),
            &[
                overlay(LayerType::Portal, "menu", 0),
                overlay(LayerType::Portal, "menu", 0),
            ],
        );
        assert!(result.is_err());
    }
}
