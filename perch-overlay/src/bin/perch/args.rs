//! Command-line arguments for the perch binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use perch_overlay::perch_core::{LayerType, Placement, PositionOptions, Rect, Viewport};

#[derive(Parser, Debug)]
#[command(name = "perch")]
#[command(about = "Overlay placement and stacking from the command line")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to `<config dir>/perch/perch.toml`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Place content next to a trigger, flipping when it overflows
    Place {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Preferred placement, e.g. `bottom-start`
        #[arg(long, default_value = "bottom")]
        placement: Placement,
    },
    /// Pick the most visible of several placements
    Auto {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Candidate placements (defaults to the configured preferred placements)
        #[arg(long, value_delimiter = ',')]
        candidates: Vec<Placement>,

        /// Also print the visibility score of each candidate
        #[arg(long)]
        scores: bool,
    },
    /// Print the z-index custom properties as a `<style>` block
    Tokens,
    /// Open overlays in order and print the resulting notifications
    Stack {
        /// Overlays as `layer:id` or `layer:id:priority`, e.g. `modal:settings:10`
        #[arg(required = true, value_parser = parse_overlay_arg)]
        overlays: Vec<OverlayArg>,
    },
}

#[derive(Args, Debug)]
pub struct GeometryArgs {
    /// Trigger rectangle as `x,y,width,height`
    #[arg(long, value_parser = parse_rect)]
    pub trigger: Rect,

    /// Content size as `width,height`
    #[arg(long, value_parser = parse_size)]
    pub content: Rect,

    /// Viewport size as `width,height`
    #[arg(long, value_parser = parse_size, default_value = "1024,768")]
    pub viewport: Rect,

    /// Gap between trigger and content
    #[arg(long)]
    pub offset: Option<f64>,

    /// Minimum distance from the viewport edges
    #[arg(long)]
    pub padding: Option<f64>,

    /// Keep the preferred side even when it overflows
    #[arg(long)]
    pub no_flip: bool,

    /// Do not clamp the result into the viewport
    #[arg(long)]
    pub no_constrain: bool,
}

impl GeometryArgs {
    /// Configured options with the command-line overrides applied.
    pub fn options(&self, configured: &PositionOptions) -> PositionOptions {
        let mut options = configured.clone();
        if let Some(offset) = self.offset {
            options = options.with_offset(offset);
        }
        if let Some(padding) = self.padding {
            options = options.with_padding(padding);
        }
        if self.no_flip {
            options = options.with_flip(false);
        }
        if self.no_constrain {
            options = options.with_constrain(false);
        }
        options
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }
}

#[derive(Debug, Clone)]
pub struct OverlayArg {
    pub layer: LayerType,
    pub id: String,
    pub priority: i32,
}

fn parse_numbers(value: &str, expected: usize) -> Result<Vec<f64>, String> {
    let numbers = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| format!("`{part}` is not a number: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.len() == expected {
        Ok(numbers)
    } else {
        Err(format!(
            "expected {expected} comma-separated numbers, got {}",
            numbers.len()
        ))
    }
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    match parse_numbers(value, 4)?.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err(format!("invalid rectangle `{value}`")),
    }
}

fn parse_size(value: &str) -> Result<Rect, String> {
    match parse_numbers(value, 2)?.as_slice() {
        [width, height] => Ok(Rect::new(0.0, 0.0, *width, *height)),
        _ => Err(format!("invalid size `{value}`")),
    }
}

fn parse_overlay_arg(value: &str) -> Result<OverlayArg, String> {
    let mut parts = value.split(':');
    let (Some(layer), Some(id)) = (parts.next(), parts.next()) else {
        return Err(format!("expected `layer:id[:priority]`, got `{value}`"));
    };
    let layer = LayerType::ALL
        .into_iter()
        .find(|candidate| candidate.as_str() == layer)
        .ok_or_else(|| format!("unknown layer `{layer}` (portal, backdrop or modal)"))?;
    let priority = parts
        .next()
        .map(|priority| {
            priority
                .parse::<i32>()
                .map_err(|err| format!("invalid priority `{priority}`: {err}"))
        })
        .transpose()?
        .unwrap_or(0);
    if id.is_empty() || parts.next().is_some() {
        return Err(format!("expected `layer:id[:priority]`, got `{value}`"));
    }
    Ok(OverlayArg {
        layer,
        id: id.to_string(),
        priority,
    })
}
