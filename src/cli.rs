use crate::arrange::{Arrangement, arrange_diagram};
use crate::config::{Config, load_config};
use crate::geometry::SnapshotGeometry;
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parser::parse_diagram;
use crate::render::{Scene, render_svg, write_output_png, write_output_svg};
use crate::settle_layout;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fishbone", version, about = "Ishikawa (fishbone) diagram layout and renderer")]
pub struct Args {
    /// Input file (diagram JSON/JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5: theme, themeVariables, engine, panels)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Treat the input as a measured geometry snapshot instead of a diagram
    #[arg(long = "geometry")]
    pub geometry: bool,

    /// Upper bound on recompute passes while the layout settles
    #[arg(long = "max-passes", default_value_t = 8)]
    pub max_passes: usize,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,

    /// Log layout passes to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let (geometry, arrangement, title) = if args.geometry {
        let geometry: SnapshotGeometry =
            serde_json::from_str(&input).context("invalid geometry snapshot")?;
        (geometry, None, None)
    } else {
        let diagram = parse_diagram(&input)?;
        let arrangement = arrange_diagram(&diagram, &config.theme, &config.panels);
        (arrangement.geometry(), Some(arrangement), diagram.title)
    };

    let (settled, layout) = settle_layout(geometry, &config.engine, args.max_passes);
    tracing::info!(
        connectors = layout.connectors.len(),
        revision = layout.revision,
        "layout computed"
    );

    match args.output_format {
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout, &settled)?,
            None => println!("{}", layout_dump_json(&layout, &settled)?),
        },
        OutputFormat::Svg => {
            let svg = render(&config, &settled, arrangement.as_ref(), title.as_deref(), &layout);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render(&config, &settled, arrangement.as_ref(), title.as_deref(), &layout);
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn render(
    config: &Config,
    geometry: &SnapshotGeometry,
    arrangement: Option<&Arrangement>,
    title: Option<&str>,
    layout: &crate::layout::FishboneLayout,
) -> String {
    let scene = Scene {
        geometry,
        arrangement,
        title,
    };
    render_svg(&scene, layout, &config.theme, &config.panels)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "fishbone",
            "-i",
            "case.json",
            "-e",
            "json",
            "--geometry",
            "--max-passes",
            "3",
        ])
        .expect("args");
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.geometry);
        assert_eq!(args.max_passes, 3);
        assert_eq!(args.input.as_deref(), Some(Path::new("case.json")));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert!(ensure_output(&Some(PathBuf::from("out.png")), "png").is_ok());
    }
}
