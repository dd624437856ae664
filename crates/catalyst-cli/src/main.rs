use catalyst::AnalysisResponse;
use catalyst::render::{LayoutOptions, SvgRenderOptions, layout_graph, render_graph_svg};
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Analysis(catalyst::Error),
    Render(catalyst::render::HeadlessError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Analysis(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<catalyst::Error> for CliError {
    fn from(value: catalyst::Error) -> Self {
        Self::Analysis(value)
    }
}

impl From<catalyst::render::HeadlessError> for CliError {
    fn from(value: catalyst::render::HeadlessError) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Parse,
    Layout,
    Render,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    seed: Option<u64>,
    width: f64,
    height: f64,
    legend: bool,
    out: Option<String>,
}

fn usage() -> &'static str {
    "catalyst-cli\n\
\n\
USAGE:\n\
  catalyst-cli [parse] [--pretty] [<path>|-]\n\
  catalyst-cli layout [--pretty] [--seed <n>] [--width <w>] [--height <h>] [<path>|-]\n\
  catalyst-cli render [--seed <n>] [--width <w>] [--height <h>] [--legend] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the analysis response JSON is read from stdin.\n\
  - parse validates the response and prints the normalized model.\n\
  - layout prints converged node positions as JSON.\n\
  - render prints a standalone SVG to stdout by default; use --out to write a file.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        command: Command::Parse,
        width: 800.0,
        height: 600.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "parse" => args.command = Command::Parse,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--legend" => args.legend = true,
            "--seed" => {
                let Some(seed) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.width.is_finite() && args.width > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.height = h.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.height.is_finite() && args.height > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => Ok(std::fs::write(path, text)?),
    }
}

fn layout_options(args: &Args) -> LayoutOptions {
    let mut options = LayoutOptions {
        width: args.width,
        height: args.height,
        ..Default::default()
    };
    if let Some(seed) = args.seed {
        options.session.random_seed = seed;
    }
    options
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let response = AnalysisResponse::from_json(&text)?;

    match args.command {
        Command::Parse => {
            write_json(&response, args.pretty)?;
            Ok(())
        }
        Command::Layout => {
            let layout = layout_graph(&response, &layout_options(&args))
                .map_err(catalyst::render::HeadlessError::from)?;
            write_json(&layout, args.pretty)?;
            Ok(())
        }
        Command::Render => {
            let layout = layout_graph(&response, &layout_options(&args))
                .map_err(catalyst::render::HeadlessError::from)?;
            let svg_options = SvgRenderOptions {
                include_legend: args.legend,
                ..Default::default()
            };
            let svg = render_graph_svg(&layout, &svg_options);
            write_text(&svg, args.out.as_deref())?;
            Ok(())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
