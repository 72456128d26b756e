//! `domus` command-line front end.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use domus_app::{fit_svg, subprocess_engine, viewport_fitter, AppError, RunReport, Session};
use domus_io::SessionConfig;
use domus_renderer::{ClientRect, FitResult};

/// Compute and view orthogonal drawings of planar graphs.
#[derive(Parser, Debug)]
#[command(name = "domus", version, about)]
struct Cli {
    /// Session configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the engine reads input from and writes artifacts to
    #[arg(long, global = true)]
    staging: Option<PathBuf>,

    /// Directory holding the example graphs
    #[arg(long, global = true)]
    examples: Option<PathBuf>,

    /// Drawing engine executable
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the example graphs
    Examples,
    /// Stage an input, compute its drawing and save the results
    Run(RunArgs),
    /// Save an example graph unmodified
    DownloadExample {
        name: String,
        /// Destination directory
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// Fit the viewBox of an existing SVG drawing
    Fit {
        svg: PathBuf,
        /// Margin around the content, in user units
        #[arg(long)]
        padding: Option<f64>,
        /// Write the fitted drawing here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Example graph to compute
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    example: Option<String>,

    /// Graph file to upload and compute
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the fitted drawing to this file
    #[arg(long)]
    render: Option<PathBuf>,

    /// Save drawing.svg and graph.graphml into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<SessionConfig, AppError> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(staging) = &cli.staging {
        config.staging_dir = staging.clone();
    }
    if let Some(examples) = &cli.examples {
        config.examples_dir = examples.clone();
    }
    if let Some(engine) = &cli.engine {
        config.engine.program = engine.clone();
    }
    Ok(config)
}

fn write_output(path: &Path, content: &[u8]) -> Result<(), AppError> {
    fs::write(path, content).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn run(config: &SessionConfig, args: &RunArgs) -> Result<ExitCode, AppError> {
    let mut session = Session::new(config, subprocess_engine(config))?;
    match (&args.example, &args.input) {
        (Some(name), _) => session.select_example(name)?,
        (None, Some(path)) => session.upload(path)?,
        (None, None) => return Err(AppError::NoInput),
    };

    let invocation = session.compute()?;
    let mut report = RunReport::new(&invocation, session.input_label());

    if invocation.is_success() {
        session.next_frame();
        report.view_box = session.view_box().map(|vb| vb.to_string());
        if let (Some(path), Some(svg)) = (&args.render, session.rendered_svg()) {
            write_output(path, svg.as_bytes())?;
        }
        if let Some(dir) = &args.export_dir {
            report.exported = session.export_all(dir)?;
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else if invocation.is_success() {
        println!("{}", report.message);
        for path in &report.exported {
            println!("  saved {}", path.display());
        }
    }

    if invocation.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", report.message);
        Ok(ExitCode::from(2))
    }
}

fn fit(config: &SessionConfig, svg: &Path, padding: Option<f64>, output: Option<&Path>) -> Result<(), AppError> {
    let content = fs::read(svg).map_err(|e| AppError::Io {
        path: svg.to_path_buf(),
        source: e,
    })?;
    let mut fitter = viewport_fitter(config);
    if let Some(padding) = padding {
        fitter = fitter.with_padding(padding);
    }
    let client = ClientRect::new(config.viewport.client_width, config.viewport.client_height);
    let (rendered, result) = fit_svg(&content, &fitter, client)?;
    if let FitResult::Abandoned = result {
        log::warn!("{}: nothing to measure, viewBox left unchanged", svg.display());
    }

    match output {
        Some(path) => write_output(path, rendered.as_bytes()),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| AppError::Io {
                    path: PathBuf::from("<stdout>"),
                    source: e,
                })
        }
    }
}

fn execute(cli: &Cli) -> Result<ExitCode, AppError> {
    let config = load_config(cli)?;
    match &cli.command {
        Command::Examples => {
            let session = Session::new(&config, subprocess_engine(&config))?;
            for name in session.list_examples()? {
                println!("{name}");
            }
        }
        Command::Run(args) => return run(&config, args),
        Command::DownloadExample { name, dest } => {
            let session = Session::new(&config, subprocess_engine(&config))?;
            let path = session.download_example(name, dest)?;
            println!("saved {}", path.display());
        }
        Command::Fit { svg, padding, output } => fit(&config, svg, *padding, output.as_deref())?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
