#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use gitlog_summary::{
    Config, DefaultClock, DefaultGitRunner, Options, Template, build_context, collect_report_data,
    config::{default_config_path, read_template_file},
    load_config,
    output::to_json,
    render_report, report_date,
};
use log::LevelFilter;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Template,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about = "Summarize a day of git activity across repositories.")]
struct Args {
    /// Repository directories (replaces `directories` from the config file)
    dirs: Vec<String>,

    /// Config file (default: <config dir>/gitlog-summary/config.toml, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only count commits by this author email
    #[arg(long)]
    author: Option<String>,

    /// Read the report template from this file
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Day to summarize, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Number of repositories scanned in parallel (default: one per CPU)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Output format: the rendered template (default) or the raw context as json
    #[arg(long, value_enum, default_value_t = OutputFormat::Template)]
    output: OutputFormat,

    /// Log every git invocation
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);
    match run(args) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: Args) -> Result<String, String> {
    let config = load_settings(args.config.as_deref())?;
    let template_text = match &args.template_file {
        Some(path) => read_template_file(path),
        None => config.template_text(),
    }
    .map_err(|e| e.to_string())?;

    let opts = Options {
        directories: if args.dirs.is_empty() {
            config.directories
        } else {
            args.dirs
        },
        author_email: args.author.or(config.author_email),
        template: template_text,
        date: args.date,
        jobs: args.jobs.map(usize::from).or(config.jobs),
    };
    if opts.directories.is_empty() {
        log::warn!("no repositories configured");
    }

    // Compile before scanning so a broken template costs no git calls.
    let template = match args.output {
        OutputFormat::Template => {
            let compiled = Template::compile(&opts.template);
            Some(compiled.map_err(|e| format!("template error: {e}"))?)
        }
        OutputFormat::Json => None,
    };

    let git = DefaultGitRunner;
    let clock = DefaultClock;
    let date = report_date(&opts, &clock);
    let data = collect_report_data(&opts, date, &git);
    let context = build_context(data, date, &clock);
    match template {
        Some(template) => render_report(&template, &context).map_err(|e| e.to_string()),
        None => to_json(&context)
            .map(|json| format!("{json}\n"))
            .map_err(|e| e.to_string()),
    }
}

/// An explicit `--config` must exist; the default location is optional.
fn load_settings(explicit: Option<&std::path::Path>) -> Result<Config, String> {
    if let Some(path) = explicit {
        return load_config(path).map_err(|e| e.to_string());
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path).map_err(|e| e.to_string()),
        _ => Ok(Config::default()),
    }
}
