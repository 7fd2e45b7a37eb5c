use anyhow::{anyhow, Context, Result};
use cli::{Cli, ConfigArgs, RenderArgs};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;

mod cli;
mod config;
mod error;
mod highlight;
mod history;
mod locale;
mod render;
mod sinks;
mod source;
#[cfg(test)]
mod test_log;

fn main() -> ExitCode {
    use clap::Parser;
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose);
    log::debug!("CLI args parsed: {cli:?}");

    if let Err(e) = try_main(cli) {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn try_main(cli: Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Config(args) => write_config(args),
        cli::Commands::Render(args) => render(args, cli.quiet),
    }
}

fn write_config(args: &ConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists, pass --force to overwrite it",
            args.path.display()
        ));
    }
    let contents = config::RenderOptions::default().to_toml()?;
    std::fs::write(&args.path, contents)
        .with_context(|| format!("Failed to write {}", args.path.display()))?;
    println!("Wrote default options to {}", args.path.display());
    Ok(())
}

fn render(args: &RenderArgs, quiet: bool) -> Result<()> {
    let options = args.options()?;

    let mut progress = if options.show_progress && !quiet {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .with_context(|| "Failed to parse progress style")?
                .progress_chars("#>-"),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    render::convert(&args.source, &args.output, &options, &mut progress)
        .with_context(|| format!("Failed to render {}", args.source))?;
    progress.finish_and_clear();

    if !quiet {
        println!("  PDF: {}", args.output.display());
    }
    Ok(())
}
