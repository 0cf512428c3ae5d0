//! Nine-slice editor
//!
//! Defines margin insets on a source image and previews how it stretches at
//! arbitrary output sizes, either in a wgpu window or as a CPU-rendered PNG.

use clap::Parser;

mod args;
mod input;
mod ops;
mod panel;
mod render;
mod window;

use args::{Cli, Commands};

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = ops::resolve_settings(&cli)?;
    let source = ops::load_source(cli.image.as_deref())?;

    match cli.command.clone().unwrap_or(Commands::Window) {
        Commands::Window => window::run(settings, source),
        Commands::Snapshot {
            output,
            canvas_width,
            canvas_height,
        } => ops::snapshot(&settings, &source, &output, (canvas_width, canvas_height)),
        Commands::Dump { pretty } => {
            println!("{}", ops::dump(&settings, &source, pretty)?);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(cli.log_level)
        // wgpu is chatty at info; keep it to warnings unless asked.
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("wgpu_hal", log::LevelFilter::Warn)
        .filter_module("naga", log::LevelFilter::Warn)
        .init();

    run(cli)
}
