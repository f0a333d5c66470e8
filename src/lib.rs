/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// External tool execution
mod exec;
/// Filesystem operations
mod fs;
/// Command-line settings with defaults and validation applied
mod settings;
/// Pipeline stages
mod stages;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::{Args, Command, TreeArgs};
pub use settings::{Settings, Stage};
pub use stages::{BatchReport, UnitStatus};

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    let log_level = match settings.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);

    // RUN THE THING /////////////////
    let app = App::new(settings);
    let reports = app.run()?;

    for report in &reports {
        report.print_recap();
    }
    app::Error::check(&reports)?;

    Ok(())
}
