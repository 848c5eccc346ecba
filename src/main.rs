use std::io::{self, Write};
use std::path::PathBuf;

use hifz::{
    catalog::Catalog,
    cli::Cli,
    config::Config,
    dump::dump_route,
    logging::{self, LogLevel},
    queue::AudioSource,
    route::Route,
    ui::app::App,
};

use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path.clone())?,
        None => match Config::new() {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Warning: Could not load configuration: {}", err);
                eprintln!("Starting with default settings");
                Config::unsaved_defaults()
            }
        },
    };

    let log_file = config.settings.log_file.as_ref().map(PathBuf::from);
    logging::init(LogLevel::from_flags(cli.verbose, cli.debug), log_file.as_deref())?;

    let route = match &cli.route {
        Some(input) => Route::parse(input)?,
        None => Route::default(),
    };
    let catalog = Catalog::load()?;

    if cli.dump {
        let source = AudioSource::from_settings(&config.settings);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        dump_route(&route, &catalog, &source, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    let mut app = App::new(config, catalog, route)?;
    app.run()
}
