use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "hifz",
    version,
    about = "Recite and memorize the Qur'an from the terminal, verse by verse.",
    long_about = None
)]
pub struct Cli {
    /// Print the resolved route (playlist URLs or listing) and exit
    #[clap(short, long)]
    pub dump: bool,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// Route to open: /, /surah/N, /juz, /juz/N or /play?start=..&count=..
    #[clap(name = "ROUTE")]
    pub route: Option<String>,
}
