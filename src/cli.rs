use crate::downloader::{DEFAULT_IMAGE_COUNT, DEFAULT_MARKET};
use crate::logger::DEFAULT_LOG_FILE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Downloads the Bing Image of the Day archive", long_about = None)]
pub struct Cli {
    /// Number of past days to fetch, starting from today
    #[arg(short = 'n', long, default_value_t = DEFAULT_IMAGE_COUNT)]
    pub count: usize,

    /// Output directory for downloaded images (defaults to the pictures folder)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Market code sent to the archive
    #[arg(short, long, default_value = DEFAULT_MARKET)]
    pub market: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Status log file; the rotated copy gets a .bak suffix
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Only write status lines to the log file
    #[arg(short, long)]
    pub quiet: bool,

    /// Seconds to wait before exiting
    #[arg(long, default_value = "0")]
    pub exit_delay: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_keeps_fixed_batch() {
        let cli = Cli::parse_from(["bing-iod"]);
        assert_eq!(cli.count, 8);
        assert_eq!(cli.output_dir, None);
        assert_eq!(cli.market, "en-US");
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.log_file, PathBuf::from("bing_iod.log"));
        assert_eq!(cli.exit_delay, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from(["bing-iod", "-n", "3", "-o", "/tmp/walls", "--market", "de-DE"]);
        assert_eq!(cli.count, 3);
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/walls")));
        assert_eq!(cli.market, "de-DE");
    }
}
