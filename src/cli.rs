use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Rename images after short titles generated by Gemini.
///
/// Every `.png`, `.jpg`, `.jpeg` and `.webp` file in DIRECTORY that does not
/// already contain `_DESC` is renamed to `<Title>_DESC<ext>`. Files the batch
/// requests could not handle are retried one at a time and restored to their
/// original name if that fails too.
#[derive(Debug, Parser)]
#[command(name = "retitle", version, about)]
pub struct Cli {
    /// Folder of images to rename [default: the saved folder, else the
    /// working directory].
    pub directory: Option<PathBuf>,

    /// Gemini API key [default: the saved key, $GEMINI_API_KEY or
    /// $RETITLE_API_KEY].
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model to request titles from.
    #[arg(long)]
    pub model: Option<String>,

    /// Images per batch request.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub batch_size: Option<u16>,

    /// Do not pause between batches.
    #[arg(long)]
    pub no_pause: bool,

    /// Settings file to read (and update).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not write the API key and folder back to the settings file.
    #[arg(long)]
    pub no_save: bool,

    /// More logging (repeatable).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less logging (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (_, 0) => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from(["retitle", "/photos", "--batch-size", "4", "--no-pause", "-v"]).unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("/photos")));
        assert_eq!(cli.batch_size, Some(4));
        assert!(cli.no_pause);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(Cli::try_parse_from(["retitle", "--batch-size", "0"]).is_err());
    }

    #[rstest]
    #[case(&["retitle"], "info")]
    #[case(&["retitle", "-vv"], "trace")]
    #[case(&["retitle", "-q"], "warn")]
    #[case(&["retitle", "-qq"], "error")]
    fn test_log_level(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(Cli::try_parse_from(args).unwrap().log_level(), expected);
    }
}
