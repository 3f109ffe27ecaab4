use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

/// Where resources come from and how they are downloaded, before the config
/// file has been merged in.
#[derive(Debug, Clone, Default)]
pub struct SourceSpec {
    pub config_path: Option<String>,
    pub urls: Vec<String>,
    pub hashes: Vec<String>,
    pub staging_dir: Option<String>,
    pub extracted_dir: Option<String>,
    pub max_concurrency_per_host: Option<usize>,
    pub max_retries: Option<usize>,
    pub download_parallelism: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Fetch {
        source: SourceSpec,
    },
    Sync {
        source: SourceSpec,
        report_path: Option<String>,
    },
    Decompress {
        paths: Vec<String>,
        output_dir: Option<String>,
    },
    Column {
        csv_path: String,
        pattern: String,
    },
    Hash {
        paths: Vec<String>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "dbfetch",
    version,
    about = "Download, verify and decompress model files into a local dataset"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, clap::Args)]
struct SourceArgs {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Config file listing resources, approved hashes and directories"
    )]
    config: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help = "Resource to fetch (repeatable, added after the config resources)",
        action = ArgAction::Append
    )]
    urls: Vec<String>,

    #[arg(
        long = "hash",
        value_name = "MD5",
        help = "Approved MD5 content hash (repeat or use comma-separated values)",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    hashes: Vec<String>,

    #[arg(
        short = 's',
        long = "staging-dir",
        value_name = "DIR",
        help = "Directory downloads land in (overrides staging_dir)"
    )]
    staging_dir: Option<String>,

    #[arg(
        short = 'o',
        long = "output-dir",
        visible_alias = "extracted-dir",
        value_name = "DIR",
        help = "Directory holding decompressed files (default: <staging-dir>/unzipped)"
    )]
    extracted_dir: Option<String>,

    #[arg(
        long = "max-concurrency-per-host",
        value_name = "N",
        help = "Maximum concurrent HTTP requests per host"
    )]
    max_concurrency_per_host: Option<usize>,

    #[arg(
        long = "max-retries",
        value_name = "N",
        help = "Maximum retry attempts for transient download failures"
    )]
    max_retries: Option<usize>,

    #[arg(
        long = "download-parallelism",
        value_name = "N",
        help = "Maximum number of simultaneous downloads"
    )]
    download_parallelism: Option<usize>,

    #[arg(
        long = "timeout-secs",
        value_name = "SECONDS",
        help = "Timeout for a single download"
    )]
    timeout_secs: Option<u64>,
}

impl From<SourceArgs> for SourceSpec {
    fn from(args: SourceArgs) -> Self {
        Self {
            config_path: args.config,
            urls: args.urls,
            hashes: args.hashes,
            staging_dir: args.staging_dir,
            extracted_dir: args.extracted_dir,
            max_concurrency_per_host: args.max_concurrency_per_host,
            max_retries: args.max_retries,
            download_parallelism: args.download_parallelism,
            timeout_secs: args.timeout_secs,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download resources that are missing or do not match an approved hash
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Fetch resources, then decompress every gzip payload
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            short = 'r',
            long = "report",
            value_name = "FILE",
            help = "Writes a JSON report of the run"
        )]
        report: Option<String>,
    },

    /// Decompress gzip files, passing other files through
    Decompress {
        #[arg(
            short = 'p',
            long = "path",
            value_name = "FILE",
            help = "File to process (repeatable)",
            action = ArgAction::Append,
            required = true
        )]
        paths: Vec<String>,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Output directory (default: unzipped/ next to the first file)"
        )]
        output_dir: Option<String>,
    },

    /// Print the CSV column whose header starts with a pattern
    Column {
        #[arg(long = "csv", value_name = "FILE", help = "CSV file to scan")]
        csv: String,

        #[arg(
            short = 'p',
            long = "pattern",
            value_name = "PREFIX",
            help = "Header prefix selecting the column"
        )]
        pattern: String,
    },

    /// Print the MD5 content hash of files
    Hash {
        #[arg(
            short = 'p',
            long = "path",
            value_name = "FILE",
            help = "File to hash (repeatable)",
            action = ArgAction::Append,
            required = true
        )]
        paths: Vec<String>,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap()),
        )
        .init();

    let command = match cli.command {
        CliCommand::Fetch { source } => Command::Fetch {
            source: source.into(),
        },
        CliCommand::Sync { source, report } => Command::Sync {
            source: source.into(),
            report_path: report,
        },
        CliCommand::Decompress { paths, output_dir } => Command::Decompress { paths, output_dir },
        CliCommand::Column { csv, pattern } => Command::Column {
            csv_path: csv,
            pattern,
        },
        CliCommand::Hash { paths } => Command::Hash { paths },
    };

    Args { command, log_level }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_arguments() {
        let cli = Cli::try_parse_from([
            "dbfetch",
            "-vv",
            "sync",
            "--url",
            "https://example.com/a.gz",
            "--url",
            "https://example.com/b.obj",
            "--hash",
            "aaa,bbb",
            "--staging-dir",
            "temp",
            "--report",
            "report.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let CliCommand::Sync { source, report } = cli.command else {
            panic!("expected sync command");
        };
        assert_eq!(source.urls.len(), 2);
        assert_eq!(source.hashes, vec!["aaa", "bbb"]);
        assert_eq!(source.staging_dir.as_deref(), Some("temp"));
        assert_eq!(report.as_deref(), Some("report.json"));
    }

    #[test]
    fn test_decompress_requires_a_path() {
        assert!(Cli::try_parse_from(["dbfetch", "decompress"]).is_err());
    }
}
