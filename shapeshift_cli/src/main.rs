use shapeshift_core::config::ShapeshiftConfig;
use shapeshift_core::engine::VariantEngine;
use shapeshift_core::input::{InputError, PayloadReader, read_payloads};
use shapeshift_core::output::{OutputFormat, open_sink, write_records};
use shapeshift_core::registry::TechniqueRegistry;
use shapeshift_core::techniques;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DISCLAIMER: &str = "\
===========================================================================
  DISCLAIMER: This tool generates obfuscated payloads for AUTHORIZED
  security testing and research purposes ONLY. Misuse of this tool for
  unauthorized access or malicious activity is illegal and unethical.
  The authors accept no liability for misuse.
===========================================================================";

/// Loaded from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "shapeshift.toml";

/// Input path meaning standard input.
const STDIN_PATH: &str = "-";

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Generate obfuscated variants of security test payloads",
    long_about = None
)]
struct Cli {
    /// Input file path, one payload per line ("-" for stdin)
    #[clap(short, long, required_unless_present = "list_techniques")]
    input: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Variants per payload, 1-20 (default: 5)
    #[clap(short, long)]
    multiplier: Option<u32>,

    /// Output format: text or json (default: text)
    #[clap(short, long)]
    format: Option<OutputFormat>,

    /// Techniques to use (default: all)
    #[clap(short, long, num_args = 1.., value_delimiter = ',')]
    techniques: Option<Vec<String>>,

    /// Include the original payload in the output
    #[clap(short, long)]
    preserve: bool,

    /// Enable verbose logging
    #[clap(short, long)]
    verbose: bool,

    /// Seed for reproducible output
    #[clap(long)]
    seed: Option<u64>,

    /// Retry budget per payload, as a multiple of the multiplier (default: 3)
    #[clap(long)]
    retry_factor: Option<u32>,

    /// TOML configuration file
    #[clap(long, value_parser)]
    config: Option<PathBuf>,

    /// Print every available technique and its category, then exit
    #[clap(long)]
    list_techniques: bool,
}

impl Cli {
    /// Parses the command line with the available technique names in the help text.
    fn parse_with_technique_help() -> Self {
        let command = Cli::command().after_help(technique_help());
        Cli::from_arg_matches(&command.get_matches()).unwrap_or_else(|e| e.exit())
    }

    /// Command-line flags win over the configuration file.
    fn apply_overrides(&self, config: &mut ShapeshiftConfig) {
        if let Some(multiplier) = self.multiplier {
            config.engine.multiplier = multiplier;
        }
        if let Some(techniques) = &self.techniques {
            config.engine.techniques = Some(techniques.clone());
        }
        if self.preserve {
            config.engine.preserve_original = true;
        }
        if let Some(retry_factor) = self.retry_factor {
            config.engine.retry_factor = retry_factor;
        }
        if let Some(seed) = self.seed {
            config.engine.seed = Some(seed);
        }
        if self.verbose {
            config.engine.verbose = true;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(path) = &self.output {
            config.output.path = Some(path.clone());
        }
    }
}

/// Help epilogue: the technique names, sorted, then the disclaimer.
fn technique_help() -> String {
    let mut names: Vec<String> = techniques::builtin()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    names.sort();
    format!(
        "Available techniques: {}\n\n{DISCLAIMER}",
        names.join(", ")
    )
}

/// Returns the effective file configuration and the path it came from, if any.
fn load_config(path: Option<&Path>) -> anyhow::Result<(ShapeshiftConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let config = ShapeshiftConfig::load_from_file(path)
                .with_context(|| format!("Invalid configuration file {path:?}"))?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                let config = ShapeshiftConfig::load_from_file(&default_path)
                    .with_context(|| format!("Invalid configuration file {default_path:?}"))?;
                Ok((config, Some(default_path)))
            } else {
                Ok((ShapeshiftConfig::default(), None))
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

type PayloadSource = Box<dyn Iterator<Item = Result<String, InputError>>>;

fn open_payloads(path: &Path) -> anyhow::Result<PayloadSource> {
    if path.as_os_str() == STDIN_PATH {
        debug!("Reading payloads from stdin");
        return Ok(Box::new(PayloadReader::new(io::stdin().lock())));
    }
    let reader = read_payloads(path).with_context(|| format!("Cannot read input {path:?}"))?;
    Ok(Box::new(reader))
}

/// Writes `name<TAB>category` for every technique, sorted by name.
fn list_techniques<W: Write>(registry: &TechniqueRegistry, out: &mut W) -> io::Result<()> {
    let mut all = registry.all();
    all.sort_by(|a, b| a.name().cmp(b.name()));
    for technique in all {
        writeln!(out, "{}\t{}", technique.name(), technique.category())?;
    }
    out.flush()
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse_with_technique_help();

    eprintln!("{DISCLAIMER}\n");

    let registry = TechniqueRegistry::with_builtin().context("Failed to register techniques")?;
    if cli.list_techniques {
        list_techniques(&registry, &mut io::stdout().lock())
            .context("Failed to write technique list")?;
        return Ok(());
    }

    let (mut config, config_path) = load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    init_tracing(config.engine.verbose);
    match &config_path {
        Some(path) => info!("Loaded configuration from {path:?}"),
        None => debug!("No configuration file found, using built-in defaults"),
    }

    let seed = config.engine.seed.unwrap_or_else(rand::random);
    debug!("Using RNG seed {seed}");
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine = VariantEngine::new(&registry, &config.engine, rng)
        .context("Invalid engine configuration")?;

    let input = cli
        .input
        .as_deref()
        .context("An input path is required")?;
    let payloads = open_payloads(input)?;
    let mut sink = open_sink(config.output.path.as_deref()).context("Cannot open output")?;

    let start_time = Instant::now();
    let mut read_error = None;
    let payloads = payloads.map_while(|line| match line {
        Ok(payload) => Some(payload),
        Err(e) => {
            read_error = Some(e);
            None
        }
    });
    let written = write_records(
        config.output.format,
        engine.process_stream(payloads),
        &mut sink,
    )
    .context("Failed to write output")?;

    if let Some(e) = read_error {
        return Err(anyhow::Error::new(e)
            .context(format!("Input stopped after {written} variants")));
    }

    info!(
        "Completed in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shapeshift").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn input_is_required_unless_listing() {
        assert!(Cli::try_parse_from(["shapeshift"]).is_err());
        assert!(Cli::try_parse_from(["shapeshift", "--list-techniques"]).is_ok());
    }

    #[test]
    fn techniques_accept_spaces_and_commas() {
        let cli = parse(&["-i", "in.txt", "-t", "base64", "hex_encode,url_encode"]);
        assert_eq!(
            cli.techniques,
            Some(vec![
                "base64".to_string(),
                "hex_encode".to_string(),
                "url_encode".to_string()
            ])
        );
    }

    #[test]
    fn format_flag_is_case_insensitive_and_validated() {
        let cli = parse(&["-i", "in.txt", "-f", "JSON"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(Cli::try_parse_from(["shapeshift", "-i", "in.txt", "-f", "xml"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[engine]\nmultiplier = 8\nseed = 1\nretry-factor = 4\n\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let (mut config, source) = load_config(Some(file.path())).unwrap();
        assert_eq!(source.as_deref(), Some(file.path()));

        let cli = parse(&["-i", "in.txt", "-m", "3", "-p", "-o", "out.txt", "--seed", "9"]);
        cli.apply_overrides(&mut config);

        assert_eq!(config.engine.multiplier, 3);
        assert_eq!(config.engine.seed, Some(9));
        assert_eq!(config.engine.retry_factor, 4, "unset flags keep file values");
        assert!(config.engine.preserve_original);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.path, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/shapeshift.toml"))).is_err());
    }

    #[test]
    fn open_payloads_reads_file_and_rejects_missing() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"one\n# comment\ntwo\n").unwrap();
        let payloads: Vec<String> = open_payloads(file.path())
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(payloads, vec!["one", "two"]);
        assert!(open_payloads(Path::new("/nonexistent/payloads.txt")).is_err());
    }

    #[test]
    fn help_lists_technique_names_sorted() {
        let help = technique_help();
        let line = help
            .lines()
            .next()
            .and_then(|l| l.strip_prefix("Available techniques: "))
            .expect("help starts with the technique list");
        let names: Vec<&str> = line.split(", ").collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names.len(), 19);
        assert_eq!(names, sorted);
        assert!(help.contains("DISCLAIMER"));
    }

    #[test]
    fn listing_needs_no_config_file() {
        let cli = parse(&["--list-techniques", "--config", "/nonexistent/shapeshift.toml"]);
        assert!(cli.list_techniques);
        assert!(load_config(cli.config.as_deref()).is_err());

        let registry = TechniqueRegistry::with_builtin().unwrap();
        let mut out = Vec::new();
        list_techniques(&registry, &mut out).unwrap();
        let listing = String::from_utf8(out).unwrap();
        let names: Vec<&str> = listing
            .lines()
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(names.len(), 19);
        assert_eq!(names, registry.names());
        assert!(listing.lines().any(|l| l == "base64\tencoding"));
    }
}
