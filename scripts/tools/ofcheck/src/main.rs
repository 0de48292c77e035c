use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use codec::{ProtocolVersion, ValidatorConfig, ValidatorSet, VersionValidators};
use colored::Colorize;
use std::error::Error;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod input;

#[derive(Parser)]
#[command(name = "ofcheck")]
#[command(about = "Structural validation for OpenFlow messages")]
#[command(version)]
struct Cli {
    /// Schema document (TOML or JSON); the bundled OpenFlow schema by default
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Validator config file (TOML); OFVAL_* environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one message
    Check(CheckArgs),
    /// Print generated validation plans
    Plans {
        /// Only this wire version (1-4)
        #[arg(short, long)]
        version: Option<u8>,
        /// Only this class
        #[arg(short, long)]
        class: Option<String>,
    },
    /// List classes present at a version
    Classes {
        /// Only this wire version (1-4)
        #[arg(short, long)]
        version: Option<u8>,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Message as hex
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    hex: Option<String>,
    /// Read the message from a file (raw bytes, or hex text if it ends in .hex)
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Asserted length; the buffer length by default
    #[arg(short, long)]
    len: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ofcheck=info,codec=warn,schema=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Check(args) => check(&config, args),
        Commands::Plans { version, class } => plans(&config, version, class.as_deref()),
        Commands::Classes { version } => classes(&config, version),
    }
}

fn load_config(cli: &Cli) -> Result<ValidatorConfig> {
    let mut config = match &cli.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidatorConfig::from_env(),
    };
    if let Some(schema) = &cli.schema {
        config.schema_path = Some(schema.clone());
    }
    debug!(?config, "validator config");
    Ok(config)
}

fn build(config: &ValidatorConfig) -> Result<ValidatorSet> {
    ValidatorSet::from_config(config).context("generating validators")
}

fn parse_version(byte: u8) -> Result<ProtocolVersion> {
    ProtocolVersion::try_from(byte).map_err(|_| anyhow!("unknown protocol version {byte}"))
}

/// Requested versions that were assembled
fn selected(set: &ValidatorSet, version: Option<u8>) -> Result<Vec<&VersionValidators>> {
    match version {
        Some(byte) => {
            let version = parse_version(byte)?;
            let validators = set
                .version(version)
                .ok_or_else(|| anyhow!("{version} is not assembled"))?;
            Ok(vec![validators])
        }
        None => Ok(set.versions().collect()),
    }
}

fn check(config: &ValidatorConfig, args: CheckArgs) -> Result<()> {
    let msg = match (&args.hex, &args.file) {
        (_, Some(path)) => input::read_message(path)?,
        (Some(text), None) => input::parse_hex(text)?,
        (None, None) => bail!("no message given"),
    };
    let len = args.len.unwrap_or(msg.len());

    // Rejections are reported below; no need to log them twice
    let set = build(config)?.log_failures(false);
    match set.validate_message(&msg, len) {
        Ok(()) => {
            let class = describe(&set, &msg);
            println!("{} {} ({} bytes)", "✅ valid".green(), class, len);
            Ok(())
        }
        Err(err) => {
            println!("{} {}", "❌ rejected:".red(), err);
            let mut source = err.source();
            while let Some(cause) = source {
                println!("   caused by: {cause}");
                source = cause.source();
            }
            println!("   code: {}", err.code());
            bail!("message failed validation ({:?})", err.root_cause().kind())
        }
    }
}

/// Class name and version of an accepted message
fn describe(set: &ValidatorSet, msg: &[u8]) -> String {
    msg.first()
        .and_then(|&byte| ProtocolVersion::try_from(byte).ok())
        .and_then(|version| set.version(version))
        .and_then(|validators| {
            validators
                .dispatch()
                .resolve(msg)
                .map(|class| format!("{} {}", validators.schema().name(class), validators.version()))
        })
        .unwrap_or_default()
}

fn plans(config: &ValidatorConfig, version: Option<u8>, class: Option<&str>) -> Result<()> {
    let set = build(config)?;
    for validators in selected(&set, version)? {
        match class {
            Some(name) => match validators.plan_named(name) {
                Some(plan) => print!("{plan}"),
                None => println!("{}: no validator for {name}", validators.version()),
            },
            None => println!("{}", validators.listing()),
        }
    }
    Ok(())
}

fn classes(config: &ValidatorConfig, version: Option<u8>) -> Result<()> {
    let set = build(config)?;
    let schema = set.schema();
    for validators in selected(&set, version)? {
        let version = validators.version();
        println!("{}", format!("{version}").bold());
        for class in schema.classes().filter(|c| c.in_version(version)) {
            let kind = if class.is_abstract {
                "abstract"
            } else if class.is_list() {
                "list"
            } else if schema.is_message(class.id) {
                "message"
            } else {
                "object"
            };
            let base = class.base_length(version).unwrap_or_default();
            println!("  {:<48} {:<8} base {}", class.name, kind, base);
        }
    }
    Ok(())
}
