mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use std::process::ExitCode;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use ypkg_core::{FormatVersion, PackageError, PackageSettings, ops};

#[derive(Debug, Parser)]
#[command(
    name = "ypkg",
    version,
    about = "Convert, bump and scaffold package.yml build recipes."
)]
struct Cli {
    /// Config file (default: ./ypkg.toml when present).
    #[arg(long, global = true, env = "YPKG_CONFIG")]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the format version a file declares.
    Detect(DetectArgs),
    /// Increment the release number.
    Bump(BumpArgs),
    /// Rewrite a file in another format version (bumps the release).
    Convert(ConvertArgs),
    /// Write a placeholder recipe to a new file.
    Init(InitArgs),
    /// Check a recipe for problems (not implemented yet).
    Lint(LintArgs),
    /// Move a recipe to a new upstream version (not implemented yet).
    Update(UpdateArgs),
    /// Generate a recipe from source archives (not implemented yet).
    Auto(AutoArgs),
}

#[derive(Debug, Parser)]
struct DetectArgs {
    path: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct BumpArgs {
    path: Utf8PathBuf,

    /// Print the diff instead of writing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ConvertArgs {
    path: Utf8PathBuf,

    /// Target format version (default: [format].convert_target, else latest).
    #[arg(long, value_parser = parse_format)]
    to: Option<FormatVersion>,

    /// Write the result here instead of in place.
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    /// Print the diff against the input instead of writing.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct InitArgs {
    #[arg(default_value = "package.yml")]
    path: Utf8PathBuf,

    /// Format version to write (default: [format].init, else 2).
    #[arg(long, value_parser = parse_format)]
    format: Option<FormatVersion>,

    /// Print the recipe instead of creating the file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct LintArgs {
    path: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct UpdateArgs {
    path: Utf8PathBuf,

    /// New upstream version.
    version: String,

    /// Source archive URIs.
    #[arg(required = true)]
    sources: Vec<String>,
}

#[derive(Debug, Parser)]
struct AutoArgs {
    /// Source archive URIs.
    #[arg(required = true)]
    sources: Vec<String>,
}

fn parse_format(s: &str) -> Result<FormatVersion, String> {
    let number: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a format version number"))?;
    FormatVersion::try_from(number).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(exit_code(&e));
    }
    ExitCode::SUCCESS
}

/// Exit code of the first [`PackageError`] in the chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<PackageError>())
        .map_or(1, PackageError::exit_code)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = config::load_or_default(cli.config.as_deref(), Utf8Path::new("."))
        .context("load ypkg.toml config")?;

    let (init, convert_target) = match &cli.cmd {
        Command::Init(args) => (args.format, None),
        Command::Convert(args) => (None, args.to),
        _ => (None, None),
    };
    let settings = ConfigMerger::new(file_config).merge(init, convert_target)?;
    debug!(
        "merged config: reserved={:?}, init={}, convert_target={}",
        settings.codec.reserved(),
        settings.init_version,
        settings.convert_target
    );

    match cli.cmd {
        Command::Detect(args) => cmd_detect(args),
        Command::Bump(args) => cmd_bump(args, &settings),
        Command::Convert(args) => cmd_convert(args, &settings),
        Command::Init(args) => cmd_init(args, &settings),
        Command::Lint(args) => {
            ops::lint(&args.path, &settings).with_context(|| format!("lint {}", args.path))
        }
        Command::Update(args) => ops::update(&args.path, &args.version, &args.sources, &settings)
            .map(drop)
            .with_context(|| format!("update {}", args.path)),
        Command::Auto(args) => ops::auto(&args.sources, &settings)
            .map(drop)
            .context("generate recipe"),
    }
}

fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let version = ops::detect(&args.path).with_context(|| format!("detect {}", args.path))?;
    println!("{version}");
    Ok(())
}

fn cmd_bump(args: BumpArgs, settings: &PackageSettings) -> anyhow::Result<()> {
    if args.dry_run {
        let pkg = ops::prepare_bump(&args.path, settings)
            .with_context(|| format!("bump {}", args.path))?;
        print!("{}", pkg.preview()?);
        return Ok(());
    }

    let pkg = ops::bump(&args.path, settings).with_context(|| format!("bump {}", args.path))?;
    let release = pkg.convert()?.release;
    println!("{}: release {}", pkg.path(), release);
    Ok(())
}

fn cmd_convert(args: ConvertArgs, settings: &PackageSettings) -> anyhow::Result<()> {
    let target = settings.convert_target;

    if args.dry_run {
        if let Some(out) = &args.out {
            warn!("--out {} ignored in dry-run mode", out);
        }
        let pkg = ops::prepare_convert(&args.path, target, settings)
            .with_context(|| format!("convert {}", args.path))?;
        print!("{}", pkg.preview()?);
        return Ok(());
    }

    let pkg = ops::convert_format(&args.path, target, args.out.as_deref(), settings)
        .with_context(|| format!("convert {}", args.path))?;
    println!("{}: format {}", pkg.path(), pkg.version());
    Ok(())
}

fn cmd_init(args: InitArgs, settings: &PackageSettings) -> anyhow::Result<()> {
    if args.dry_run {
        print!("{}", ops::preview_init(&args.path, settings.init_version, settings)?);
        return Ok(());
    }

    let pkg = ops::init(&args.path, settings.init_version, settings)
        .with_context(|| format!("init {}", args.path))?;
    println!("{}: format {}", pkg.path(), pkg.version());
    Ok(())
}
