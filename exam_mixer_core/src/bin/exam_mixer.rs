//! `exam-mixer`: shuffle a Word exam into several versions

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use exam_mixer_core::{generate_with_config, validate_document, MixerConfig, ShuffleMode};

const ANSWER_KEY_XLSX: &str = "Dap_An.xlsx";
const ANSWER_KEY_JSON: &str = "answer_key.json";
const BUNDLE_NAME: &str = "De_Tron.zip";

#[derive(Debug, Parser)]
#[command(author, version, about = "Trộn đề kiểm tra Word (.docx)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate shuffled versions and the answer key
    Mix(MixArgs),
    /// Report unmarked answers and incomplete questions
    Check {
        /// Source exam
        input: PathBuf,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct MixArgs {
    /// Source exam
    input: PathBuf,
    /// Output directory
    #[arg(long, short = 'o', default_value = ".")]
    out: PathBuf,
    /// TOML configuration; command-line flags override it
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Number of versions
    #[arg(long, short = 'n')]
    count: Option<u32>,
    /// auto, mcq or tf
    #[arg(long, short = 'm')]
    mode: Option<ShuffleMode>,
    /// Code of the first version
    #[arg(long)]
    start: Option<u32>,
    /// File name prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Convert floating pictures to inline first
    #[arg(long, default_value_t = false)]
    fix_images: bool,
    /// Also pack every version into one zip
    #[arg(long, default_value_t = false)]
    bundle: bool,
}

impl MixArgs {
    fn config(&self) -> anyhow::Result<MixerConfig> {
        let mut config = match &self.config {
            Some(path) => MixerConfig::load(path)
                .with_context(|| format!("reading configuration {}", path.display()))?,
            None => MixerConfig::default(),
        };
        if let Some(count) = self.count {
            config.version_count = count;
        }
        if let Some(mode) = self.mode {
            config.shuffle_mode = mode;
        }
        if let Some(start) = self.start {
            config.version_code_start = start;
        }
        if let Some(prefix) = &self.prefix {
            config.file_prefix = prefix.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.fix_floating_images |= self.fix_images;
        config.validate()?;
        Ok(config)
    }
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn mix(args: &MixArgs) -> anyhow::Result<()> {
    let config = args.config()?;
    let source = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let output = generate_with_config(&source, &config)
        .with_context(|| format!("mixing {}", args.input.display()))?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    for version in &output.versions {
        write_file(&args.out, &version.file_name, &version.bytes)?;
    }
    write_file(&args.out, ANSWER_KEY_XLSX, &output.answer_key.to_xlsx()?)?;
    write_file(&args.out, ANSWER_KEY_JSON, output.answer_key.to_json()?.as_bytes())?;
    if args.bundle {
        write_file(&args.out, BUNDLE_NAME, &output.bundle_zip()?)?;
    }
    Ok(())
}

fn check(input: &Path, json: bool) -> anyhow::Result<()> {
    let source = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let report = validate_document(&source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} câu hỏi", report.questions);
        for issue in &report.errors {
            println!("❌ {}", issue);
        }
        for issue in &report.warnings {
            println!("⚠️ {}", issue);
        }
    }

    if !report.is_ok() {
        bail!("{} error(s) in {}", report.errors.len(), input.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Mix(args) => mix(args),
        Command::Check { input, json } => check(input, *json),
    }
}
