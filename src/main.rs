// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use run_callbacks::config::{DEFAULT_CONFIG_FILE, load_config};
use run_callbacks::models::Config;
use run_callbacks::run_dir::{find_run_dirs, format_timestamp};
use run_callbacks::{RunConfigurator, RunOptions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "run-callbacks", version, about = "Prepare a run directory and the standard training observers")]
struct Cli {
    /// 配置文件路径，不存在时自动创建
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 创建运行目录并打印观察者配置
    Init(InitArgs),
    /// 列出基础目录下已有的运行
    List,
}

#[derive(Debug, Default, clap::Args)]
struct InitArgs {
    #[arg(long)]
    run_name: Option<String>,
    #[arg(long)]
    monitor: Option<String>,
    #[arg(long)]
    patience: Option<u32>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

#[derive(Debug, Default, Clone, Copy, ValueEnum)]
enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 加载配置文件
    let config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Command::Init(InitArgs::default())) {
        Command::Init(args) => init(&config, args),
        Command::List => list(Path::new(&config.general.base_dir)),
    }
}

fn init(config: &Config, args: InitArgs) -> Result<()> {
    // 命令行参数优先，其次是配置文件中的默认值
    let options = RunOptions::new(
        args.run_name.unwrap_or_else(|| config.defaults.run_name.clone()),
        args.monitor.unwrap_or_else(|| config.defaults.monitor.clone()),
        args.patience.unwrap_or(config.defaults.patience),
    );

    let setup = RunConfigurator::from_config(config)
        .prepare(&options)
        .with_context(|| format!("Failed to prepare run: {}", options.run_name))?;

    let rendered = match args.format {
        OutputFormat::Yaml => serde_yaml::to_string(&setup).context("Failed to render YAML")?,
        OutputFormat::Json => serde_json::to_string_pretty(&setup).context("Failed to render JSON")?,
    };
    println!("{}", rendered);
    Ok(())
}

fn list(base_dir: &Path) -> Result<()> {
    let runs = find_run_dirs(base_dir)
        .with_context(|| format!("Failed to list runs in {}", base_dir.display()))?;

    if runs.is_empty() {
        println!("No runs found in {}", base_dir.display());
        return Ok(());
    }

    println!("Found {} runs in {}:", runs.len(), base_dir.display());
    for run in &runs {
        println!("  {:<24} {}  {}", run.run_name, format_timestamp(&run.timestamp), run.path.display());
    }
    Ok(())
}
