use crate::models::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "run_callbacks.toml";

const DEFAULT_CONFIG: &str = r#"[general]
base_dir = "runs"
checkpoint_extension = "safetensors"

[defaults]
run_name = "default_run"
monitor = "val_loss"
patience = 7
"#;

pub fn load_config(config_path: &Path) -> Result<Config> {
    // 检查配置文件是否存在，如果不存在则创建默认配置
    if !config_path.exists() {
        create_default_config(config_path)?;
        println!("Created default config file at {}", config_path.display());
    }

    // 读取配置文件内容
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    // 解析TOML配置
    let config: Config = toml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    Ok(config)
}

fn create_default_config(config_path: &Path) -> Result<()> {
    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to create default config file: {}", config_path.display()))?;

    Ok(())
}
