use serde::Deserialize;

/// 应用程序配置结构
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub defaults: DefaultsConfig,
}

/// 通用配置
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    pub base_dir: String,
    pub checkpoint_extension: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_dir: "runs".to_string(),
            checkpoint_extension: "safetensors".to_string(),
        }
    }
}

/// 未在命令行指定时使用的默认参数
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub run_name: String,
    pub monitor: String,
    pub patience: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            run_name: "default_run".to_string(),
            monitor: "val_loss".to_string(),
            patience: 7,
        }
    }
}
