use crate::error::{Error, Result};
use crate::models::RunContext;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15; // "YYYYMMDD_HHMMSS"

/// 已存在的运行目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    pub run_name: String,
    pub timestamp: NaiveDateTime,
    pub path: PathBuf,
}

/// 将时间格式化为运行目录使用的时间戳
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// 创建 checkpoints/ 与 logs/ 子目录，已存在时不报错
pub fn create_run_dirs(ctx: &RunContext) -> Result<()> {
    for dir in [ctx.checkpoint_dir(), ctx.log_dir.clone()] {
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "run directory ready");
    }
    Ok(())
}

/// 从目录名 "<run_name>_<YYYYMMDD>_<HHMMSS>" 中拆出运行名和时间戳
pub fn parse_run_dir_name(name: &str) -> Option<(String, NaiveDateTime)> {
    let split = name.len().checked_sub(TIMESTAMP_LEN)?;
    if split == 0 || !name.is_char_boundary(split) {
        return None;
    }
    let (head, ts) = name.split_at(split);
    let run_name = head.strip_suffix('_')?;
    let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()?;
    Some((run_name.to_string(), timestamp))
}

fn to_run_entry(entry: &DirEntry) -> Option<RunEntry> {
    if !entry.file_type().is_dir() {
        return None;
    }
    let name = entry.file_name().to_string_lossy();
    parse_run_dir_name(&name).map(|(run_name, timestamp)| RunEntry {
        run_name,
        timestamp,
        path: entry.path().to_path_buf(),
    })
}

/// 列出基础目录下所有运行目录，按时间戳、运行名排序
///
/// 基础目录不存在时返回空列表；它是一个文件时返回错误
pub fn find_run_dirs(base_dir: &Path) -> Result<Vec<RunEntry>> {
    if !base_dir.exists() {
        return Ok(Vec::new());
    }

    if !base_dir.is_dir() {
        return Err(Error::io(
            base_dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "base path is not a directory"),
        ));
    }

    let mut runs: Vec<RunEntry> = WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| to_run_entry(&entry))
        .collect();

    runs.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.run_name.cmp(&b.run_name))
    });

    Ok(runs)
}
