// ==========================================
// SSP 犯罪数据 ETL - 源发现与并发读取
// ==========================================
// 职责: 目录扫描 → 源列表；有界并发读取 → 按输入顺序的批次列表
// 约束: 读取在阻塞线程池执行（calamine / csv 为同步 IO）
// 约束: 输出顺序恒等于输入源顺序，与完成顺序无关
// ==========================================

use crate::domain::dataset::RawRecordBatch;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{extension_of, SourceReader, SUPPORTED_EXTENSIONS};
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 单个源的读取结果
#[derive(Debug)]
pub struct SourceBatches {
    pub source: PathBuf,
    pub batches: Vec<RawRecordBatch>,
}

/// 扫描目录下受支持的源文件（按文件名排序）
///
/// 以 "~$" 开头的 Office 锁文件被忽略
pub fn discover_sources(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ImportError::SourceDirError {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_lock_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("~$"))
            .unwrap_or(false);
        if is_lock_file {
            continue;
        }
        if SUPPORTED_EXTENSIONS.contains(&extension_of(&path).as_str()) {
            sources.push(path);
        }
    }

    sources.sort();
    info!(dir = %dir.display(), count = sources.len(), "源目录扫描完成");
    Ok(sources)
}

/// 并发读取多个源
///
/// # 参数
/// - concurrency: 同时在途的读取数（>= 1）
/// - skip_failed: true 时失败源记 warn 并跳过；false 时首个失败即终止
pub async fn load_sources(
    paths: Vec<PathBuf>,
    reader: Arc<dyn SourceReader>,
    concurrency: usize,
    skip_failed: bool,
) -> ImportResult<Vec<SourceBatches>> {
    info!(count = paths.len(), concurrency, "开始读取数据源");

    let results: Vec<(PathBuf, ImportResult<Vec<RawRecordBatch>>)> = stream::iter(paths)
        .map(|path| {
            let reader = Arc::clone(&reader);
            async move {
                let task_path = path.clone();
                let joined =
                    tokio::task::spawn_blocking(move || reader.read_batches(&task_path)).await;
                let result = match joined {
                    Ok(inner) => inner,
                    Err(e) => Err(ImportError::TaskJoinError {
                        source_id: path.display().to_string(),
                        message: e.to_string(),
                    }),
                };
                (path, result)
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut loaded = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(batches) => {
                info!(
                    source = %path.display(),
                    batches = batches.len(),
                    rows = batches.iter().map(|b| b.row_count()).sum::<usize>(),
                    "数据源读取完成"
                );
                loaded.push(SourceBatches {
                    source: path,
                    batches,
                });
            }
            Err(e) if skip_failed => {
                warn!(source = %path.display(), error = %e, "数据源读取失败，已跳过");
            }
            Err(e) => {
                error!(source = %path.display(), error = %e, "数据源读取失败");
                return Err(ImportError::SourceFailed {
                    source_id: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CellValue;
    use std::time::Duration;
    use tempfile::TempDir;

    /// 按路径名返回单批次；名称含 "slow" 的源延迟返回，含 "bad" 的源失败
    struct StubReader;

    impl SourceReader for StubReader {
        fn read_batches(&self, path: &Path) -> ImportResult<Vec<RawRecordBatch>> {
            let name = path.display().to_string();
            if name.contains("slow") {
                std::thread::sleep(Duration::from_millis(50));
            }
            if name.contains("bad") {
                return Err(ImportError::FileNotFound(name));
            }
            let mut batch = RawRecordBatch::new(Some(name.clone()), vec!["SRC".to_string()]);
            batch.push_row(vec![CellValue::Text(name)]);
            Ok(vec![batch])
        }
    }

    #[tokio::test]
    async fn test_load_sources_preserves_input_order() {
        let paths = vec![
            PathBuf::from("slow_a.csv"),
            PathBuf::from("b.csv"),
            PathBuf::from("c.csv"),
        ];
        let loaded = load_sources(paths.clone(), Arc::new(StubReader), 3, false)
            .await
            .unwrap();
        let order: Vec<PathBuf> = loaded.into_iter().map(|s| s.source).collect();
        assert_eq!(order, paths);
    }

    #[tokio::test]
    async fn test_load_sources_fails_fast() {
        let paths = vec![PathBuf::from("a.csv"), PathBuf::from("bad.csv")];
        let result = load_sources(paths, Arc::new(StubReader), 2, false).await;
        assert!(matches!(result, Err(ImportError::SourceFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_sources_skips_failed_when_allowed() {
        let paths = vec![PathBuf::from("a.csv"), PathBuf::from("bad.csv")];
        let loaded = load_sources(paths, Arc::new(StubReader), 2, true).await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_discover_sources_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.xlsx", "a.csv", "notes.txt", "~$b.xlsx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let sources = discover_sources(dir.path()).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.xlsx"]);
    }

    #[test]
    fn test_discover_sources_missing_dir() {
        let result = discover_sources(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ImportError::SourceDirError { .. })));
    }
}
