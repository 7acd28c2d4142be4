use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};

use crate::{
    errors::{AppError, AppResult},
    models::domain::TestBank,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestBankRepository: Send + Sync {
    /// Persists the test bank and returns the file name it was written to.
    async fn save(&self, test_bank: &TestBank) -> AppResult<String>;
    async fn list(&self) -> AppResult<Vec<String>>;
}

/// Writes one JSON file per test bank under a fixed output directory.
pub struct FileTestBankRepository {
    output_dir: PathBuf,
}

impl FileTestBankRepository {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Creates a new file named `base_name`, or `base_name` with a `_N` suffix
    /// when an earlier save in the same millisecond took the name.
    async fn create_unique(&self, base_name: &str) -> AppResult<(String, PathBuf, fs::File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = numbered_file_name(base_name, attempt);
            let path = self.output_dir.join(&file_name);

            // create_new: never clobber a bank written by a concurrent request
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file_name, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AppError::InternalError(format!(
                        "cannot create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(AppError::InternalError(format!(
            "no free file name for {} after {} attempts",
            base_name, MAX_NAME_ATTEMPTS
        )))
    }
}

const MAX_NAME_ATTEMPTS: u32 = 100;

fn numbered_file_name(base_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return base_name.to_string();
    }
    match base_name.strip_suffix(".json") {
        Some(stem) => format!("{}_{}.json", stem, attempt),
        None => format!("{}_{}", base_name, attempt),
    }
}

/// Writes `bytes` and flushes; on failure the partial file is deleted so it is never listed.
async fn write_or_remove<W>(mut writer: W, path: &Path, bytes: &[u8]) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let result = match writer.write_all(bytes).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    drop(writer);

    if let Err(e) = result {
        if let Err(remove_err) = fs::remove_file(path).await {
            log::warn!("Could not remove partial file {}: {}", path.display(), remove_err);
        }
        return Err(AppError::InternalError(format!(
            "failed to write {}: {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

#[async_trait]
impl TestBankRepository for FileTestBankRepository {
    async fn save(&self, test_bank: &TestBank) -> AppResult<String> {
        fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            AppError::InternalError(format!(
                "cannot create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let base_name =
            test_bank_file_name(&test_bank.title, &test_bank.chapter, test_bank.generated_at);

        let json = serde_json::to_vec_pretty(test_bank).map_err(|e| {
            AppError::InternalError(format!("failed to serialize test bank: {}", e))
        })?;

        let (file_name, path, file) = self.create_unique(&base_name).await?;
        write_or_remove(file, &path, &json).await?;

        log::info!("Saved test bank to {}", path.display());
        Ok(file_name)
    }

    async fn list(&self) -> AppResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::InternalError(format!(
                    "cannot read output directory {}: {}",
                    self.output_dir.display(),
                    e
                )))
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::InternalError(format!("cannot list saved files: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                files.push(name);
            }
        }

        files.sort();
        Ok(files)
    }
}

pub fn test_bank_file_name(title: &str, chapter: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_test_bank_{}.json",
        slugify(title),
        slugify(chapter),
        generated_at.format("%Y%m%d_%H%M%S_%3f")
    )
}

/// Lowercase ASCII alphanumerics joined by single underscores.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }

    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.chars().take(80).collect()
    }
}
