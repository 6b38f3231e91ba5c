use crate::error::CbcWeatherError;
use log::info;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CACHE_DIR_NAME: &str = "cbc_weather_cache";

pub fn get_cache_dir() -> Result<PathBuf, CbcWeatherError> {
    dirs::cache_dir()
        .map(|p| p.join(CACHE_DIR_NAME))
        .ok_or_else(|| {
            CbcWeatherError::CacheDirResolution(io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            ))
        })
}

pub async fn ensure_cache_dir_exists(path: &Path) -> Result<(), CbcWeatherError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(CbcWeatherError::CacheDirCreation(
                    path.to_path_buf(),
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "Cache path exists but is not a directory",
                    ),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| CbcWeatherError::CacheDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(CbcWeatherError::CacheDirCreation(path.to_path_buf(), e)),
    }
}

/// Writes `data` to `path` through a temp file in the same directory, creating
/// the directory when missing. Blocking; call from `spawn_blocking`.
pub(crate) fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("a").join("b");
        ensure_cache_dir_exists(&cache).await.unwrap();
        assert!(cache.is_dir());
        ensure_cache_dir_exists(&cache).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_in_the_way() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_cache_dir_exists(&file).await,
            Err(CbcWeatherError::CacheDirCreation(..))
        ));
    }

    #[test]
    fn test_write_atomically_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
