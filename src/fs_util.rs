use std::fs;
use std::io::Write;

use camino::Utf8Path;

use crate::error::GeneScoreError;

/// Writes `content` next to `path` in a temporary file and persists it over
/// `path`, so readers only ever observe a complete file.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), GeneScoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| GeneScoreError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".kira-genescore")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| GeneScoreError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| GeneScoreError::Filesystem(format!("write {path}: {err}")))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| GeneScoreError::Filesystem(format!("sync {path}: {err}")))?;
    temp.persist(path.as_std_path())
        .map_err(|err| GeneScoreError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}

pub fn ensure_dir(path: &Utf8Path) -> Result<(), GeneScoreError> {
    fs::create_dir_all(path.as_std_path())
        .map_err(|err| GeneScoreError::Filesystem(format!("create {path}: {err}")))
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn replaces_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let path = root.join("nested").join("scores.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), "second");
        let leftovers = fs::read_dir(root.join("nested").as_std_path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".kira-genescore"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
