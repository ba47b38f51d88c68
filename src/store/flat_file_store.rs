use super::{Store, StoreError};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const GROUP_EXTENSION: &str = "dat";

/// One file per group, laid out as `{root}/{archive}/{group}.dat`.
pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FlatFileStore, StoreError> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }

        Ok(FlatFileStore { root })
    }

    fn archive_path(&self, archive: u8) -> PathBuf {
        self.root.join(archive.to_string())
    }

    fn group_path(&self, archive: u8, group: u32) -> PathBuf {
        self.archive_path(archive)
            .join(format!("{group}.{GROUP_EXTENSION}"))
    }
}

impl Store for FlatFileStore {
    fn list(&self, archive: u8) -> Result<Vec<u32>, StoreError> {
        let dir = match fs::read_dir(self.archive_path(archive)) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ArchiveNotFound(archive))
            }
            Err(e) => return Err(e.into()),
        };

        let mut groups = Vec::new();
        for file in dir {
            let path = file?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(GROUP_EXTENSION) {
                continue;
            }
            if let Some(group) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok())
            {
                groups.push(group);
            }
        }
        groups.sort_unstable();

        Ok(groups)
    }

    fn read(&self, archive: u8, group: u32) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.group_path(archive, group)) {
            Ok(buf) => Ok(buf),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::GroupNotFound(archive, group))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("255")).unwrap();
        fs::write(dir.path().join("255/3.dat"), b"three").unwrap();
        fs::write(dir.path().join("255/1.dat"), b"one").unwrap();
        fs::write(dir.path().join("255/notes.txt"), b"ignored").unwrap();

        let store = FlatFileStore::open(dir.path()).unwrap();

        assert_eq!(vec![1, 3], store.list(255).unwrap());
        assert_eq!(b"three".to_vec(), store.read(255, 3).unwrap());
        assert!(matches!(store.read(255, 2), Err(StoreError::GroupNotFound(255, 2))));
        assert!(matches!(store.list(7), Err(StoreError::ArchiveNotFound(7))));
    }
}
