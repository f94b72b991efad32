//! Thin seek/read/write wrapper over a file handle

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::error::Error;
use crate::core::types::Result;

/// How a [`FileHandle`] is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Existing file, read only
    Read,
    /// Existing file, read and write
    ReadWrite,
    /// Create or truncate, write only
    Write,
}

impl FileMode {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            FileMode::Read => {
                options.read(true);
            }
            FileMode::ReadWrite => {
                options.read(true).write(true);
            }
            FileMode::Write => {
                options.write(true).create(true).truncate(true);
            }
        }
        options
    }
}

/// Owned file handle with positioned read/write helpers
#[derive(Debug)]
pub struct FileHandle {
    file: File,
    path: PathBuf,
}

impl FileHandle {
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the cursor, returning the new absolute position
    pub fn move_at(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file.seek(pos)?)
    }

    /// Current cursor position
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    /// Fill `buf` from the current position
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write all of `data` at the current position
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data)?;
        Ok(())
    }

    pub fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<()> {
        self.move_at(SeekFrom::Start(pos))?;
        self.read(buf)
    }

    pub fn write_at(&mut self, pos: u64, data: &[u8]) -> Result<()> {
        self.move_at(SeekFrom::Start(pos))?;
        self.write(data)
    }

    /// Read the whole file regardless of the current cursor position
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let size = self.move_at(SeekFrom::End(0))?;
        self.move_at(SeekFrom::Start(0))?;
        let mut contents = Vec::with_capacity(size as usize);
        self.file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read the whole file as UTF-8 text
    pub fn read_all_string(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

/// Read an entire file into memory
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    FileHandle::open(path, FileMode::Read)?.read_all()
}

/// Read an entire text file into memory
pub fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
    FileHandle::open(path, FileMode::Read)?.read_all_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_all() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("data.bin");

        let mut file = FileHandle::open(&path, FileMode::Write).expect("open for write");
        file.write(b"hello voxels").expect("write");
        drop(file);

        assert_eq!(read_file(&path).expect("read"), b"hello voxels");
        assert_eq!(read_text_file(&path).expect("read text"), "hello voxels");
    }

    #[test]
    fn test_positioned_access() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("data.bin");
        std::fs::write(&path, [0u8; 8]).expect("seed file");

        let mut file = FileHandle::open(&path, FileMode::ReadWrite).expect("open");
        file.write_at(4, &[1, 2, 3]).expect("write_at");
        assert_eq!(file.tell().expect("tell"), 7);

        let mut buf = [0u8; 4];
        file.read_at(3, &mut buf).expect("read_at");
        assert_eq!(buf, [0, 1, 2, 3]);

        // read_all ignores the cursor
        file.move_at(SeekFrom::Start(6)).expect("seek");
        assert_eq!(file.read_all().expect("read_all"), vec![0, 0, 0, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let result = FileHandle::open(temp_dir.path().join("missing.vox"), FileMode::Read);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_read_past_end() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("short.bin");
        std::fs::write(&path, [1u8, 2]).expect("seed file");

        let mut file = FileHandle::open(&path, FileMode::Read).expect("open");
        let mut buf = [0u8; 4];
        assert!(file.read(&mut buf).is_err());
    }
}
