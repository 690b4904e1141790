//! Synchronous chunk persistence. Each chunk coordinate maps to one file in
//! the save directory whose body is the raw block grid, load and save run
//! inline on the caller's thread so the world streams fully within its
//! update call.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use tracing::trace;

use crate::chunk::{Chunk, CHUNK_SIZE};


/// A handle to the save directory of a world.
pub struct ChunkStorage {
    /// Directory containing one `{cx}_{cz}.bin` file per saved chunk.
    dir: PathBuf,
}

impl ChunkStorage {

    /// Create a new storage over the given save directory. The directory is
    /// only created on the first save, and a missing directory reads as a
    /// world with no saved chunk.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the save file of a chunk.
    fn chunk_path(&self, cx: i32, cz: i32) -> PathBuf {
        self.dir.join(format!("{cx}_{cz}.bin"))
    }

    /// Try loading the chunk at the given coordinate, returning none if it
    /// has no save file. The file length is checked against the grid size
    /// before reading, the format has no header to validate.
    pub fn load(&self, cx: i32, cz: i32) -> Result<Option<Box<Chunk>>, StorageError> {

        let file = match File::open(self.chunk_path(cx, cz)) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let len = file.metadata()?.len();
        if len != CHUNK_SIZE as u64 {
            return Err(StorageError::InvalidLength(len));
        }

        let mut chunk = Chunk::new();
        chunk.read_data_from(BufReader::new(file))?;
        trace!("loaded chunk {cx}/{cz}");
        Ok(Some(chunk))

    }

    /// Save the chunk at the given coordinate, creating the save directory
    /// if needed. Every error is returned to the caller, a failed save must
    /// not go unnoticed.
    pub fn save(&self, cx: i32, cz: i32, chunk: &Chunk) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let mut writer = BufWriter::new(File::create(self.chunk_path(cx, cz))?);
        chunk.write_data_to(&mut writer)?;
        writer.flush()?;
        trace!("saved chunk {cx}/{cz}");
        Ok(())
    }

}


/// Error type used for every call on chunk storage methods.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("The chunk file length ({0}) does not match the block grid.")]
    InvalidLength(u64),
}
