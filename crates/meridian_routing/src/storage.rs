use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use rkyv::util::AlignedVec;

use crate::error::StorageError;

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Reads a whole file into an aligned buffer, as required to validate rkyv archives
pub(crate) fn read_bytes(path: &Path) -> Result<AlignedVec, StorageError> {
    let file = File::open(path).map_err(|err| io_error(path, err))?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|err| io_error(path, err))?;

    let mut aligned = AlignedVec::with_capacity(buffer.len());
    aligned.extend_from_slice(&buffer);
    Ok(aligned)
}

pub(crate) fn write_bytes(bytes: &[u8], path: &Path) -> Result<(), StorageError> {
    let file = File::create(path).map_err(|err| io_error(path, err))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).map_err(|err| io_error(path, err))?;
    writer.flush().map_err(|err| io_error(path, err))
}
