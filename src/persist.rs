use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::MapperError;

/// Serializes `value` as JSON indented with four spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, MapperError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), MapperError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

pub fn write_pretty_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), MapperError> {
    let bytes = to_pretty_json(value)?;
    write_file(path, &bytes)
}
