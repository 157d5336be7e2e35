//! The zip container around an office document.
//!
//! Parts are kept as raw bytes in their original order; only the parts the
//! model rewrites are ever touched, everything else is copied through.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::docx::DocxError;

/// Largest part accepted when reading a container. Header sizes are not
/// trusted; parts are read through this cap instead.
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
    compression: CompressionMethod,
}

#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
}

impl DocxPackage {
    /// Reads every part of a zip container into memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_bytes_with_limit(bytes, MAX_PART_BYTES)
    }

    fn from_bytes_with_limit(bytes: &[u8], max_part_bytes: u64) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocxError::Container(e.to_string()))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| DocxError::Container(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            (&mut file)
                .take(max_part_bytes + 1)
                .read_to_end(&mut data)
                .map_err(|e| DocxError::Container(format!("{name}: {e}")))?;
            if data.len() as u64 > max_part_bytes {
                return Err(DocxError::Container(format!(
                    "{name}: part exceeds {max_part_bytes} bytes"
                )));
            }
            parts.push(PackagePart {
                name,
                data,
                compression: file.compression(),
            });
        }

        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replaces the data of an existing part, or appends a new deflated part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
            }),
        }
    }

    #[cfg(test)]
    pub fn part_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            let compression = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| DocxError::Container(e.to_string()))?;
            zip.write_all(&part.data)
                .map_err(|e| DocxError::Container(e.to_string()))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| DocxError::Container(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
