//! MNIST loading from gzip-compressed IDX files.
//!
//! Images (`*-images-idx3-ubyte.gz`) have a 16-byte header: magic `0x00000803`, image
//! count, rows, cols, all big-endian `u32`, followed by one byte per pixel. Labels
//! (`*-labels-idx1-ubyte.gz`) have an 8-byte header: magic `0x00000801` and count,
//! followed by one byte per label.
//!
//! Pixels are scaled to `[0, 1]` by dividing by 255 and labels are one-hot encoded, so
//! the result can be fed to the network as is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::{Dataset, Error, Inputs, Result};

pub const IMAGES_MAGIC: u32 = 0x0000_0803;
pub const LABELS_MAGIC: u32 = 0x0000_0801;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte.gz";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte.gz";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte.gz";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte.gz";

const IMAGES_HEADER_LEN: usize = 16;
const LABELS_HEADER_LEN: usize = 8;

/// Read a gzip IDX image file into normalized, flattened rows.
pub fn read_images<P: AsRef<Path>>(path: P) -> Result<Inputs> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading MNIST images");
    decode_images(&read_gz(path)?)
}

/// Read a gzip IDX label file as raw class indices.
pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading MNIST labels");
    decode_labels(&read_gz(path)?)
}

/// Read and pair an image file with its label file.
pub fn load_dataset<P, Q>(images: P, labels: Q, num_labels: usize) -> Result<Dataset>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let inputs = read_images(images)?;
    let labels = read_labels(labels)?;
    Dataset::from_labels(inputs, &labels, num_labels)
}

/// Decode an uncompressed IDX image payload.
pub fn decode_images(bytes: &[u8]) -> Result<Inputs> {
    let magic = be_u32(bytes, 0)?;
    if magic != IMAGES_MAGIC {
        return Err(Error::InvalidData(format!(
            "bad image file magic {magic:#010x}, expected {IMAGES_MAGIC:#010x}"
        )));
    }
    let count = be_u32(bytes, 4)? as usize;
    let rows = be_u32(bytes, 8)? as usize;
    let cols = be_u32(bytes, 12)? as usize;

    let pixels = rows
        .checked_mul(cols)
        .ok_or_else(|| Error::InvalidData(format!("image dimensions {rows}x{cols} overflow")))?;
    if pixels == 0 {
        return Err(Error::InvalidData(format!(
            "image dimensions must be > 0, got {rows}x{cols}"
        )));
    }
    let payload = &bytes[IMAGES_HEADER_LEN..];
    let expected = count
        .checked_mul(pixels)
        .ok_or_else(|| Error::InvalidData(format!("{count} images of {pixels} pixels overflow")))?;
    if payload.len() < expected {
        return Err(Error::InvalidData(format!(
            "image file is truncated: {count} images of {rows}x{cols} need {expected} bytes, found {}",
            payload.len()
        )));
    }

    let data = payload[..expected]
        .iter()
        .map(|&p| f32::from(p) / 255.0)
        .collect();
    Inputs::from_flat(data, pixels)
}

/// Decode an uncompressed IDX label payload.
pub fn decode_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let magic = be_u32(bytes, 0)?;
    if magic != LABELS_MAGIC {
        return Err(Error::InvalidData(format!(
            "bad label file magic {magic:#010x}, expected {LABELS_MAGIC:#010x}"
        )));
    }
    let count = be_u32(bytes, 4)? as usize;

    let payload = &bytes[LABELS_HEADER_LEN..];
    if payload.len() < count {
        return Err(Error::InvalidData(format!(
            "label file is truncated: expected {count} labels, found {}",
            payload.len()
        )));
    }
    Ok(payload[..count].to_vec())
}

fn read_gz(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();
    GzDecoder::new(file).read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn be_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| Error::InvalidData(format!("IDX header is truncated at byte {offset}")))
}
