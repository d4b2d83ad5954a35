//! Parsers for the IDX binary format used by MNIST and its derivatives
//! (Fashion-MNIST, EMNIST, ...).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

use crate::error::{Error, Result};

/// Raw images from an IDX3 buffer.
#[derive(Debug, Clone)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// `count * rows * cols` bytes, image after image.
    pub pixels: Vec<u8>,
}

impl IdxImages {
    pub fn image(&self, i: usize) -> &[u8] {
        let n = self.rows * self.cols;
        &self.pixels[i * n..(i + 1) * n]
    }
}

fn check_header(bytes: &[u8], what: &str, dims: u8, header_len: usize) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::Idx(format!(
            "{} too short: expected at least {} header bytes, got {}.",
            what, header_len, bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Idx(format!(
            "{}: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Idx(format!(
            "{}: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Idx(format!(
            "{}: byte 3 (dimensions) must be {}, got {}.",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

pub fn parse_idx_images(bytes: &[u8]) -> Result<IdxImages> {
    check_header(bytes, "IDX image file", 0x03, 16)?;

    let count = be_u32(bytes, 4);
    let rows = be_u32(bytes, 8);
    let cols = be_u32(bytes, 12);

    let data_len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(count))
        .ok_or_else(|| Error::Idx(format!(
            "IDX image file: {} images of {}x{} pixels overflows usize.",
            count, rows, cols
        )))?;

    if bytes.len() - 16 < data_len {
        return Err(Error::Idx(format!(
            "IDX image file too short: header declares {} images of {}x{} pixels \
             ({} data bytes needed after header), but file is only {} bytes total.",
            count, rows, cols, data_len, bytes.len()
        )));
    }

    Ok(IdxImages { count, rows, cols, pixels: bytes[16..16 + data_len].to_vec() })
}

pub fn parse_idx_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    check_header(bytes, "IDX label file", 0x01, 8)?;

    let count = be_u32(bytes, 4);
    if bytes.len() - 8 < count {
        return Err(Error::Idx(format!(
            "IDX label file too short: header declares {} labels but file is only {} bytes.",
            count, bytes.len()
        )));
    }
    Ok(bytes[8..8 + count].to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn image_file(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        bytes.extend_from_slice(&count.to_be_bytes());
        bytes.extend_from_slice(&rows.to_be_bytes());
        bytes.extend_from_slice(&cols.to_be_bytes());
        bytes.extend_from_slice(pixels);
        bytes
    }

    pub(crate) fn label_file(labels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x01];
        bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        bytes.extend_from_slice(labels);
        bytes
    }

    #[test]
    fn parses_images_and_labels() {
        let images = parse_idx_images(&image_file(2, 2, 2, &[0, 255, 1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!((images.count, images.rows, images.cols), (2, 2, 2));
        assert_eq!(images.image(1), &[3, 4, 5, 6]);
        assert_eq!(parse_idx_labels(&label_file(&[7, 1])).unwrap(), vec![7, 1]);
    }

    #[test]
    fn rejects_malformed_headers() {
        let mut wrong_dims = image_file(1, 1, 1, &[0]);
        wrong_dims[3] = 0x01;
        assert!(parse_idx_images(&wrong_dims).is_err());
        assert!(parse_idx_images(&image_file(2, 2, 2, &[0; 7])).is_err());
        assert!(parse_idx_images(&[0, 0, 8]).is_err());

        let mut wrong_dtype = label_file(&[1]);
        wrong_dtype[2] = 0x09;
        assert!(parse_idx_labels(&wrong_dtype).is_err());
        let mut short = label_file(&[1, 2]);
        short.pop();
        assert!(parse_idx_labels(&short).is_err());
    }
}
