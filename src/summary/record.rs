//! TFRecord framing used by TensorBoard event files.
//!
//! ```text
//! u64  length            (little-endian)
//! u32  masked_crc32c(length bytes)
//! [u8] payload[length]
//! u32  masked_crc32c(payload)
//! ```

use std::io::{self, Read, Write};

/// CRC-32C (Castagnoli), reflected polynomial.
const CASTAGNOLI: u32 = 0x82F6_3B78;
const MASK_DELTA: u32 = 0xA282_EAD8;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ CASTAGNOLI } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in data {
        crc = TABLE[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    !crc
}

pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = (payload.len() as u64).to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(&masked_crc32c(&len).to_le_bytes())?;
    writer.write_all(payload)?;
    writer.write_all(&masked_crc32c(payload).to_le_bytes())?;
    Ok(())
}

/// Reads the next record.
///
/// Returns `Ok(None)` at end of stream, including when the final record is
/// only partially written. A checksum mismatch is reported as
/// `io::ErrorKind::InvalidData`.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 8];
    if !read_full(reader, &mut len_bytes)? {
        return Ok(None);
    }
    let mut crc_bytes = [0u8; 4];
    if !read_full(reader, &mut crc_bytes)? {
        return Ok(None);
    }
    if u32::from_le_bytes(crc_bytes) != masked_crc32c(&len_bytes) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "record length checksum mismatch"));
    }

    let len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "record length overflows usize"))?;
    let mut payload = vec![0u8; len];
    if !read_full(reader, &mut payload)? {
        return Ok(None);
    }
    if !read_full(reader, &mut crc_bytes)? {
        return Ok(None);
    }
    if u32::from_le_bytes(crc_bytes) != masked_crc32c(&payload) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "record payload checksum mismatch"));
    }
    Ok(Some(payload))
}

/// Fills `buf` completely; `false` if the stream ended first.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xE306_9283);
        assert_eq!(crc32c(b""), 0);
    }

    #[test]
    fn records_frame_and_unframe() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"first").unwrap();
        write_record(&mut buf, b"").unwrap();
        assert_eq!(buf.len(), 16 + 5 + 16);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_record(&mut cursor).unwrap(), Some(b"first".to_vec()));
        assert_eq!(read_record(&mut cursor).unwrap(), Some(Vec::new()));
        assert_eq!(read_record(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_tail_ends_stream_but_corruption_fails() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"payload").unwrap();
        let truncated = buf[..buf.len() - 2].to_vec();
        assert_eq!(read_record(&mut Cursor::new(truncated)).unwrap(), None);

        buf[14] ^= 0xFF;
        let err = read_record(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
