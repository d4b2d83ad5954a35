//! Hand-rolled protobuf codec for the subset of `tensorflow.Event` that
//! scalar logging needs:
//!
//! ```text
//! Event   { double wall_time = 1; int64 step = 2;
//!           string file_version = 3; Summary summary = 5; }
//! Summary { repeated Value value = 1; }
//! Value   { string tag = 1; float simple_value = 2; }
//! ```
//!
//! Unknown fields are skipped when decoding.

const WIRE_VARINT: u8 = 0;
const WIRE_FIXED64: u8 = 1;
const WIRE_LEN: u8 = 2;
const WIRE_FIXED32: u8 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue {
    pub tag: String,
    pub simple_value: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub wall_time: f64,
    pub step: i64,
    pub file_version: Option<String>,
    pub values: Vec<ScalarValue>,
}

impl Event {
    pub fn file_version(wall_time: f64, version: &str) -> Event {
        Event { wall_time, step: 0, file_version: Some(version.to_string()), values: Vec::new() }
    }

    pub fn scalar(wall_time: f64, step: i64, tag: &str, value: f32) -> Event {
        Event {
            wall_time,
            step,
            file_version: None,
            values: vec![ScalarValue { tag: tag.to_string(), simple_value: value }],
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_key(&mut buf, 1, WIRE_FIXED64);
        buf.extend_from_slice(&self.wall_time.to_le_bytes());
        if self.step != 0 {
            put_key(&mut buf, 2, WIRE_VARINT);
            put_varint(&mut buf, self.step as u64);
        }
        if let Some(version) = &self.file_version {
            put_bytes(&mut buf, 3, version.as_bytes());
        }
        if !self.values.is_empty() {
            let mut summary = Vec::new();
            for v in &self.values {
                let mut value = Vec::new();
                put_bytes(&mut value, 1, v.tag.as_bytes());
                put_key(&mut value, 2, WIRE_FIXED32);
                value.extend_from_slice(&v.simple_value.to_le_bytes());
                put_bytes(&mut summary, 1, &value);
            }
            put_bytes(&mut buf, 5, &summary);
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Event, String> {
        let mut event = Event::default();
        let mut r = Reader::new(bytes);
        while !r.done() {
            let (field, wire) = r.key()?;
            match (field, wire) {
                (1, WIRE_FIXED64) => event.wall_time = f64::from_le_bytes(r.fixed::<8>()?),
                (2, WIRE_VARINT) => event.step = r.varint()? as i64,
                (3, WIRE_LEN) => event.file_version = Some(r.string()?),
                (5, WIRE_LEN) => event.values.extend(decode_summary(r.bytes()?)?),
                _ => r.skip(wire)?,
            }
        }
        Ok(event)
    }
}

fn decode_summary(bytes: &[u8]) -> Result<Vec<ScalarValue>, String> {
    let mut values = Vec::new();
    let mut r = Reader::new(bytes);
    while !r.done() {
        let (field, wire) = r.key()?;
        if (field, wire) == (1, WIRE_LEN) {
            if let Some(v) = decode_value(r.bytes()?)? {
                values.push(v);
            }
        } else {
            r.skip(wire)?;
        }
    }
    Ok(values)
}

/// `None` for values that carry no `simple_value` (images, tensors, ...).
fn decode_value(bytes: &[u8]) -> Result<Option<ScalarValue>, String> {
    let mut tag = String::new();
    let mut simple_value = None;
    let mut r = Reader::new(bytes);
    while !r.done() {
        let (field, wire) = r.key()?;
        match (field, wire) {
            (1, WIRE_LEN) => tag = r.string()?,
            (2, WIRE_FIXED32) => simple_value = Some(f32::from_le_bytes(r.fixed::<4>()?)),
            _ => r.skip(wire)?,
        }
    }
    Ok(simple_value.map(|simple_value| ScalarValue { tag, simple_value }))
}

fn put_varint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

fn put_key(buf: &mut Vec<u8>, field: u32, wire: u8) {
    put_varint(buf, ((field as u64) << 3) | wire as u64);
}

fn put_bytes(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    put_key(buf, field, WIRE_LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn varint(&mut self) -> Result<u64, String> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = *self.buf.get(self.pos).ok_or("truncated varint")?;
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err("varint longer than 10 bytes".to_string())
    }

    fn key(&mut self) -> Result<(u32, u8), String> {
        let key = self.varint()?;
        Ok(((key >> 3) as u32, (key & 0x7) as u8))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or("field runs past end of message")?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn bytes(&mut self) -> Result<&'a [u8], String> {
        let len = self.varint()? as usize;
        self.take(len)
    }

    fn string(&mut self) -> Result<String, String> {
        String::from_utf8(self.bytes()?.to_vec()).map_err(|e| e.to_string())
    }

    fn skip(&mut self, wire: u8) -> Result<(), String> {
        match wire {
            WIRE_VARINT => self.varint().map(|_| ()),
            WIRE_FIXED64 => self.take(8).map(|_| ()),
            WIRE_LEN => self.bytes().map(|_| ()),
            WIRE_FIXED32 => self.take(4).map(|_| ()),
            other => Err(format!("unsupported wire type {}", other)),
        }
    }
}
