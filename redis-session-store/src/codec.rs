//! Encoding of session attributes for storage.
//!
//! The default [`BinaryCodec`] writes a small versioned frame so records stay
//! readable by any implementation that knows the layout:
//!
//! ```text
//! magic   "RS"     2 bytes
//! version 0x01     1 byte
//! count   u32      number of entries
//! entry*  key_len u32 | key (UTF-8) | value_len u32 | value (JSON text)
//! ```
//!
//! All integers are big-endian.

use crate::error::{SessionError, SessionResult};
use crate::traits::SessionAttributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Frame magic.
pub const MAGIC: &[u8; 2] = b"RS";

/// Current frame version.
pub const VERSION: u8 = 1;

/// Converts session attributes to and from stored bytes.
pub trait SessionSerializer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Encode attributes.
    fn encode(&self, attributes: &SessionAttributes) -> SessionResult<Vec<u8>>;

    /// Decode attributes.
    ///
    /// Fails with [`SessionError::Deserialization`] on anything that is not
    /// a complete, well-formed record.
    fn decode(&self, bytes: &[u8]) -> SessionResult<SessionAttributes>;
}

/// Selects a built-in serializer from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerKind {
    /// Versioned length-prefixed frame
    #[default]
    Binary,
    /// Plain JSON object
    Json,
}

impl SerializerKind {
    /// Instantiate the serializer.
    pub fn build(self) -> Arc<dyn SessionSerializer> {
        match self {
            SerializerKind::Binary => Arc::new(BinaryCodec),
            SerializerKind::Json => Arc::new(JsonCodec),
        }
    }
}

/// Versioned, length-prefixed encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

fn write_len(out: &mut Vec<u8>, len: usize) -> SessionResult<()> {
    let len = u32::try_from(len)
        .map_err(|_| SessionError::Serialization(format!("length {} exceeds u32", len)))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> SessionResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                SessionError::Deserialization(format!(
                    "truncated record: {} needs {} bytes at offset {}",
                    what, n, self.pos
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> SessionResult<usize> {
        let bytes = self.take(4, what)?;
        let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(len as usize)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

impl SessionSerializer for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, attributes: &SessionAttributes) -> SessionResult<Vec<u8>> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        write_len(&mut out, attributes.len())?;

        // Sorted so equal attribute sets encode to equal bytes.
        let mut entries: Vec<(&String, &Value)> = attributes.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in entries {
            let value =
                serde_json::to_vec(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
            write_len(&mut out, key.len())?;
            out.extend_from_slice(key.as_bytes());
            write_len(&mut out, value.len())?;
            out.extend_from_slice(&value);
        }

        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> SessionResult<SessionAttributes> {
        let mut reader = Reader::new(bytes);

        if reader.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(SessionError::Deserialization(
                "not a session record (bad magic)".to_string(),
            ));
        }

        let version = reader.take(1, "version")?[0];
        if version != VERSION {
            return Err(SessionError::Deserialization(format!(
                "unsupported record version {}",
                version
            )));
        }

        let count = reader.read_u32("entry count")?;
        // Each entry needs at least its two length prefixes.
        if count > reader.remaining() / 8 {
            return Err(SessionError::Deserialization(format!(
                "entry count {} exceeds record size",
                count
            )));
        }

        let mut map = HashMap::with_capacity(count);
        for _ in 0..count {
            let key_len = reader.read_u32("key length")?;
            let key = std::str::from_utf8(reader.take(key_len, "key")?)
                .map_err(|e| SessionError::Deserialization(format!("key is not UTF-8: {}", e)))?;

            let value_len = reader.read_u32("value length")?;
            let value: Value = serde_json::from_slice(reader.take(value_len, "value")?)
                .map_err(|e| {
                    SessionError::Deserialization(format!("value of '{}': {}", key, e))
                })?;

            if map.insert(key.to_string(), value).is_some() {
                return Err(SessionError::Deserialization(format!(
                    "duplicate attribute '{}'",
                    key
                )));
            }
        }

        if reader.remaining() != 0 {
            return Err(SessionError::Deserialization(format!(
                "{} trailing bytes after record",
                reader.remaining()
            )));
        }

        Ok(map.into())
    }
}

/// Attributes as a plain JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl SessionSerializer for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, attributes: &SessionAttributes) -> SessionResult<Vec<u8>> {
        serde_json::to_vec(attributes).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> SessionResult<SessionAttributes> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SessionAttributes {
        let mut attributes = SessionAttributes::new();
        attributes.set("user_id", 42).unwrap();
        attributes.set("name", "Zoë").unwrap();
        attributes
            .set("cart", json!({"items": [1, 2, 3], "total": 9.5}))
            .unwrap();
        attributes.set("flash", Value::Null).unwrap();
        attributes
    }

    #[test]
    fn test_binary_layout() {
        let mut attributes = SessionAttributes::new();
        attributes.set("a", 1).unwrap();

        let bytes = BinaryCodec.encode(&attributes).unwrap();
        assert_eq!(
            bytes,
            [
                b'R', b'S', 1, // magic, version
                0, 0, 0, 1, // count
                0, 0, 0, 1, b'a', // key
                0, 0, 0, 1, b'1', // value
            ]
        );
    }

    #[test]
    fn test_binary_empty_and_populated() {
        let empty = BinaryCodec.encode(&SessionAttributes::new()).unwrap();
        assert_eq!(empty, [b'R', b'S', 1, 0, 0, 0, 0]);
        assert!(BinaryCodec.decode(&empty).unwrap().is_empty());

        let bytes = BinaryCodec.encode(&sample()).unwrap();
        assert_eq!(BinaryCodec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_binary_encoding_is_deterministic() {
        let a = BinaryCodec.encode(&sample()).unwrap();
        let b = BinaryCodec.encode(&sample().into_iter().collect()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_binary_rejects_corrupt_input() {
        let valid = BinaryCodec.encode(&sample()).unwrap();

        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("empty", vec![]),
            ("bad magic", b"XX\x01\0\0\0\0".to_vec()),
            ("future version", vec![b'R', b'S', 9, 0, 0, 0, 0]),
            ("truncated", valid[..valid.len() - 3].to_vec()),
            ("trailing", [valid.as_slice(), &b"!"[..]].concat()),
            ("huge count", vec![b'R', b'S', 1, 0xff, 0xff, 0xff, 0xff]),
            (
                "non-utf8 key",
                vec![b'R', b'S', 1, 0, 0, 0, 1, 0, 0, 0, 1, 0xff, 0, 0, 0, 1, b'1'],
            ),
            (
                "bad json value",
                vec![b'R', b'S', 1, 0, 0, 0, 1, 0, 0, 0, 1, b'a', 0, 0, 0, 1, b'{'],
            ),
            (
                "duplicate key",
                vec![
                    b'R', b'S', 1, 0, 0, 0, 2, //
                    0, 0, 0, 1, b'a', 0, 0, 0, 1, b'1', //
                    0, 0, 0, 1, b'a', 0, 0, 0, 1, b'2',
                ],
            ),
        ];

        for (name, bytes) in cases {
            let result = BinaryCodec.decode(&bytes);
            assert!(
                matches!(result, Err(SessionError::Deserialization(_))),
                "{} should fail to decode",
                name
            );
        }
    }

    #[test]
    fn test_json_codec() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), sample());

        assert!(matches!(
            JsonCodec.decode(b"[1,2]"),
            Err(SessionError::Deserialization(_))
        ));
        assert!(matches!(
            JsonCodec.decode(b"\x04\x08{"),
            Err(SessionError::Deserialization(_))
        ));
    }

    #[test]
    fn test_codecs_do_not_read_each_other() {
        let json = JsonCodec.encode(&sample()).unwrap();
        assert!(BinaryCodec.decode(&json).is_err());

        let binary = BinaryCodec.encode(&sample()).unwrap();
        assert!(JsonCodec.decode(&binary).is_err());
    }

    #[test]
    fn test_serializer_kind() {
        assert_eq!(SerializerKind::default(), SerializerKind::Binary);
        assert_eq!(SerializerKind::Json.build().name(), "json");
        let kind: SerializerKind = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(kind.build().name(), "binary");
    }
}
