//! Length-prefixed string records.
//!
//! Each record is a big-endian `u32` byte length followed by that many bytes
//! of UTF-8. A stream is a plain concatenation of records.

use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use super::HistoryError;

/// Codec for history records, framed by [`LengthDelimitedCodec`].
pub struct RecordCodec {
    frames: LengthDelimitedCodec,
}

impl RecordCodec {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::new(),
        }
    }
}

impl Decoder for RecordCodec {
    type Item = String;
    type Error = HistoryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, HistoryError> {
        let Some(frame) = self
            .frames
            .decode(src)
            .map_err(|err| HistoryError::Corrupt(err.to_string()))?
        else {
            return Ok(None);
        };

        String::from_utf8(frame.to_vec())
            .map(Some)
            .map_err(|err| HistoryError::Corrupt(err.to_string()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, HistoryError> {
        match self.decode(src)? {
            Some(record) => Ok(Some(record)),
            None if src.is_empty() => Ok(None),
            None => Err(HistoryError::Corrupt(format!(
                "truncated record, {} bytes left over",
                src.len()
            ))),
        }
    }
}

impl<'a> Encoder<&'a str> for RecordCodec {
    type Error = HistoryError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), HistoryError> {
        self.frames.encode(Bytes::copy_from_slice(item.as_bytes()), dst)?;
        Ok(())
    }
}

/// Encode `records` into one buffer, in order.
pub fn encode<'a>(records: impl IntoIterator<Item = &'a str>) -> Result<BytesMut, HistoryError> {
    let mut codec = RecordCodec::new();
    let mut buffer = BytesMut::new();
    for record in records {
        codec.encode(record, &mut buffer)?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Result<Vec<String>, HistoryError> {
        let mut codec = RecordCodec::new();
        let mut buffer = BytesMut::from(bytes);
        let mut records = Vec::new();
        while let Some(record) = codec.decode_eof(&mut buffer)? {
            records.push(record);
        }
        Ok(records)
    }

    #[test]
    fn test_record_layout() {
        let buffer = encode(["ls"]).unwrap();
        assert_eq!(&buffer[..], &[0, 0, 0, 2, b'l', b's']);
    }

    #[test]
    fn test_decode_stream_until_end() {
        let buffer = encode(["echo %s", "", "sort | uniq"]).unwrap();
        assert_eq!(decode_all(&buffer).unwrap(), ["echo %s", "", "sort | uniq"]);
    }

    #[test]
    fn test_empty_stream_has_no_records() {
        assert!(decode_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_header_is_corrupt() {
        assert!(matches!(
            decode_all(&[0, 0]),
            Err(HistoryError::Corrupt(_))
        ));
    }

    #[test]
    fn test_truncated_body_is_corrupt() {
        assert!(matches!(
            decode_all(&[0, 0, 0, 10, b'a']),
            Err(HistoryError::Corrupt(_))
        ));
    }

    #[test]
    fn test_huge_length_is_corrupt() {
        assert!(matches!(
            decode_all(&[0xff, 0xff, 0xff, 0xff, b'a']),
            Err(HistoryError::Corrupt(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        assert!(matches!(
            decode_all(&[0, 0, 0, 1, 0xff]),
            Err(HistoryError::Corrupt(_))
        ));
    }
}
