mod decoder;
mod encoder;
mod value;

pub use decoder::{decode, MAX_DEPTH};
pub use encoder::encode;
pub use value::{BencodeDict, BencodeValue};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResumeError;
    use bytes::Bytes;

    fn dict(entries: &[(&str, BencodeValue)]) -> BencodeValue {
        BencodeValue::Dict(
            entries
                .iter()
                .map(|(k, v)| (Bytes::copy_from_slice(k.as_bytes()), v.clone()))
                .collect(),
        )
    }

    fn malformed_offset(data: &[u8]) -> usize {
        match decode(data) {
            Err(ResumeError::MalformedEncoding { offset, .. }) => offset,
            other => panic!("expected MalformedEncoding, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_encoding() {
        let value = BencodeValue::Integer(42);
        let encoded = encode(&value);
        assert_eq!(encoded, b"i42e");
    }

    #[test]
    fn test_string_encoding() {
        let value = BencodeValue::from("spam");
        let encoded = encode(&value);
        assert_eq!(encoded, b"4:spam");
    }

    #[test]
    fn test_dict_encoding() {
        let value = dict(&[("foo", 42.into()), ("bar", "spam".into())]);
        let encoded = encode(&value);
        assert_eq!(encoded, b"d3:bar4:spam3:fooi42ee");
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode(b"i42e").unwrap(), BencodeValue::Integer(42));
        assert_eq!(decode(b"i-42e").unwrap(), BencodeValue::Integer(-42));
        assert_eq!(decode(b"i0e").unwrap(), BencodeValue::Integer(0));
        assert_eq!(
            decode(b"i9223372036854775807e").unwrap(),
            BencodeValue::Integer(i64::MAX)
        );
    }

    #[test]
    fn test_decode_invalid_integers() {
        assert_eq!(malformed_offset(b"i-0e"), 1);
        assert_eq!(malformed_offset(b"i03e"), 1);
        assert_eq!(malformed_offset(b"ie"), 1);
        assert_eq!(malformed_offset(b"i-e"), 1);
        assert_eq!(malformed_offset(b"i+5e"), 1);
        assert_eq!(malformed_offset(b"i1x2e"), 1);
        assert_eq!(malformed_offset(b"i99999999999999999999e"), 1);
        assert_eq!(malformed_offset(b"i42"), 3);
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(decode(b"4:spam").unwrap(), BencodeValue::from("spam"));
        assert_eq!(decode(b"0:").unwrap(), BencodeValue::from(""));
        assert_eq!(
            decode(b"3:\x00\xff\x80").unwrap(),
            BencodeValue::from(vec![0x00u8, 0xff, 0x80])
        );
    }

    #[test]
    fn test_string_length_past_end_reports_offset() {
        assert_eq!(malformed_offset(b"10:abc"), 0);
        // Offset points at the nested string's length prefix
        assert_eq!(malformed_offset(b"l4:spam9:xe"), 7);
    }

    #[test]
    fn test_unterminated_string_length() {
        assert_eq!(malformed_offset(b"12"), 2);
        assert_eq!(malformed_offset(b"1x:a"), 1);
    }

    #[test]
    fn test_unterminated_containers() {
        assert_eq!(malformed_offset(b"l4:spam"), 7);
        assert_eq!(malformed_offset(b"d3:fooi1e"), 9);
    }

    #[test]
    fn test_dict_key_must_be_string() {
        assert_eq!(malformed_offset(b"di1ei2ee"), 1);
    }

    #[test]
    fn test_trailing_garbage() {
        assert_eq!(malformed_offset(b"i1ei2e"), 3);
        assert_eq!(malformed_offset(b"de "), 2);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(malformed_offset(b""), 0);
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(malformed_offset(b"x"), 0);
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let value = decode(b"d1:ai1e1:ai2ee").unwrap();
        assert_eq!(value.dict_get(b"a"), Some(&BencodeValue::Integer(1)));
        assert_eq!(value.as_dict().unwrap().len(), 1);
    }

    #[test]
    fn test_unsorted_keys_iterate_sorted() {
        let value = decode(b"d1:bi1e1:ai2ee").unwrap();
        let keys: Vec<_> = value.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
    }

    #[test]
    fn test_nesting_within_limit() {
        let mut data = vec![b'l'; 100];
        data.extend(vec![b'e'; 100]);
        assert!(decode(&data).is_ok());
    }

    fn nested_lists(depth: usize, leaf: &[u8]) -> Vec<u8> {
        let mut data = vec![b'l'; depth];
        data.extend_from_slice(leaf);
        data.extend(vec![b'e'; depth]);
        data
    }

    #[test]
    fn test_nesting_at_limit() {
        assert!(decode(&nested_lists(MAX_DEPTH, b"")).is_ok());
        // Scalars inside the innermost container do not count
        assert!(decode(&nested_lists(MAX_DEPTH, b"i1e")).is_ok());
    }

    #[test]
    fn test_nesting_too_deep() {
        for depth in [MAX_DEPTH + 1, MAX_DEPTH + 10] {
            match decode(&nested_lists(depth, b"")) {
                Err(ResumeError::NestingTooDeep { offset, max_depth }) => {
                    assert_eq!(max_depth, MAX_DEPTH);
                    assert_eq!(offset, MAX_DEPTH);
                }
                other => panic!("expected NestingTooDeep, got {:?}", other),
            }
        }

        // An empty dict one level past the limit is refused too
        assert!(matches!(
            decode(&nested_lists(MAX_DEPTH, b"de")),
            Err(ResumeError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_roundtrip() {
        let original = dict(&[
            ("info-hash", BencodeValue::from(vec![0xabu8; 20])),
            ("file-version", 1.into()),
            (
                "trackers",
                BencodeValue::List(vec![BencodeValue::List(vec![
                    "udp://tracker.example:80".into(),
                ])]),
            ),
            ("unfinished", BencodeValue::List(vec![dict(&[("piece", 3.into())])])),
            ("upload_rate_limit", (-1).into()),
        ]);
        let encoded = encode(&original);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }
}
