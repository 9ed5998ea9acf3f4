use super::BencodeValue;

/// Canonical encoding of a value tree.
///
/// Dictionary keys come out in sorted order, so `encode(decode(x))` equals
/// `x` only when `x` was canonical to begin with.
pub fn encode(value: &BencodeValue) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{}:", bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
}

fn write_value(value: &BencodeValue, out: &mut Vec<u8>) {
    match value {
        BencodeValue::Integer(i) => out.extend_from_slice(format!("i{}e", i).as_bytes()),
        BencodeValue::String(bytes) => write_bytes(bytes, out),
        BencodeValue::List(items) => {
            out.push(b'l');
            items.iter().for_each(|item| write_value(item, out));
            out.push(b'e');
        }
        BencodeValue::Dict(dict) => {
            out.push(b'd');
            for (key, item) in dict {
                write_bytes(key, out);
                write_value(item, out);
            }
            out.push(b'e');
        }
    }
}
