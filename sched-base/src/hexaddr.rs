// State addresses are plain hex strings (see the wire-format / address
// convention section of the scheduling core's spec). We don't parse or
// validate them beyond this, since the core treats addresses as opaque
// tokenizable strings.

pub fn is_hex(addr: &str) -> bool {
    addr.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_hex() {
        assert!(is_hex(""));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(!is_hex("zz"));
        assert!(is_hex("0a1b"));
    }

    #[test]
    fn encode_round_trips_length() {
        let s = encode(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(s, "deadbeef");
    }
}
