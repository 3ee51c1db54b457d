// An address is tokenized into fixed-width slices, left to right. If the
// length isn't a multiple of the token size the trailing fragment is still
// a valid (short) token -- this is relied on by callers that tokenize
// truncated hashes. The empty address tokenizes to zero tokens, which is
// how the tree's root is addressed.

pub fn tokenize(addr: &str, token_size: usize) -> Vec<&str> {
    assert!(token_size > 0, "token_size must be positive");
    let bytes = addr.len();
    let mut toks = Vec::with_capacity(bytes.div_ceil(token_size));
    let mut i = 0;
    while i < bytes {
        let end = (i + token_size).min(bytes);
        toks.push(&addr[i..end]);
        i = end;
    }
    toks
}
