use rand::Rng;
use uuid::Uuid;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random string of `n` ASCII letters.
pub fn rand_string(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// A random (v4) UUID in hyphenated form.
pub fn request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Like [`request_id`], prefixed with `<prefix>-` when `prefix` is non-empty.
pub fn request_id_with_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        request_id()
    } else {
        format!("{prefix}-{}", request_id())
    }
}
