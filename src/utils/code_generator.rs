//! Random short code generation.
//!
//! Codes are drawn from a 62 character alphanumeric alphabet with a length
//! picked uniformly from `1..=7`. Nothing here checks for collisions; the
//! store's primary key decides whether a candidate is usable.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Alphabet short codes are drawn from.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Top-level route segments that shadow `/{code}`; never handed out.
pub const RESERVED_CODES: &[&str] = &["api", "health", "static"];

/// Shortest generated code.
pub const MIN_CODE_LENGTH: usize = 1;

/// Longest generated code.
pub const MAX_CODE_LENGTH: usize = 7;

static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,7}$").expect("code pattern is valid"));

/// Generates a random candidate code.
///
/// The length is uniform over `1..=7`, so short codes are heavily
/// over-represented relative to their share of the code space. Early traffic
/// gets short codes; once those collide, retries naturally land on longer ones.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code();
/// assert!((1..=7).contains(&code.len()));
/// ```
pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

/// Generates a candidate code from the given random source.
///
/// Draws again whenever the result is one of [`RESERVED_CODES`].
pub fn generate_code_with<R: Rng>(rng: &mut R) -> String {
    loop {
        let code = random_code(rng);
        if !is_reserved_code(&code) {
            return code;
        }
    }
}

fn random_code<R: Rng>(rng: &mut R) -> String {
    let len = rng.random_range(MIN_CODE_LENGTH..=MAX_CODE_LENGTH);

    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns true if `code` is a path the router serves itself.
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Returns true if `code` has the shape of an assignable short code.
///
/// Used by the redirect handler to reject paths that can never resolve
/// without touching storage.
pub fn is_well_formed_code(code: &str) -> bool {
    CODE_REGEX.is_match(code)
}
