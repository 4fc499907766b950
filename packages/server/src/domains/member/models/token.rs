use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;

/// Random bytes behind every confirmation token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Generate an opaque confirmation token.
///
/// Base64url without padding, so it can sit in a query string as-is.
pub fn generate_confirmation_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; TOKEN_BYTES] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
