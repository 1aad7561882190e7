//! String keys are reduced to a 32-bit signed digest that orders the tree.
//!
//! The digest is the classic `h = 31 * h + c` polynomial over UTF-16 code
//! units with wrapping arithmetic. It is not collision free: `"Aa"` and
//! `"BB"` share a digest, and the map cannot tell them apart.

/// Digest used as the ordering key for `key`.
#[inline]
pub fn key_digest(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
