//! Builds the `file:` URI used to `ATTACH` an input read-only, and the percent-encoding it needs.

use std::path::Path;

/// Percent-encodes any byte that is `%`, `#`, `?`, a control byte `<= 0x20`, or a byte `>= 0x7F`.
/// Everything else (including `/`) passes through unchanged, since attached paths are always
/// relative and the separators must remain literal for SQLite to resolve them.
pub fn percent_encode_path(path: &Path) -> String {
    let bytes = path.as_os_str().as_encoded_bytes();
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == b'%' || b == b'#' || b == b'?' || b <= 0x20 || b >= 0x7F {
            out.push_str(&format!("%{:02X}", b));
        } else {
            out.push(b as char);
        }
    }
    out
}

/// Builds the `file:...?mode=ro` URI passed as the bound parameter of `ATTACH DATABASE ?1 AS
/// <alias>`. A leading `/` (unreachable today since the registry rejects absolute paths) would
/// select the authority form `file://`; anything else uses plain `file:`.
pub fn readonly_uri(path: &Path) -> String {
    let encoded = percent_encode_path(path);
    let raw = path.as_os_str().as_encoded_bytes();
    if raw.first() == Some(&b'/') {
        format!("file://{}?mode=ro", encoded)
    } else {
        format!("file:{}?mode=ro", encoded)
    }
}
