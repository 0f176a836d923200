//! Subject-IRI derivation from note paths, shared by note loading and
//! wiki-link resolution so the two always agree on a target's identity.

/// Normalize a vault-relative path (or a wiki-link target) to the form
/// used inside a `note://` IRI: forward slashes, no leading `./`, and no
/// file extension. Case is never folded, matching the host's
/// case-preserving filesystem.
pub fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let mut trimmed = slashed.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    let last_segment_start = trimmed.rfind('/').map(|i| i + 1).unwrap_or(0);
    let file_name = &trimmed[last_segment_start..];
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}", &trimmed[..last_segment_start], &file_name[..dot]),
        _ => trimmed.to_string(),
    }
}

/// The `note://` subject IRI for a normalized vault-relative path.
pub fn note_iri(normalized_path: &str) -> String {
    format!("note://{normalized_path}")
}
