//! Target path mapping.

/// The mapping key of a proxy's primary target.
pub const DEFAULT_MAPPING_KEY: &str = "default";

/// Path suffix for a target mapping key.
///
/// The default mapping maps to the bare proxy path; any other key is
/// appended as a path segment.
pub fn mapping_path(mapping_key: &str) -> String {
    if mapping_key.eq_ignore_ascii_case(DEFAULT_MAPPING_KEY) {
        String::new()
    } else {
        format!("/{mapping_key}")
    }
}
