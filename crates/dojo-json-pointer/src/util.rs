/// Unescapes a JSON Pointer path component.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a pointer string into decoded segments.
///
/// The leading `/` is optional: `"items/0"` and `"/items/0"` address the same
/// location. The empty string is the root.
pub fn parse_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    body.split('/').map(unescape_component).collect()
}

/// Format decoded segments into a canonical pointer string.
pub fn format_pointer<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&escape_component(segment.as_ref()));
    }
    out
}

/// Check if a string consists only of ASCII digits.
///
/// Used to decide whether a missing container should be an array.
pub fn is_integer(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve an array segment to an index.
///
/// `-` addresses the slot past the last element.
pub fn array_index(segment: &str, len: usize) -> Option<usize> {
    if segment == "-" {
        return Some(len);
    }
    if !is_integer(segment) {
        return None;
    }
    segment.parse().ok()
}
