/// Marker opening and closing a fenced code block.
pub(crate) const FENCE: &str = "```";

/// Returns true if the line opens or closes a fenced code block.
///
/// This is a plain prefix test, so info strings such as "```rust" count too.
pub(crate) fn is_fence(line: impl AsRef<[u8]>) -> bool {
    line.as_ref().starts_with(FENCE.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fence() {
        assert!(is_fence("```"));
    }

    #[test]
    fn test_fence_with_info_string() {
        assert!(is_fence("```go"));
        assert!(is_fence("```rust,ignore"));
    }

    #[test]
    fn test_fence_on_raw_bytes() {
        assert!(is_fence(b"```\xff"));
        assert!(!is_fence(b"\xff```"));
    }

    #[test]
    fn test_indented_fence_is_not_a_fence() {
        assert!(!is_fence("  ```"));
        assert!(!is_fence("\t```"));
    }

    #[test]
    fn test_short_or_inline_backticks() {
        assert!(!is_fence("``"));
        assert!(!is_fence("use `foo()` here"));
        assert!(!is_fence(""));
    }
}
