pub mod mail;
pub mod payments;
pub mod sms;

/// Trims trailing slashes so client code can always join with `/path`.
pub(crate) fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_lose_trailing_slashes() {
        assert_eq!(normalize_base_url("http://x/"), "http://x");
        assert_eq!(normalize_base_url("http://x//"), "http://x");
        assert_eq!(normalize_base_url("http://x"), "http://x");
    }
}
