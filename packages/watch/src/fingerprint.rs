use std::fmt;

/// BLAKE3 digest of an extracted region.
///
/// Used only to notice that a page changed between two passes. Equal input
/// bytes always give the same fingerprint, on every platform and run.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First 12 hex characters, enough to tell fingerprints apart in logs
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_fingerprint() {
        let a = Fingerprint::of("<table><tr><td>42</td></tr></table>");
        let b = Fingerprint::of("<table><tr><td>42</td></tr></table>");
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn one_byte_difference_changes_fingerprint() {
        let a = Fingerprint::of("<td>42</td>");
        let b = Fingerprint::of("<td>43</td>");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_region_is_hashable() {
        let empty = Fingerprint::of("");
        assert_eq!(empty, Fingerprint::of(""));
        assert_ne!(empty, Fingerprint::of(" "));
        // Well-known BLAKE3 digest of the empty input
        assert_eq!(
            empty.to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn hex_forms() {
        let fp = Fingerprint::of("X");
        assert_eq!(fp.to_hex().len(), 64);
        assert_eq!(fp.short().len(), 12);
        assert!(fp.to_hex().starts_with(&fp.short()));
        assert_eq!(fp.to_string(), fp.to_hex());
    }
}
