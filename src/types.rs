use serde::Serialize;

/// Section of a suffix list a rule was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `===BEGIN ICANN DOMAINS===` .. `===END ICANN DOMAINS===`
    Icann,
    /// `===BEGIN PRIVATE DOMAINS===` .. `===END PRIVATE DOMAINS===`
    Private,
}

/// A suffix rule indexed by a dictionary store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Lowercase pattern, `*.` prefixed for wildcards, without the `!` marker
    pub name: String,
    /// Rule came from the private section
    pub is_private: bool,
    /// Exception rule (`!` in the list); always wins selection
    pub has_priority: bool,
}

impl Rule {
    /// Create a new rule
    pub fn new(name: impl Into<String>, is_private: bool, has_priority: bool) -> Self {
        Self {
            name: name.into(),
            is_private,
            has_priority,
        }
    }

    /// Check if this is a `*.tail` rule
    pub fn is_wildcard(&self) -> bool {
        self.name.starts_with("*.")
    }

    /// The literal part of the name (without the `*.` prefix)
    pub fn tail(&self) -> &str {
        self.name.strip_prefix("*.").unwrap_or(&self.name)
    }

    /// Number of labels in the name, the wildcard label included
    pub fn label_count(&self) -> usize {
        self.name.bytes().filter(|b| *b == b'.').count() + 1
    }

    /// Copy of this rule under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_private: self.is_private,
            has_priority: self.has_priority,
        }
    }
}

/// Outcome of resolving a domain against a suffix list.
///
/// `domain`, `registered_domain` and `fqdn` are either all present or all
/// absent (absent when the input is itself a public suffix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Public suffix, e.g. `co.uk`
    pub suffix: String,
    /// Registrable domain: `domain` + "." + `suffix`
    pub registered_domain: Option<String>,
    /// Label immediately in front of the suffix
    pub domain: Option<String>,
    /// The input exactly as given
    pub fqdn: Option<String>,
}

impl Resolution {
    /// Resolution for an input that is a public suffix itself
    pub fn suffix_only(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            registered_domain: None,
            domain: None,
            fqdn: None,
        }
    }

    /// Check whether a registrable domain was found
    pub fn has_domain(&self) -> bool {
        self.domain.is_some()
    }
}

/// Cache key for resolution results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub domain: String,
    pub use_private: bool,
}

impl CacheKey {
    pub fn new(domain: &str, use_private: bool) -> Self {
        Self {
            // not lowercased: fqdn keeps the caller's casing
            domain: domain.to_string(),
            use_private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_shape() {
        let rule = Rule::new("*.kawasaki.jp", false, false);
        assert!(rule.is_wildcard());
        assert_eq!(rule.tail(), "kawasaki.jp");
        assert_eq!(rule.label_count(), 3);

        let rule = Rule::new("com", false, false);
        assert!(!rule.is_wildcard());
        assert_eq!(rule.tail(), "com");
        assert_eq!(rule.label_count(), 1);
    }

    #[test]
    fn test_renamed_keeps_flags() {
        let rule = Rule::new("教育.hk", true, true);
        let idna = rule.renamed("xn--wcvs22d.hk");
        assert_eq!(idna.name, "xn--wcvs22d.hk");
        assert!(idna.is_private);
        assert!(idna.has_priority);
    }

    #[test]
    fn test_resolution_json() {
        let res = Resolution::suffix_only("com");
        assert!(!res.has_domain());
        let json = serde_json::to_string(&res).unwrap();
        assert_eq!(
            json,
            r#"{"suffix":"com","registered_domain":null,"domain":null,"fqdn":null}"#
        );
    }
}
