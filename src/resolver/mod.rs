//! Suffix resolver.
//!
//! [`SuffixList`] owns the public and private rule stores built from one
//! suffix list and answers resolution queries against them.

mod select;

use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dict::DictStore;
use crate::error::{PslError, Result};
use crate::loader::{FileListLoader, ListLoader};
use crate::parser::{insert_rule, parse_list, parse_rule_line, RuleStores};
use crate::types::{CacheKey, Resolution, Rule, Section};

/// Default LRU cache size
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Resolver options.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// LRU cache size for resolution results (0 disables the cache)
    pub cache_size: usize,
    /// Seed for the stores' slot permutations; OS-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            seed: None,
        }
    }
}

impl ResolverOptions {
    /// Create new resolver options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Use a fixed seed for the slot permutations.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A loaded suffix list.
///
/// Resolution only reads the rule stores, so a `SuffixList` can be shared
/// between threads; the result cache has its own lock. Adding custom
/// suffixes needs `&mut self`.
pub struct SuffixList {
    stores: RuleStores,
    cache: Option<Mutex<LruCache<CacheKey, Option<Resolution>>>>,
}

impl SuffixList {
    /// Parse suffix-list text with default options.
    pub fn parse_from_string(text: &str) -> Result<Self> {
        Self::parse_from_string_with(text, ResolverOptions::default())
    }

    /// Parse suffix-list text.
    pub fn parse_from_string_with(text: &str, options: ResolverOptions) -> Result<Self> {
        let stores = match options.seed {
            Some(seed) => parse_list(text, &mut StdRng::seed_from_u64(seed))?,
            None => parse_list(text, &mut rand::rng())?,
        };
        Ok(Self::from_stores(stores, options.cache_size))
    }

    /// Parse a suffix-list file with default options.
    pub fn parse_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_from_file_with(path, ResolverOptions::default())
    }

    /// Parse a suffix-list file.
    pub fn parse_from_file_with(path: impl AsRef<Path>, options: ResolverOptions) -> Result<Self> {
        Self::from_loader(&FileListLoader::new(path), options)
    }

    /// Load the list text from a [`ListLoader`] and parse it.
    pub fn from_loader(loader: &dyn ListLoader, options: ResolverOptions) -> Result<Self> {
        let text = loader.load_list()?;
        Self::parse_from_string_with(&text, options)
    }

    fn from_stores(stores: RuleStores, cache_size: usize) -> Self {
        let cache = NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size)));
        Self { stores, cache }
    }

    /// Resolve `domain` into its suffix, registrable domain and labels.
    ///
    /// `domain` must already be ASCII (punycode) or match the list's
    /// Unicode rules literally; it is not transcoded here. With
    /// `use_private` set, rules from the private section are considered
    /// as well.
    pub fn resolve(&self, domain: &str, use_private: bool) -> Result<Resolution> {
        if domain.is_empty() {
            return Err(PslError::EmptyDomain);
        }
        let Some(cache) = &self.cache else {
            return self.find_resolution(domain, use_private);
        };

        let key = CacheKey::new(domain, use_private);
        let mut cache = cache.lock();

        if let Some(cached) = cache.get(&key) {
            return cached
                .clone()
                .ok_or_else(|| PslError::NoMatch(domain.to_string()));
        }

        // Resolution is CPU-only, so it runs under the cache lock
        let result = self.find_resolution(domain, use_private);
        match &result {
            Ok(resolution) => {
                cache.put(key, Some(resolution.clone()));
            }
            Err(PslError::NoMatch(_)) => {
                cache.put(key, None);
            }
            Err(_) => {}
        }
        result
    }

    /// Resolve without consulting the cache
    fn find_resolution(&self, domain: &str, use_private: bool) -> Result<Resolution> {
        let candidates = select::collect(&self.stores, domain, use_private);
        if candidates.is_empty() {
            debug!("No rule matches {}", domain);
            return Err(PslError::NoMatch(domain.to_string()));
        }

        select::choose_best(&candidates, domain)
            .and_then(|rule| select::derive(rule, domain))
            .ok_or_else(|| PslError::NoMatch(domain.to_string()))
    }

    /// Add a suffix to the public rules.
    ///
    /// The suffix is read like a list line, so `!` and `*.` keep their
    /// meaning. Its punycode form is added too.
    pub fn add_custom_suffix(&mut self, suffix: &str) -> Result<()> {
        let rule = parse_rule_line(suffix, Section::Icann)
            .ok_or_else(|| PslError::InvalidRule(format!("empty custom suffix '{}'", suffix)))?;
        debug!("Adding custom suffix {}", rule.name);
        insert_rule(&mut self.stores.public, rule)?;
        self.clear_cache();
        Ok(())
    }

    /// Rules from the ICANN section (and custom suffixes)
    pub fn public_rules(&self) -> &DictStore<Rule> {
        &self.stores.public
    }

    /// Rules from the private section
    pub fn private_rules(&self) -> &DictStore<Rule> {
        &self.stores.private
    }

    /// Total number of indexed keys, punycode copies included
    pub fn rule_count(&self) -> usize {
        self.stores.public.len() + self.stores.private.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

impl fmt::Debug for SuffixList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuffixList")
            .field("public", &self.stores.public.len())
            .field("private", &self.stores.private.len())
            .field("cached", &self.cache.as_ref().map(|c| c.lock().len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
// ===BEGIN ICANN DOMAINS===
com
jp
kawasaki.jp
*.kawasaki.jp
!city.kawasaki.jp
*.ck
!www.ck
// ===END ICANN DOMAINS===
// ===BEGIN PRIVATE DOMAINS===
blogspot.com
// ===END PRIVATE DOMAINS===
";

    fn list() -> SuffixList {
        SuffixList::parse_from_string_with(LIST, ResolverOptions::new().with_seed(11)).unwrap()
    }

    #[test]
    fn test_resolve_plain() {
        let res = list().resolve("google.com", false).unwrap();
        assert_eq!(res.suffix, "com");
        assert_eq!(res.domain.as_deref(), Some("google"));
        assert_eq!(res.registered_domain.as_deref(), Some("google.com"));
        assert_eq!(res.fqdn.as_deref(), Some("google.com"));
    }

    #[test]
    fn test_resolve_suffix_itself() {
        let res = list().resolve("com", false).unwrap();
        assert_eq!(res, Resolution::suffix_only("com"));
    }

    #[test]
    fn test_resolve_wildcard_and_exception() {
        let psl = list();

        let res = psl.resolve("www.example.ck", true).unwrap();
        assert_eq!(res.suffix, "example.ck");
        assert_eq!(res.registered_domain.as_deref(), Some("www.example.ck"));

        let res = psl.resolve("www.ck", false).unwrap();
        assert_eq!(res.suffix, "ck");
        assert_eq!(res.domain.as_deref(), Some("www"));

        let res = psl.resolve("foo.city.kawasaki.jp", false).unwrap();
        assert_eq!(res.suffix, "kawasaki.jp");
        assert_eq!(res.registered_domain.as_deref(), Some("city.kawasaki.jp"));

        let res = psl.resolve("foo.town.kawasaki.jp", false).unwrap();
        assert_eq!(res.suffix, "town.kawasaki.jp");
        assert_eq!(res.registered_domain.as_deref(), Some("foo.town.kawasaki.jp"));
    }

    #[test]
    fn test_private_flag() {
        let psl = list();
        let res = psl.resolve("foo.blogspot.com", false).unwrap();
        assert_eq!(res.suffix, "com");
        let res = psl.resolve("foo.blogspot.com", true).unwrap();
        assert_eq!(res.suffix, "blogspot.com");
        assert_eq!(res.registered_domain.as_deref(), Some("foo.blogspot.com"));
    }

    #[test]
    fn test_fqdn_keeps_input_casing() {
        let res = list().resolve("WWW.Google.COM", false).unwrap();
        assert_eq!(res.suffix, "com");
        assert_eq!(res.domain.as_deref(), Some("Google"));
        assert_eq!(res.fqdn.as_deref(), Some("WWW.Google.COM"));
    }

    #[test]
    fn test_no_match() {
        let psl = list();
        assert!(matches!(psl.resolve("example.org", false), Err(PslError::NoMatch(_))));
        // the only candidate is a wildcard with nothing to fill it
        assert!(matches!(psl.resolve("ck", false), Err(PslError::NoMatch(_))));
        assert!(matches!(psl.resolve("", false), Err(PslError::EmptyDomain)));
    }

    #[test]
    fn test_cached_results_are_stable() {
        let psl = list();
        let first = psl.resolve("a.b.google.com", false).unwrap();
        let second = psl.resolve("a.b.google.com", false).unwrap();
        assert_eq!(first, second);

        assert!(psl.resolve("example.org", false).is_err());
        assert!(psl.resolve("example.org", false).is_err());

        psl.clear_cache();
        assert_eq!(psl.resolve("a.b.google.com", false).unwrap(), first);
    }

    #[test]
    fn test_uncached_list() {
        let psl =
            SuffixList::parse_from_string_with(LIST, ResolverOptions::new().with_cache_size(0))
                .unwrap();
        assert_eq!(psl.resolve("google.com", false).unwrap().suffix, "com");
        assert!(format!("{:?}", psl).contains("cached: None"));
    }

    #[test]
    fn test_add_custom_suffix() {
        let mut psl = list();
        assert_eq!(psl.resolve("foo.internal.com", false).unwrap().suffix, "com");

        psl.add_custom_suffix(" internal.com ").unwrap();
        let res = psl.resolve("foo.internal.com", false).unwrap();
        assert_eq!(res.suffix, "internal.com");
        assert_eq!(res.registered_domain.as_deref(), Some("foo.internal.com"));

        assert!(matches!(psl.add_custom_suffix("  "), Err(PslError::InvalidRule(_))));
    }

    #[test]
    fn test_seed_gives_same_layout() {
        let a = list();
        let b = list();
        for key in ["com", "kawasaki.jp", "*.ck"] {
            assert_eq!(a.public_rules().slot_index(key), b.public_rules().slot_index(key));
        }
        assert_eq!(a.rule_count(), 8);
    }
}
