//! PSL Engine - Public Suffix List parsing and domain resolution for Rust
//!
//! This library loads a [Public Suffix List](https://publicsuffix.org/) and
//! splits domain names into their parts:
//! - public suffix (`co.uk`)
//! - registrable domain (`theregister.co.uk`)
//! - the label in front of the suffix (`theregister`)
//!
//! It supports:
//! - ICANN and private sections (private rules are opt-in per query)
//! - wildcard (`*.ck`) and exception (`!www.ck`) rules
//! - punycode copies of internationalised rules
//! - custom suffixes added at runtime
//! - LRU caching of resolution results
//! - downloading and refreshing the upstream list (feature `download`)
//!
//! # Example
//!
//! ```rust
//! use psl_engine_r::{ResolverOptions, SuffixList};
//!
//! let list = "
//! // ===BEGIN ICANN DOMAINS===
//! uk
//! co.uk
//! *.ck
//! !www.ck
//! // ===END ICANN DOMAINS===
//! // ===BEGIN PRIVATE DOMAINS===
//! blogspot.co.uk
//! // ===END PRIVATE DOMAINS===
//! ";
//!
//! let psl = SuffixList::parse_from_string_with(list, ResolverOptions::new().with_seed(1)).unwrap();
//!
//! let res = psl.resolve("media.forums.theregister.co.uk", false).unwrap();
//! assert_eq!(res.suffix, "co.uk");
//! assert_eq!(res.registered_domain.as_deref(), Some("theregister.co.uk"));
//! assert_eq!(res.domain.as_deref(), Some("theregister"));
//!
//! // private rules only apply when asked for
//! let res = psl.resolve("foo.blogspot.co.uk", true).unwrap();
//! assert_eq!(res.suffix, "blogspot.co.uk");
//!
//! // exception rules cut a wildcard short
//! let res = psl.resolve("www.ck", false).unwrap();
//! assert_eq!(res.suffix, "ck");
//! ```
//!
//! # List Format
//!
//! ```text
//! // ===BEGIN ICANN DOMAINS===
//! com          plain rule
//! *.ck         wildcard: any single label in front of "ck" is a suffix
//! !www.ck      exception: "www.ck" is not a suffix, "ck" is
//! // ===END ICANN DOMAINS===
//! ```
//!
//! Only lines between the section markers produce rules. A rule ends at
//! the first whitespace; lines starting with `//` are comments.

pub mod candidates;
pub mod dict;
pub mod error;
pub mod host;
pub mod loader;
pub mod parser;
pub mod resolver;
pub mod types;

// Re-export commonly used items
pub use candidates::{Candidate, CandidateList};
pub use dict::DictStore;
pub use error::{DictErrorCode, DownloadErrorKind, PslError, Result};
pub use host::{encode_input, extract_host, is_domain_valid};
pub use parser::{parse_list, parse_list_from_file, RuleStores};
pub use types::{Resolution, Rule, Section};

// Re-export loader types
#[cfg(feature = "download")]
pub use loader::AutoListLoader;
pub use loader::{FileListLoader, ListLoader, MemoryListLoader, DEFAULT_UPDATE_INTERVAL};

// Re-export resolver types
pub use resolver::{ResolverOptions, SuffixList, DEFAULT_CACHE_SIZE};
