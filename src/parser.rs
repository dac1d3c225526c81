use std::path::Path;

use log::{debug, trace};
use rand::Rng;

use crate::dict::DictStore;
use crate::error::Result;
use crate::loader::{FileListLoader, ListLoader};
use crate::types::{Rule, Section};

pub const BEGIN_ICANN: &str = "===BEGIN ICANN DOMAINS===";
pub const END_ICANN: &str = "===END ICANN DOMAINS===";
pub const BEGIN_PRIVATE: &str = "===BEGIN PRIVATE DOMAINS===";
pub const END_PRIVATE: &str = "===END PRIVATE DOMAINS===";

/// The two rule stores built from one suffix list.
#[derive(Debug)]
pub struct RuleStores {
    /// Rules from the ICANN section
    pub public: DictStore<Rule>,
    /// Rules from the private section
    pub private: DictStore<Rule>,
}

impl RuleStores {
    /// Create two empty stores, drawing both permutations from `rng`.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Ok(Self {
            public: DictStore::with_rng(rng)?,
            private: DictStore::with_rng(rng)?,
        })
    }

    /// Store for a section
    pub fn store_mut(&mut self, section: Section) -> &mut DictStore<Rule> {
        match section {
            Section::Icann => &mut self.public,
            Section::Private => &mut self.private,
        }
    }
}

/// Parse suffix-list text into public and private rule stores.
///
/// Only lines inside an open section produce rules. Section markers are
/// recognised anywhere in a line, so the usual `// ===BEGIN ...===` comment
/// lines open and close sections.
pub fn parse_list<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<RuleStores> {
    let mut stores = RuleStores::new(rng)?;
    let mut section: Option<Section> = None;
    let mut rules = 0usize;
    let mut idna = 0usize;

    for line in text.lines() {
        let line = line.trim_end();
        section = next_section(line, section);

        if line.is_empty() || line.starts_with("//") || is_marker(line) {
            continue;
        }
        let Some(current) = section else {
            continue;
        };
        let Some(rule) = parse_rule_line(line, current) else {
            continue;
        };

        rules += 1;
        if insert_rule(stores.store_mut(current), rule)? {
            idna += 1;
        }
    }

    debug!(
        "Parsed {} rules ({} public keys, {} private keys, {} IDNA duplicates)",
        rules,
        stores.public.len(),
        stores.private.len(),
        idna
    );
    Ok(stores)
}

/// Parse a suffix-list file.
pub fn parse_list_from_file<R: Rng + ?Sized>(
    path: impl AsRef<Path>,
    rng: &mut R,
) -> Result<RuleStores> {
    let text = FileListLoader::new(path).load_list()?;
    parse_list(&text, rng)
}

/// Section state after reading `line`.
fn next_section(line: &str, current: Option<Section>) -> Option<Section> {
    if line.contains(BEGIN_ICANN) {
        Some(Section::Icann)
    } else if line.contains(BEGIN_PRIVATE) {
        Some(Section::Private)
    } else if (line.contains(END_ICANN) && current == Some(Section::Icann))
        || (line.contains(END_PRIVATE) && current == Some(Section::Private))
    {
        None
    } else {
        current
    }
}

/// Check if `line` carries a section marker
fn is_marker(line: &str) -> bool {
    [BEGIN_ICANN, END_ICANN, BEGIN_PRIVATE, END_PRIVATE]
        .iter()
        .any(|marker| line.contains(marker))
}

/// Parse one rule line: `[!]<pattern>`, ending at the first whitespace.
pub fn parse_rule_line(line: &str, section: Section) -> Option<Rule> {
    let token = line.split_whitespace().next()?;
    let (name, has_priority) = match token.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if name.is_empty() {
        return None;
    }
    Some(Rule::new(
        name.to_ascii_lowercase(),
        section == Section::Private,
        has_priority,
    ))
}

/// Insert a rule and, when its punycode form differs, a copy under that
/// name. Returns whether the copy was added.
pub fn insert_rule(store: &mut DictStore<Rule>, rule: Rule) -> Result<bool> {
    let ascii = to_ascii_name(&rule.name).filter(|a| !a.eq_ignore_ascii_case(&rule.name));
    let duplicate = ascii.map(|a| rule.renamed(a));

    let name = rule.name.clone();
    store.set(&name, rule)?;

    match duplicate {
        Some(dup) => {
            let name = dup.name.clone();
            store.set(&name, dup)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Punycode form of a rule name; `None` for ASCII names or when the
/// conversion fails. The wildcard label is kept as is.
pub fn to_ascii_name(name: &str) -> Option<String> {
    if name.is_ascii() {
        return None;
    }
    let (prefix, tail) = match name.strip_prefix("*.") {
        Some(tail) => ("*.", tail),
        None => ("", name),
    };
    match idna::domain_to_ascii(tail) {
        Ok(ascii) => Some(format!("{}{}", prefix, ascii)),
        Err(e) => {
            trace!("Skipping IDNA form of rule '{}': {:?}", name, e);
            None
        }
    }
}
