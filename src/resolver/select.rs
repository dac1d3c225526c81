//! Candidate collection, tie-break and result derivation.
//!
//! Collection order is part of the algorithm: label suffixes from longest
//! to shortest, and for each suffix public-exact, private-exact,
//! public-wildcard, private-wildcard. Selection keeps the first candidate
//! reaching a new maximum label count, so reordering changes results.

use crate::candidates::CandidateList;
use crate::dict::DictStore;
use crate::parser::RuleStores;
use crate::types::{Resolution, Rule};

/// Collect every rule matching a label suffix of `domain`.
pub(crate) fn collect<'a>(
    stores: &'a RuleStores,
    domain: &str,
    use_private: bool,
) -> CandidateList<'a, Rule> {
    let mut candidates = CandidateList::new();
    let mut start = 0;

    loop {
        let suffix = &domain[start..];
        // a trailing or doubled dot leaves nothing to look up
        if !suffix.is_empty() {
            let wildcard = format!("*.{}", suffix);
            push_match(&mut candidates, &stores.public, suffix);
            if use_private {
                push_match(&mut candidates, &stores.private, suffix);
            }
            push_match(&mut candidates, &stores.public, &wildcard);
            if use_private {
                push_match(&mut candidates, &stores.private, &wildcard);
            }
        }

        match suffix.find('.') {
            Some(pos) => start += pos + 1,
            None => break,
        }
    }

    candidates
}

fn push_match<'a>(candidates: &mut CandidateList<'a, Rule>, store: &'a DictStore<Rule>, key: &str) {
    if let Ok(rule) = store.get_nocase(key) {
        candidates.push_borrowed(rule);
    }
}

/// Pick the winning rule.
///
/// The first exception rule wins outright. Otherwise the first rule with
/// the highest label count wins; a wildcard that would match an empty
/// label (the domain is no longer than the wildcard's tail) is skipped.
pub(crate) fn choose_best<'l>(candidates: &'l CandidateList<'_, Rule>, domain: &str) -> Option<&'l Rule> {
    let mut best: Option<&Rule> = None;
    let mut level = 0;

    for rule in candidates.iter() {
        if rule.has_priority {
            return Some(rule);
        }
        let rule_level = rule.label_count();
        if rule_level > level || best.is_none() {
            if rule.is_wildcard() && domain.len() + 2 <= rule.name.len() {
                continue;
            }
            level = rule_level;
            best = Some(rule);
        }
    }

    best
}

/// Derive the resolution for `domain` from the selected rule.
///
/// Returns `None` when the rule leaves no suffix (a single-label exception
/// rule, or a wildcard with no label in front of its tail).
pub(crate) fn derive(rule: &Rule, domain: &str) -> Option<Resolution> {
    let tail = rule.tail();
    let labels: Vec<&str> = domain.split('.').collect();

    let suffix = if rule.has_priority {
        // the excepted label is not part of the suffix
        match tail.split_once('.') {
            Some((_, rest)) if !rest.is_empty() => rest.to_string(),
            _ => return None,
        }
    } else if rule.is_wildcard() {
        let tail_labels = tail.split('.').count();
        let index = labels.len().checked_sub(tail_labels + 1)?;
        format!("{}.{}", labels[index], tail)
    } else {
        tail.to_string()
    };

    let leading = labels.len().saturating_sub(suffix.split('.').count());
    let label = match leading.checked_sub(1).map(|i| labels[i]) {
        Some(label) if !label.is_empty() => label,
        _ => return Some(Resolution::suffix_only(suffix)),
    };

    Some(Resolution {
        registered_domain: Some(format!("{}.{}", label, suffix)),
        domain: Some(label.to_string()),
        fqdn: Some(domain.to_string()),
        suffix,
    })
}
