//! Lookups that follow redirect stubs
//!
//! Redirects are followed one hop: a stub pointing at another stub is
//! resolved to that second stub, not beyond it.

use crate::Result;
use crate::config::ReaderConfig;
use crate::lookup::find_pages_with_stats;
use std::collections::HashSet;
use std::path::Path;
use wikidump_formats::{IndexEntry, Page};

/// Find pages matching `predicate`, replacing redirect stubs by their targets
///
/// The first lookup selects pages by `predicate`. Redirect stubs among them
/// are swapped for the pages titled like their targets, found by a second
/// lookup over the index.
pub fn find_pages_following_redirects<P>(
    dump: &Path,
    index: &Path,
    config: &ReaderConfig,
    predicate: P,
) -> Result<HashSet<Page>>
where
    P: FnMut(&IndexEntry) -> bool,
{
    let (found, _) = find_pages_with_stats(dump, index, config, predicate)?;
    let (redirects, mut pages): (HashSet<Page>, HashSet<Page>) = found
        .into_iter()
        .partition(|page| config.redirect.is_redirect(page));

    let targets: HashSet<String> = redirects
        .iter()
        .filter_map(|page| match config.redirect.target(page) {
            Ok(target) => Some(target.to_string()),
            Err(e) => {
                tracing::warn!(id = page.id, error = %e, "redirect stub without target");
                None
            }
        })
        .collect();

    if targets.is_empty() {
        return Ok(pages);
    }

    tracing::debug!(
        redirects = redirects.len(),
        targets = targets.len(),
        "resolving redirect targets"
    );
    let (resolved, _) =
        find_pages_with_stats(dump, index, config, |entry| targets.contains(&entry.title))?;
    pages.extend(resolved);

    Ok(pages)
}
