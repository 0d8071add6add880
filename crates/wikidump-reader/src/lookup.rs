//! Batched page lookups through the multistream index
//!
//! Decompressing a block dominates the cost of reading a page, and one block
//! holds up to a hundred pages. Lookups therefore select index entries first,
//! group them by block offset, and decompress every distinct block once.

use crate::config::ReaderConfig;
use crate::seek::open_block;
use crate::unpacked::UnpackedDumpIterator;
use crate::{ReaderError, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use wikidump_formats::{Compression, IndexEntry, IndexReader, Page};

/// Counters collected during one lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Index entries read
    pub entries_scanned: u64,
    /// Index entries accepted by the predicate
    pub entries_matched: u64,
    /// Blocks decompressed
    pub blocks_opened: usize,
    /// Pages returned
    pub pages_found: usize,
}

/// Page ids wanted from each block, keyed by block offset
pub type OffsetGroups = BTreeMap<u64, HashSet<u64>>;

/// Drain `entries`, grouping the ids accepted by `predicate` by offset
pub fn group_by_offset<I, P>(entries: I, mut predicate: P) -> Result<(OffsetGroups, LookupStats)>
where
    I: IntoIterator<Item = wikidump_formats::FormatResult<IndexEntry>>,
    P: FnMut(&IndexEntry) -> bool,
{
    let mut groups = OffsetGroups::new();
    let mut stats = LookupStats::default();

    for entry in entries {
        let entry = entry?;
        stats.entries_scanned += 1;
        if predicate(&entry) {
            stats.entries_matched += 1;
            groups.entry(entry.offset).or_default().insert(entry.id);
        }
    }

    Ok((groups, stats))
}

/// Find all pages whose index entry satisfies `predicate`
///
/// Returns the pages together with lookup counters. Result order is not
/// meaningful.
pub fn find_pages_with_stats<P>(
    dump: &Path,
    index: &Path,
    config: &ReaderConfig,
    predicate: P,
) -> Result<(HashSet<Page>, LookupStats)>
where
    P: FnMut(&IndexEntry) -> bool,
{
    config.validate()?;
    let reader = IndexReader::open_with_buffer(index, config.read_buffer_size)?;
    let (groups, mut stats) = group_by_offset(reader, predicate)?;

    let compression = Compression::from_path(dump);
    let mut seen = HashSet::new();
    let mut pages = HashSet::new();

    for (offset, ids) in &groups {
        let block = open_block(dump, *offset, compression, config.read_buffer_size)?;
        stats.blocks_opened += 1;

        let extractor = block.into_pages(
            config.read_buffer_size,
            config.markers.clone(),
            config.max_pages_per_block,
        );
        let mut found = 0;
        for page in extractor {
            let page = page?;
            if ids.contains(&page.id) {
                found += 1;
                if seen.insert(page.id) {
                    pages.insert(page);
                }
                if found == ids.len() {
                    break;
                }
            }
        }
        if found < ids.len() {
            tracing::debug!(offset, wanted = ids.len(), found, "block lacks indexed pages");
        }
    }

    stats.pages_found = pages.len();
    tracing::debug!(
        dump = %dump.display(),
        entries_scanned = stats.entries_scanned,
        entries_matched = stats.entries_matched,
        blocks_opened = stats.blocks_opened,
        pages_found = stats.pages_found,
        "index lookup finished"
    );

    Ok((pages, stats))
}

/// Find all pages whose index entry satisfies `predicate`
pub fn find_pages<P>(
    dump: &Path,
    index: &Path,
    config: &ReaderConfig,
    predicate: P,
) -> Result<HashSet<Page>>
where
    P: FnMut(&IndexEntry) -> bool,
{
    find_pages_with_stats(dump, index, config, predicate).map(|(pages, _)| pages)
}

/// Fetch the page described by a single index entry
///
/// Compressed archives are read from the entry's block only. Plain dumps
/// carry no usable block boundaries and are scanned from the start.
pub fn page_by_index(dump: &Path, entry: &IndexEntry, config: &ReaderConfig) -> Result<Page> {
    config.validate()?;
    let not_found = || ReaderError::PageNotFound {
        id: entry.id,
        offset: entry.offset,
    };

    let compression = Compression::from_path(dump);
    if compression.is_compressed() {
        let block = open_block(dump, entry.offset, compression, config.read_buffer_size)?;
        let extractor = block.into_pages(
            config.read_buffer_size,
            config.markers.clone(),
            config.max_pages_per_block,
        );
        for page in extractor {
            let page = page?;
            if page.id == entry.id {
                return Ok(page);
            }
        }
        return Err(not_found());
    }

    for page in UnpackedDumpIterator::open(dump, config)? {
        let page = page?;
        if page.id == entry.id {
            return Ok(page);
        }
    }
    Err(not_found())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_offset() {
        let entries = vec![
            Ok(IndexEntry::new(100, 1, "Cat")),
            Ok(IndexEntry::new(100, 2, "Dog")),
            Ok(IndexEntry::new(250, 3, "Bird")),
            Ok(IndexEntry::new(400, 4, "Fish")),
        ];

        let (groups, stats) = group_by_offset(entries, |e| e.id != 2)
            .expect("Test operation should succeed");

        assert_eq!(stats.entries_scanned, 4);
        assert_eq!(stats.entries_matched, 3);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&100], HashSet::from([1]));
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![100, 250, 400]);
    }

    #[test]
    fn test_group_by_offset_propagates_index_errors() {
        let entries = vec![
            Ok(IndexEntry::new(100, 1, "Cat")),
            IndexEntry::parse("garbage"),
        ];
        assert!(matches!(
            group_by_offset(entries, |_| true),
            Err(ReaderError::Format(_))
        ));
    }
}
