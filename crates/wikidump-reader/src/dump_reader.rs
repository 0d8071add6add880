//! Entry point bundling an archive, its index and a configuration

use crate::Result;
use crate::config::ReaderConfig;
use crate::lookup::{self, LookupStats};
use crate::redirect;
use crate::sequential::IndexedDumpIterator;
use crate::unpacked::UnpackedDumpIterator;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use wikidump_formats::{IndexEntry, IndexReader, Page};

/// Read access to one multistream dump
///
/// Holds paths only. Every query opens its own file handles and releases
/// them before returning (or when the returned iterator is dropped), so a
/// reader can serve any number of queries.
#[derive(Debug, Clone)]
pub struct DumpReader {
    dump: PathBuf,
    index: PathBuf,
    config: ReaderConfig,
}

impl DumpReader {
    /// Create a reader with the default configuration
    ///
    /// `dump` is typically `*-pages-articles-multistream.xml.bz2` and `index`
    /// the matching `*-multistream-index.txt(.bz2)`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(dump: P, index: Q) -> Self {
        Self {
            dump: dump.as_ref().to_path_buf(),
            index: index.as_ref().to_path_buf(),
            config: ReaderConfig::default(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Path of the archive
    pub fn dump_path(&self) -> &Path {
        &self.dump
    }

    /// Path of the index
    pub fn index_path(&self) -> &Path {
        &self.index
    }

    /// Active configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Stream the index entries
    pub fn index_entries(&self) -> Result<IndexReader> {
        Ok(IndexReader::open_with_buffer(
            &self.index,
            self.config.read_buffer_size,
        )?)
    }

    /// Iterate over every page in archive order
    pub fn pages(&self) -> Result<IndexedDumpIterator> {
        IndexedDumpIterator::open(&self.dump, &self.index, self.config.clone())
    }

    /// Iterate over every page without using the index
    pub fn pages_unindexed(&self) -> Result<UnpackedDumpIterator> {
        UnpackedDumpIterator::open(&self.dump, &self.config)
    }

    /// Pages whose index entry satisfies `predicate`
    pub fn find_pages<P>(&self, predicate: P) -> Result<HashSet<Page>>
    where
        P: FnMut(&IndexEntry) -> bool,
    {
        lookup::find_pages(&self.dump, &self.index, &self.config, predicate)
    }

    /// Pages whose index entry satisfies `predicate`, with lookup counters
    pub fn find_pages_with_stats<P>(&self, predicate: P) -> Result<(HashSet<Page>, LookupStats)>
    where
        P: FnMut(&IndexEntry) -> bool,
    {
        lookup::find_pages_with_stats(&self.dump, &self.index, &self.config, predicate)
    }

    /// Pages with the given ids
    pub fn find_pages_by_id(&self, ids: &HashSet<u64>) -> Result<HashSet<Page>> {
        self.find_pages(|entry| ids.contains(&entry.id))
    }

    /// Pages with the given titles
    pub fn find_pages_by_title(&self, titles: &HashSet<String>) -> Result<HashSet<Page>> {
        self.find_pages(|entry| titles.contains(&entry.title))
    }

    /// Pages matching `predicate`, with redirect stubs replaced by their targets
    pub fn find_pages_following_redirects<P>(&self, predicate: P) -> Result<HashSet<Page>>
    where
        P: FnMut(&IndexEntry) -> bool,
    {
        redirect::find_pages_following_redirects(&self.dump, &self.index, &self.config, predicate)
    }

    /// The page described by `entry`
    pub fn page_by_index(&self, entry: &IndexEntry) -> Result<Page> {
        lookup::page_by_index(&self.dump, entry, &self.config)
    }
}
