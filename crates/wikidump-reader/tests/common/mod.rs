//! On-disk multistream dump fixtures

#![allow(dead_code)]

use bzip2::Compression;
use bzip2::write::BzEncoder;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DUMP_HEADER: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/" xml:lang="en">
  <siteinfo>
    <sitename>Wikipedia</sitename>
    <dbname>enwiki</dbname>
    <base>https://en.wikipedia.org/wiki/Main_Page</base>
    <namespaces>
      <namespace key="0" case="first-letter" />
    </namespaces>
  </siteinfo>
"#;

pub const DUMP_FOOTER: &str = "</mediawiki>\n";

/// Page markup the way the dump exporter writes it
pub fn page_xml(id: u64, title: &str, text: &str) -> String {
    let mut xml = String::new();
    writeln!(xml, "  <page>").unwrap();
    writeln!(xml, "    <title>{title}</title>").unwrap();
    writeln!(xml, "    <ns>0</ns>").unwrap();
    writeln!(xml, "    <id>{id}</id>").unwrap();
    writeln!(xml, "    <revision>").unwrap();
    writeln!(xml, "      <id>{}</id>", id + 90_000).unwrap();
    writeln!(xml, "      <timestamp>2024-01-01T00:00:00Z</timestamp>").unwrap();
    writeln!(xml, "      <model>wikitext</model>").unwrap();
    writeln!(xml, "      <format>text/x-wiki</format>").unwrap();
    if text.is_empty() {
        writeln!(xml, r#"      <text bytes="0" xml:space="preserve" />"#).unwrap();
    } else {
        writeln!(
            xml,
            r#"      <text bytes="{}" xml:space="preserve">{text}</text>"#,
            text.len()
        )
        .unwrap();
    }
    writeln!(xml, "      <sha1>phoiac9h4m842xq45sp7s6u21eteeq1</sha1>").unwrap();
    writeln!(xml, "    </revision>").unwrap();
    writeln!(xml, "  </page>").unwrap();
    xml
}

/// Compress `data` as one bzip2 stream
pub fn bz2(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A page placed into a fixture block
#[derive(Debug, Clone)]
pub struct FixturePage {
    pub id: u64,
    pub title: String,
    pub text: String,
}

impl FixturePage {
    pub fn new(id: u64, title: &str, text: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

/// Builder for a multistream archive and its index
#[derive(Debug, Default)]
pub struct DumpBuilder {
    blocks: Vec<Vec<FixturePage>>,
    compress_index: bool,
    extra_index_lines: Vec<String>,
}

/// Files written by [`DumpBuilder::build`]
#[derive(Debug)]
pub struct Fixture {
    pub dir: TempDir,
    pub dump: PathBuf,
    pub index: PathBuf,
    pub plain_dump: PathBuf,
    pub offsets: Vec<u64>,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block holding `pages`
    pub fn block(mut self, pages: &[(u64, &str, &str)]) -> Self {
        self.blocks.push(
            pages
                .iter()
                .map(|(id, title, text)| FixturePage::new(*id, title, text))
                .collect(),
        );
        self
    }

    /// Append a block holding pre-built pages
    pub fn block_of(mut self, pages: Vec<FixturePage>) -> Self {
        self.blocks.push(pages);
        self
    }

    /// Write the index bzip2-compressed
    pub fn compressed_index(mut self) -> Self {
        self.compress_index = true;
        self
    }

    /// Append a raw line to the index
    pub fn index_line(mut self, line: &str) -> Self {
        self.extra_index_lines.push(line.to_string());
        self
    }

    pub fn build(self) -> Fixture {
        let dir = tempfile::tempdir().unwrap();

        let mut archive = bz2(DUMP_HEADER.as_bytes());
        let mut plain = DUMP_HEADER.to_string();
        let mut index = String::new();
        let mut offsets = Vec::new();

        for block in &self.blocks {
            let offset = archive.len() as u64;
            offsets.push(offset);

            let mut xml = String::new();
            for page in block {
                xml.push_str(&page_xml(page.id, &page.title, &page.text));
                writeln!(index, "{offset}:{}:{}", page.id, page.title).unwrap();
            }
            plain.push_str(&xml);
            archive.extend(bz2(xml.as_bytes()));
        }
        for line in &self.extra_index_lines {
            writeln!(index, "{line}").unwrap();
        }

        archive.extend(bz2(DUMP_FOOTER.as_bytes()));
        plain.push_str(DUMP_FOOTER);

        let dump = dir.path().join("testwiki-pages-articles-multistream.xml.bz2");
        std::fs::write(&dump, archive).unwrap();

        let plain_dump = dir.path().join("testwiki-pages-articles.xml");
        std::fs::write(&plain_dump, plain).unwrap();

        let index_path = if self.compress_index {
            let path = dir
                .path()
                .join("testwiki-pages-articles-multistream-index.txt.bz2");
            std::fs::write(&path, bz2(index.as_bytes())).unwrap();
            path
        } else {
            let path = dir
                .path()
                .join("testwiki-pages-articles-multistream-index.txt");
            std::fs::write(&path, index).unwrap();
            path
        };

        Fixture {
            dir,
            dump,
            index: index_path,
            plain_dump,
            offsets,
        }
    }
}

/// Archive from the index example: Cat and Dog share a block, Bird follows
pub fn animals() -> Fixture {
    DumpBuilder::new()
        .block(&[(1, "Cat", "Cats purr."), (2, "Dog", "Dogs bark.")])
        .block(&[(3, "Bird", "Birds fly.")])
        .build()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
