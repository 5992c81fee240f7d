//! The document: an opened compound file and its lazily built directory tree.

use super::config::CfbOptions;
use super::consts::HEADER_SIZE;
use super::fat::AllocationTable;
use super::header::Header;
use super::minifat::MiniAllocation;
use super::sector::{SectorStore, read_block};
use super::stream::StreamReader;
use super::tree::{DirectoryEntry, DirectoryReader, DirectoryTree};
use crate::common::{Error, Result};
use bytes::Bytes;
use log::debug;
use once_cell::unsync::OnceCell;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// State built on first access to the directory.
#[derive(Debug)]
pub(crate) struct LoadedTree {
    pub(crate) tree: DirectoryTree,
    pub(crate) mini: Option<MiniAllocation>,
}

/// An opened compound file.
///
/// Opening reads the whole container, validates the header and builds the
/// FAT. The mini FAT and the directory tree are built on the first call that
/// needs them ([`root`](Self::root) and everything derived from it), unless
/// [`CfbOptions::eager_directory`] is set.
///
/// # Examples
///
/// ```rust,no_run
/// use cfbtree::Document;
/// use std::io::Read;
///
/// let doc = Document::open_path("report.doc")?;
/// let root = doc.root()?;
/// for child in root.children() {
///     println!("{} ({} bytes)", child.full_name(), child.size());
/// }
///
/// let mut stream = doc.open_stream(&["WordDocument"])?;
/// let mut data = Vec::new();
/// stream.read_to_end(&mut data)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Document {
    header: Header,
    sectors: SectorStore,
    fat: AllocationTable,
    options: CfbOptions,
    loaded: OnceCell<LoadedTree>,
}

impl Document {
    /// Open a compound file from any reader, with default options.
    pub fn open<R: Read>(reader: R) -> Result<Self> {
        Self::open_with_options(reader, CfbOptions::default())
    }

    /// Open a compound file from any reader.
    ///
    /// The reader is consumed to its end.
    pub fn open_with_options<R: Read>(mut reader: R, options: CfbOptions) -> Result<Self> {
        let mut header_block = [0u8; HEADER_SIZE];
        let read = read_block(&mut reader, &mut header_block)?;
        if read < HEADER_SIZE {
            return Err(Error::SectorSize {
                expected: HEADER_SIZE,
                actual: read,
            });
        }
        let header = Header::parse(&header_block)?;

        // Version 4 pads the header out to a full 4096-byte sector.
        let header_sector_len = header.header_sector_len()?;
        let padding = header_sector_len - HEADER_SIZE;
        if padding > 0 {
            let mut skipped = vec![0u8; padding];
            let read = read_block(&mut reader, &mut skipped)?;
            if read < padding {
                return Err(Error::SectorSize {
                    expected: header_sector_len,
                    actual: HEADER_SIZE + read,
                });
            }
        }

        let sectors = SectorStore::read_from(&mut reader, header.sector_size()?)?;
        Self::assemble(header, sectors, options)
    }

    /// Open a compound file held in memory, with default options.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        Self::from_bytes_with_options(data, CfbOptions::default())
    }

    /// Open a compound file held in memory. Sectors are sliced from `data`
    /// without copying.
    pub fn from_bytes_with_options(data: impl Into<Bytes>, options: CfbOptions) -> Result<Self> {
        let data: Bytes = data.into();
        let header = Header::parse(&data)?;
        let body_start = header.header_sector_len()?;
        if data.len() < body_start {
            return Err(Error::SectorSize {
                expected: body_start,
                actual: data.len(),
            });
        }
        let sectors = SectorStore::from_bytes(data.slice(body_start..), header.sector_size()?)?;
        Self::assemble(header, sectors, options)
    }

    /// Open a compound file from disk.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }

    fn assemble(header: Header, sectors: SectorStore, options: CfbOptions) -> Result<Self> {
        let fat = AllocationTable::build(&header, &sectors)?;
        debug!(
            "opened v{} compound file: {} sectors of {} bytes, {} FAT entries",
            header.major_version,
            sectors.len(),
            sectors.sector_size(),
            fat.len()
        );

        let doc = Document {
            header,
            sectors,
            fat,
            options,
            loaded: OnceCell::new(),
        };
        if doc.options.eager_directory {
            doc.loaded()?;
        }
        Ok(doc)
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline]
    pub fn options(&self) -> &CfbOptions {
        &self.options
    }

    /// Number of regular sectors after the header sector.
    #[inline]
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn fat(&self) -> &AllocationTable {
        &self.fat
    }

    /// The mini FAT, or `None` when the header declares none.
    pub fn minifat(&self) -> Result<Option<&AllocationTable>> {
        Ok(self.loaded()?.mini.as_ref().map(|mini| &mini.table))
    }

    /// The root storage. The first call builds the mini FAT and directory
    /// tree; a failure is reported again by every later call.
    pub fn root(&self) -> Result<DirectoryEntry<'_>> {
        let loaded = self.loaded()?;
        Ok(DirectoryEntry::new(self, loaded, 0))
    }

    /// Visit every entry, root first, parents before children.
    pub fn walk<'a, F>(&'a self, f: F) -> Result<()>
    where
        F: FnMut(DirectoryEntry<'a>),
    {
        self.root()?.walk(f);
        Ok(())
    }

    /// Look up an entry by path components below the root, ignoring ASCII case.
    pub fn find(&self, path: &[&str]) -> Result<Option<DirectoryEntry<'_>>> {
        Ok(self.root()?.find(path))
    }

    /// Slash-joined paths of every stream, in walk order.
    pub fn list_streams(&self) -> Result<Vec<String>> {
        let mut streams = Vec::new();
        self.walk(|entry| {
            if entry.is_stream() {
                streams.push(entry.path().join("/"));
            }
        })?;
        Ok(streams)
    }

    /// Open the stream at `path` below the root.
    pub fn open_stream(&self, path: &[&str]) -> Result<StreamReader> {
        match self.find(path)? {
            Some(entry) => entry.open_stream(),
            None => Err(Error::EntryNotFound(path.join("/"))),
        }
    }

    /// Pick the allocation path for a stream and build its reader.
    ///
    /// Streams below the cutoff use the mini FAT when one exists; without a
    /// mini FAT every stream is read from regular sectors.
    pub(crate) fn stream(
        &self,
        start: u32,
        size: u64,
        mini: Option<&MiniAllocation>,
    ) -> Result<StreamReader> {
        let cutoff = u64::from(self.header.mini_stream_cutoff);
        match mini {
            Some(mini) if size > 0 && size < cutoff => StreamReader::mini(mini, start, size),
            _ => StreamReader::regular(&self.fat, &self.sectors, start, size),
        }
    }

    fn loaded(&self) -> Result<&LoadedTree> {
        self.loaded.get_or_try_init(|| self.load_tree())
    }

    fn load_tree(&self) -> Result<LoadedTree> {
        let directory = StreamReader::regular(
            &self.fat,
            &self.sectors,
            self.header.first_dir_sector,
            0,
        )?;
        let mut reader = DirectoryReader::new(
            directory,
            self.header.byte_order(),
            self.header.major_version,
        );

        let root = reader.record(0)?;
        if self.options.validate_entries {
            root.validate(0)?;
        }
        let mini = MiniAllocation::build(
            &self.header,
            &self.fat,
            &self.sectors,
            root.start_sector,
            root.size,
        )?;
        if root.has_siblings() {
            return Err(Error::RootSibling);
        }

        let tree = DirectoryTree::build(root, &mut reader, &self.options)?;
        debug!(
            "directory tree built: {} entries from {} records",
            tree.len(),
            reader.count()
        );
        Ok(LoadedTree { tree, mini })
    }
}
