//! Directory tree reconstruction.
//!
//! Each storage keeps its children as a red-black tree threaded through the
//! left/right sibling ids of the records. The tree is flattened here into an
//! ordered child list per storage; colors are ignored and no name ordering
//! is implied (see [`DirectoryEntry::sorted_children`]).
//!
//! Nodes live in an arena and refer to each other by arena index, so a
//! parent owns its children's slots and each child keeps only the index of
//! its parent.

use super::config::CfbOptions;
use super::consts::*;
use super::directory::{DirectoryRecord, EntryType, FileTime, Guid, NodeColor};
use super::document::{Document, LoadedTree};
use super::stream::StreamReader;
use crate::common::{ByteOrder, Error, Result};
use fixedbitset::FixedBitSet;
use std::fmt;
use std::io::{Read, SeekFrom};

/// Random access to the records of the directory stream.
pub(crate) struct DirectoryReader {
    stream: StreamReader,
    order: ByteOrder,
    major_version: u16,
}

impl DirectoryReader {
    pub(crate) fn new(stream: StreamReader, order: ByteOrder, major_version: u16) -> Self {
        DirectoryReader {
            stream,
            order,
            major_version,
        }
    }

    /// Number of whole records in the directory stream.
    pub(crate) fn count(&self) -> usize {
        (self.stream.len() / DIRENTRY_SIZE as u64) as usize
    }

    /// Decode the record at byte offset `128 * id`.
    pub(crate) fn record(&mut self, id: u32) -> Result<DirectoryRecord> {
        if id as usize >= self.count() {
            return Err(Error::CorruptedFile(format!(
                "directory entry {} out of range ({} entries)",
                id,
                self.count()
            )));
        }
        self.stream
            .seek_to(SeekFrom::Start(u64::from(id) * DIRENTRY_SIZE as u64))?;
        let mut buf = [0u8; DIRENTRY_SIZE];
        self.stream.read_exact(&mut buf)?;
        DirectoryRecord::decode(&buf, self.order, self.major_version)
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    record: DirectoryRecord,
    name: String,
    id: u32,
    level: u32,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    fn new(record: DirectoryRecord, id: u32, level: u32, parent: Option<usize>) -> Self {
        Node {
            name: record.name(),
            record,
            id,
            level,
            parent,
            children: Vec::new(),
        }
    }
}

/// Arena of directory nodes; index 0 is the root.
#[derive(Debug)]
pub(crate) struct DirectoryTree {
    nodes: Vec<Node>,
}

impl DirectoryTree {
    /// Expand the tree below an already decoded root record.
    ///
    /// Entries are visited in the same order as a recursive walk that
    /// handles an entry, then its left sibling, then its right sibling, then
    /// (for storages) its child. An explicit stack keeps the depth of
    /// malformed input off the call stack.
    pub(crate) fn build(
        root: DirectoryRecord,
        reader: &mut DirectoryReader,
        options: &CfbOptions,
    ) -> Result<Self> {
        let first_child = root.child;
        let mut nodes = vec![Node::new(root, 0, 0, None)];
        let mut visited = FixedBitSet::with_capacity(reader.count().max(1));
        visited.insert(0);

        let mut pending: Vec<(u32, usize)> = Vec::new();
        if first_child <= MAXREGSID {
            pending.push((first_child, 0));
        }

        while let Some((id, parent)) = pending.pop() {
            if nodes.len() >= options.max_directory_entries {
                return Err(Error::CorruptedFile(format!(
                    "more than {} directory entries",
                    options.max_directory_entries
                )));
            }

            let record = reader.record(id)?;
            if visited.put(id as usize) {
                return Err(Error::CorruptedFile(format!(
                    "directory entry {} reached twice",
                    id
                )));
            }
            if options.validate_entries {
                record.validate(id)?;
            }

            let (left, right, child) = (record.left_sibling, record.right_sibling, record.child);
            let descend = record.object_type == STGTY_STORAGE && child <= MAXREGSID;

            let index = nodes.len();
            let level = nodes[parent].level + 1;
            nodes.push(Node::new(record, id, level, Some(parent)));
            nodes[parent].children.push(index);

            if descend {
                pending.push((child, index));
            }
            if right <= MAXREGSID {
                pending.push((right, parent));
            }
            if left <= MAXREGSID {
                pending.push((left, parent));
            }
        }

        Ok(DirectoryTree { nodes })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// A borrowed handle to one entry of a document's directory tree.
#[derive(Clone, Copy)]
pub struct DirectoryEntry<'a> {
    doc: &'a Document,
    loaded: &'a LoadedTree,
    index: usize,
}

impl<'a> DirectoryEntry<'a> {
    pub(crate) fn new(doc: &'a Document, loaded: &'a LoadedTree, index: usize) -> Self {
        DirectoryEntry { doc, loaded, index }
    }

    #[inline]
    fn node(&self) -> &'a Node {
        &self.loaded.tree.nodes[self.index]
    }

    #[inline]
    fn at(&self, index: usize) -> DirectoryEntry<'a> {
        DirectoryEntry::new(self.doc, self.loaded, index)
    }

    /// Index of the record in the directory stream.
    #[inline]
    pub fn id(&self) -> u32 {
        self.node().id
    }

    /// Depth in the tree; the root is level 0.
    #[inline]
    pub fn level(&self) -> u32 {
        self.node().level
    }

    /// Display name, without a leading control character.
    #[inline]
    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    /// Name exactly as stored.
    pub fn raw_name(&self) -> String {
        self.node().record.raw_name()
    }

    /// `"<parent>/<name>"` below top level, the plain name otherwise.
    pub fn full_name(&self) -> String {
        match self.parent() {
            Some(parent) if parent.parent().is_some() => {
                format!("{}/{}", parent.name(), self.name())
            },
            _ => self.name().to_string(),
        }
    }

    /// Names from the top-level ancestor down to this entry; empty for the root.
    pub fn path(&self) -> Vec<&'a str> {
        let mut names = Vec::with_capacity(self.level() as usize);
        let mut current = *self;
        while let Some(parent) = current.parent() {
            names.push(current.name());
            current = parent;
        }
        names.reverse();
        names
    }

    pub fn parent(&self) -> Option<DirectoryEntry<'a>> {
        self.node().parent.map(|index| self.at(index))
    }

    /// Children in flattened on-disk order.
    pub fn children(&self) -> Vec<DirectoryEntry<'a>> {
        self.node()
            .children
            .iter()
            .map(|&index| self.at(index))
            .collect()
    }

    /// Children ordered by name.
    pub fn sorted_children(&self) -> Vec<DirectoryEntry<'a>> {
        let mut children = self.children();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        children
    }

    /// Visit this entry and every descendant, parents before children.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(DirectoryEntry<'a>),
    {
        let mut pending = vec![self.index];
        while let Some(index) = pending.pop() {
            f(self.at(index));
            pending.extend(self.loaded.tree.nodes[index].children.iter().rev());
        }
    }

    /// Look up a descendant by path components, ignoring ASCII case.
    pub fn find(&self, path: &[&str]) -> Option<DirectoryEntry<'a>> {
        let mut current = *self;
        for component in path {
            current = current
                .node()
                .children
                .iter()
                .map(|&index| self.at(index))
                .find(|child| child.name().eq_ignore_ascii_case(component))?;
        }
        Some(current)
    }

    /// The decoded on-disk record.
    #[inline]
    pub fn record(&self) -> &'a DirectoryRecord {
        &self.node().record
    }

    #[inline]
    pub fn entry_type(&self) -> Option<EntryType> {
        self.record().entry_type()
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        self.record().object_type == STGTY_STREAM
    }

    /// True for storages and for the root storage.
    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self.record().object_type, STGTY_STORAGE | STGTY_ROOT)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    #[inline]
    pub fn color(&self) -> NodeColor {
        self.record().color
    }

    #[inline]
    pub fn clsid(&self) -> Guid {
        self.record().clsid
    }

    #[inline]
    pub fn user_flags(&self) -> u32 {
        self.record().user_flags
    }

    #[inline]
    pub fn created(&self) -> FileTime {
        self.record().created
    }

    #[inline]
    pub fn modified(&self) -> FileTime {
        self.record().modified
    }

    #[inline]
    pub fn start_sector(&self) -> u32 {
        self.record().start_sector
    }

    /// Declared stream size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.record().size
    }

    #[inline]
    pub fn property_type(&self) -> u16 {
        self.record().property_type
    }

    /// Open this entry's contents. Fails with [`Error::NotStream`] unless
    /// the entry is a stream.
    pub fn open_stream(&self) -> Result<StreamReader> {
        if !self.is_stream() {
            return Err(Error::NotStream(self.full_name()));
        }
        self.doc
            .stream(self.start_sector(), self.size(), self.loaded.mini.as_ref())
    }
}

impl fmt::Debug for DirectoryEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("level", &self.level())
            .field("type", &self.entry_type())
            .field("size", &self.size())
            .finish()
    }
}
