/// Configuration for opening compound files.
///
/// # Examples
///
/// ```rust
/// use cfbtree::CfbOptions;
///
/// // Create with defaults
/// let options = CfbOptions::default();
///
/// // Or customize
/// let options = CfbOptions::new()
///     .with_eager_directory(true)
///     .with_max_directory_entries(1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfbOptions {
    /// Build the mini FAT and directory tree while opening
    pub eager_directory: bool,
    /// Reject records with an unknown object type or a sized storage
    pub validate_entries: bool,
    /// Upper bound on directory entries placed in the tree
    pub max_directory_entries: usize,
}

impl Default for CfbOptions {
    fn default() -> Self {
        Self {
            eager_directory: false,
            validate_entries: true,
            max_directory_entries: 65_536,
        }
    }
}

impl CfbOptions {
    /// Create a new `CfbOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the directory tree is built by `open` instead of on the
    /// first call to `root`.
    ///
    /// When enabled, every load-time error is reported by `open`.
    #[inline]
    pub fn with_eager_directory(mut self, eager: bool) -> Self {
        self.eager_directory = eager;
        self
    }

    /// Set whether directory records are checked for a known object type and
    /// for storages that declare a size.
    #[inline]
    pub fn with_entry_validation(mut self, validate: bool) -> Self {
        self.validate_entries = validate;
        self
    }

    #[inline]
    pub fn with_max_directory_entries(mut self, max: usize) -> Self {
        self.max_directory_entries = max;
        self
    }
}
