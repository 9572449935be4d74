//! Error types for the segregated free-list allocator engine.
//!
//! Every disposition the engine can reach — out of memory, a caller passing
//! a bad argument, a double free, a dangling/foreign pointer, metadata
//! corruption, or a red-zone overrun — has exactly one [`AllocErrorKind`]
//! variant. None of them are fatal: the public lifecycle API (`allocate`,
//! `free`, `resize`, ...) never panics or aborts on a caller mistake, it
//! reports and recovers locally (returns null, returns zero, or proceeds
//! best-effort). `AllocError` is the typed value that carries the
//! diagnostic through the engine's internal boundary and into the
//! read-only inspectors; the public API flattens it back down to the
//! null/zero surface the lifecycle operations are documented to return.

use core::fmt;

/// Severity of a reported [`AllocErrorKind`], used to select the log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A request could not be fulfilled under expected operating conditions.
    Warning,
    /// Caller passed an argument that is rejected without mutating state.
    Info,
    /// Misuse of the API detected against live engine state (double free,
    /// foreign pointer).
    Error,
    /// Metadata integrity violation: sentinel mismatch or red-zone overrun.
    Critical,
}

/// Classification of every recoverable error the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocErrorKind {
    /// `find` could not locate a free block large enough for the request.
    OutOfMemory,
    /// Caller-supplied argument is rejected outright (zero size, `n * size`
    /// overflow in `count_init`).
    InvalidArgument,
    /// `free` was called on a block whose `free` flag is already set.
    DoubleFree,
    /// `free`/`size_of`/`resize` was called with a pointer that does not
    /// resolve to a live, sentinel-valid block owned by this arena.
    InvalidPointer,
    /// A sentinel mismatch was observed during validation.
    Corruption,
    /// A red-zone guard band no longer holds `GUARD_VALUE` at `free` time.
    BufferOverrun,
}

impl AllocErrorKind {
    /// Severity used to pick the log level when this kind is reported.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::OutOfMemory => Severity::Warning,
            Self::InvalidArgument => Severity::Info,
            Self::DoubleFree | Self::InvalidPointer => Severity::Error,
            Self::Corruption | Self::BufferOverrun => Severity::Critical,
        }
    }

    /// Short machine-readable tag, stable across releases.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::OutOfMemory => "ALLOC_OUT_OF_MEMORY",
            Self::InvalidArgument => "ALLOC_INVALID_ARGUMENT",
            Self::DoubleFree => "ALLOC_DOUBLE_FREE",
            Self::InvalidPointer => "ALLOC_INVALID_POINTER",
            Self::Corruption => "ALLOC_CORRUPTION",
            Self::BufferOverrun => "ALLOC_BUFFER_OVERRUN",
        }
    }
}

/// Where in the engine an [`AllocError`] was raised, for the `validate`
/// diagnostic channel's `<where>` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Allocate,
    Free,
    Resize,
    CountInit,
    SizeOf,
    Validate,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Allocate => "allocate",
            Self::Free => "free",
            Self::Resize => "resize",
            Self::CountInit => "count_init",
            Self::SizeOf => "size_of",
            Self::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// A recoverable allocator error.
///
/// Carries enough context to reproduce the exact diagnostic strings the
/// engine is specified to emit, plus the call site the caller threaded
/// through `allocate`/`resize`/`count_init` via `#[track_caller]`-style
/// explicit `file`/`line` parameters.
#[derive(Debug, Clone)]
pub struct AllocError {
    kind: AllocErrorKind,
    site: Site,
    /// The address involved, formatted once at construction time so the
    /// error does not need to retain a raw pointer.
    address: Option<usize>,
    alloc_id: Option<u64>,
    requested_size: Option<usize>,
    corruption_kind: Option<CorruptionKind>,
}

impl AllocError {
    #[must_use]
    pub fn new(kind: AllocErrorKind, site: Site) -> Self {
        Self { kind, site, address: None, alloc_id: None, requested_size: None, corruption_kind: None }
    }

    #[must_use]
    pub fn with_address(mut self, address: usize) -> Self {
        self.address = Some(address);
        self
    }

    #[must_use]
    pub fn with_alloc_id(mut self, alloc_id: u64) -> Self {
        self.alloc_id = Some(alloc_id);
        self
    }

    #[must_use]
    pub fn with_requested_size(mut self, size: usize) -> Self {
        self.requested_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_corruption_kind(mut self, kind: CorruptionKind) -> Self {
        self.corruption_kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> AllocErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn site(&self) -> Site {
        self.site
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }

    // Convenience constructors, one per kind, matching the call sites in
    // the lifecycle API.

    #[must_use]
    pub fn out_of_memory(requested_size: usize) -> Self {
        Self::new(AllocErrorKind::OutOfMemory, Site::Allocate).with_requested_size(requested_size)
    }

    #[must_use]
    pub fn invalid_argument(site: Site) -> Self {
        Self::new(AllocErrorKind::InvalidArgument, site)
    }

    #[must_use]
    pub fn double_free(address: usize, alloc_id: u64) -> Self {
        Self::new(AllocErrorKind::DoubleFree, Site::Free)
            .with_address(address)
            .with_alloc_id(alloc_id)
    }

    #[must_use]
    pub fn buffer_overrun(address: usize, alloc_id: u64) -> Self {
        Self::new(AllocErrorKind::BufferOverrun, Site::Free)
            .with_address(address)
            .with_alloc_id(alloc_id)
    }

    #[must_use]
    pub fn corruption(site: Site, address: usize, what: CorruptionKind) -> Self {
        Self::new(AllocErrorKind::Corruption, site).with_address(address).with_corruption_kind(what)
    }

    #[must_use]
    pub fn invalid_pointer(site: Site, address: usize) -> Self {
        Self::new(AllocErrorKind::InvalidPointer, site).with_address(address)
    }
}

/// Which check failed, for the corruption diagnostic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    Start,
    End,
    Footer,
    OutOfBounds,
    /// A block linked into a free list has its `free` flag cleared.
    FreeListMarkedUsed,
    /// A block linked into the used list has its `free` flag set.
    UsedListMarkedFree,
    /// A full arena walk disagrees with the registries' recomputed stats.
    StatsMismatch,
}

impl fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Footer => "footer",
            Self::OutOfBounds => "out-of-bounds",
            Self::FreeListMarkedUsed => "free-list-marked-used",
            Self::UsedListMarkedFree => "used-list-marked-free",
            Self::StatsMismatch => "stats-mismatch",
        };
        f.write_str(s)
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AllocErrorKind::DoubleFree => write!(
                f,
                "Double free detected at {:#x} (ID {})",
                self.address.unwrap_or(0),
                self.alloc_id.unwrap_or(0)
            ),
            AllocErrorKind::BufferOverrun => write!(
                f,
                "Buffer overrun detected at {:#x} (ID {})",
                self.address.unwrap_or(0),
                self.alloc_id.unwrap_or(0)
            ),
            AllocErrorKind::Corruption => match self.corruption_kind {
                Some(CorruptionKind::FreeListMarkedUsed) => {
                    write!(f, "HEAP ERROR: Block in free list is marked as used")
                }
                Some(CorruptionKind::UsedListMarkedFree) => {
                    write!(f, "HEAP ERROR: Block in used list is marked as free")
                }
                Some(kind @ (CorruptionKind::Start | CorruptionKind::End | CorruptionKind::Footer)) => write!(
                    f,
                    "MEMORY CORRUPTION at {}: Block {:#x} {} sentinel corrupted",
                    self.site,
                    self.address.unwrap_or(0),
                    kind
                ),
                Some(CorruptionKind::OutOfBounds) => write!(
                    f,
                    "MEMORY CORRUPTION at {}: Block {:#x} is out of bounds",
                    self.site,
                    self.address.unwrap_or(0)
                ),
                Some(CorruptionKind::StatsMismatch) => write!(
                    f,
                    "MEMORY CORRUPTION at {}: statistics diverged from a full arena walk",
                    self.site
                ),
                None => write!(
                    f,
                    "MEMORY CORRUPTION at {}: Block {:#x} corrupted",
                    self.site,
                    self.address.unwrap_or(0)
                ),
            },
            AllocErrorKind::InvalidPointer => write!(
                f,
                "MEMORY ERROR at {}: Block {:#x} is outside heap bounds",
                self.site,
                self.address.unwrap_or(0)
            ),
            AllocErrorKind::OutOfMemory => write!(
                f,
                "allocate: no free block satisfies request of {} bytes",
                self.requested_size.unwrap_or(0)
            ),
            AllocErrorKind::InvalidArgument => {
                write!(f, "{}: invalid argument", self.site)
            }
        }
    }
}

impl core::error::Error for AllocError {}

/// Result type for the engine's internal (non-public) operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Emits an [`AllocError`] through the structured logging facade at the
/// level matching its severity, then returns it unchanged. A no-op pass-through
/// when the `logging` feature is disabled.
pub fn report(err: AllocError) -> AllocError {
    #[cfg(feature = "logging")]
    {
        match err.severity() {
            Severity::Critical => tracing::error!(%err, kind = err.kind().code(), "allocator corruption"),
            Severity::Error => tracing::error!(%err, kind = err.kind().code(), "allocator misuse"),
            Severity::Warning => tracing::warn!(%err, kind = err.kind().code(), "allocator pressure"),
            Severity::Info => tracing::debug!(%err, kind = err.kind().code(), "allocator rejected request"),
        }
    }
    err
}
