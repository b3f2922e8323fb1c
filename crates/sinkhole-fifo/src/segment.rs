//! File-backed segment: one writer process, any number of reader processes.
//!
//! The writer holds an exclusive advisory lock on the segment file for its
//! whole lifetime. Readers map the file read-only and never lock.
//!
//! A segment file is never resized once mapped. Re-creating a segment builds
//! a new file next to it and renames it over the path, so readers that still
//! map the old file keep a valid (retired) mapping until they reopen.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use memmap2::{Mmap, MmapMut, MmapOptions};
use tracing::{debug, info, warn};

use crate::layout;
use crate::ring::Ring;
use crate::FifoError;

/// Writer side of a shared segment.
#[derive(Debug)]
pub struct FifoWriter {
    path: PathBuf,
    ring: Ring<MmapMut>,
    // Keeps the advisory lock alive.
    _file: File,
}

impl FifoWriter {
    /// Create (or re-create) the segment at `path` and take the writer role.
    ///
    /// Any previous segment at `path` is retired and replaced. Fails with
    /// [`FifoError::WriterBusy`] if another handle already writes it, and
    /// with [`FifoError::Corrupt`] if `path` holds a file that is not a
    /// segment.
    pub fn create(path: impl AsRef<Path>, capacity: u32) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        layout::check_capacity(capacity)?;
        let segment_err = |source| FifoError::Segment {
            path: path.clone(),
            source,
        };

        // Held until the new file is in place.
        let previous = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => Some(retire_previous(&path, file)?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(segment_err(e)),
        };

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut builder = tempfile::Builder::new();
        builder.prefix(".sinkhole-fifo");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }
        let temp = builder.tempfile_in(dir).map_err(segment_err)?;

        temp.as_file().try_lock_exclusive().map_err(segment_err)?;
        temp.as_file()
            .set_len(layout::segment_len(capacity) as u64)
            .map_err(segment_err)?;

        #[allow(unsafe_code)]
        // SAFETY: the file is new, private to this handle until renamed and
        // exclusively locked afterwards. Nothing resizes it while mapped.
        let mmap = unsafe { MmapOptions::new().map_mut(temp.as_file()).map_err(segment_err)? };
        let ring = Ring::create(mmap, capacity)?;

        let file = temp.persist(&path).map_err(|e| segment_err(e.error))?;
        drop(previous);
        info!(path = %path.display(), capacity, "fifo segment created");

        Ok(Self {
            path,
            ring,
            _file: file,
        })
    }

    /// Take the writer role on an existing segment, keeping its entries.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let segment_err = |source| FifoError::Segment {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(segment_err)?;

        if file.try_lock_exclusive().is_err() {
            return Err(FifoError::WriterBusy { path });
        }

        #[allow(unsafe_code)]
        // SAFETY: the exclusive lock keeps other writers out and nothing
        // resizes a segment file once it exists.
        let mmap = unsafe { MmapOptions::new().map_mut(&file).map_err(segment_err)? };

        let ring = Ring::open(mmap)?;
        debug!(
            path = %path.display(),
            capacity = ring.capacity(),
            next_id = ring.next_id(),
            "fifo segment attached"
        );

        Ok(Self {
            path,
            ring,
            _file: file,
        })
    }

    /// Attach to `path` if it holds a segment of `capacity` slots, otherwise
    /// create a fresh one.
    ///
    /// Only a missing file or a segment of another capacity or layout version
    /// is replaced. Anything else at `path` is reported, never overwritten.
    pub fn open_or_create(path: impl AsRef<Path>, capacity: u32) -> crate::Result<Self> {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(writer) if writer.capacity() == capacity => Ok(writer),
            Ok(writer) => {
                info!(
                    path = %path.display(),
                    old = writer.capacity(),
                    new = capacity,
                    "fifo capacity changed, recreating segment"
                );
                drop(writer);
                Self::create(path, capacity)
            }
            Err(FifoError::Segment { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Self::create(path, capacity)
            }
            Err(FifoError::Incompatible(reason)) => {
                info!(path = %path.display(), %reason, "fifo layout changed, recreating segment");
                Self::create(path, capacity)
            }
            Err(e) => Err(e),
        }
    }

    /// Segment path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the mapping to the backing file.
    pub fn flush(&self) -> crate::Result<()> {
        self.ring_buf().flush().map_err(|source| FifoError::Segment {
            path: self.path.clone(),
            source,
        })
    }

    fn ring_buf(&self) -> &MmapMut {
        self.ring.buffer()
    }
}

/// Lock the segment currently at `path` and mark it retired for its readers.
fn retire_previous(path: &Path, file: File) -> crate::Result<File> {
    if file.try_lock_exclusive().is_err() {
        return Err(FifoError::WriterBusy {
            path: path.to_path_buf(),
        });
    }
    let len = file
        .metadata()
        .map_err(|source| FifoError::Segment {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len == 0 {
        return Ok(file);
    }

    #[allow(unsafe_code)]
    // SAFETY: the exclusive lock keeps other writers out and this function
    // never resizes the file.
    let mut mmap = unsafe {
        MmapOptions::new()
            .map_mut(&file)
            .map_err(|source| FifoError::Segment {
                path: path.to_path_buf(),
                source,
            })?
    };
    if !layout::has_magic(&mmap) {
        return Err(FifoError::Corrupt(format!(
            "{} exists and is not a fifo segment",
            path.display()
        )));
    }
    match layout::decode_header(&mmap) {
        Ok(_) => layout::retire(&mut mmap),
        Err(e) => warn!(path = %path.display(), error = %e, "replacing unreadable fifo segment"),
    }
    Ok(file)
}

impl Deref for FifoWriter {
    type Target = Ring<MmapMut>;

    fn deref(&self) -> &Self::Target {
        &self.ring
    }
}

impl DerefMut for FifoWriter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ring
    }
}

/// Read-only view of a shared segment.
#[derive(Debug)]
pub struct FifoReader {
    path: PathBuf,
    ring: Ring<Mmap>,
}

impl FifoReader {
    /// Map an existing segment read-only and validate its header.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| FifoError::Segment {
            path: path.clone(),
            source,
        })?;

        #[allow(unsafe_code)]
        // SAFETY: mapped read-only. Writers never resize a segment file:
        // re-creation renames a new file over the path, so this mapping keeps
        // the old file alive.
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|source| FifoError::Segment {
                    path: path.clone(),
                    source,
                })?
        };

        let ring = Ring::open(mmap)?;
        debug!(path = %path.display(), capacity = ring.capacity(), "fifo segment opened");
        Ok(Self { path, ring })
    }

    /// Segment path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for FifoReader {
    type Target = Ring<Mmap>;

    fn deref(&self) -> &Self::Target {
        &self.ring
    }
}
