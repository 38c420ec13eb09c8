//! Journal-backed persistent world state.

use crate::error::{StateError, StateResult};
use crate::world_state::{StateScan, WorldState};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes opening every journal frame.
pub const FRAME_MAGIC: [u8; 4] = *b"CLJF";

/// Size of the fixed frame header: magic, op, key length, value length.
const HEADER_SIZE: usize = 4 + 1 + 4 + 4;

/// Size of the CRC32 trailer.
const TRAILER_SIZE: usize = 4;

/// Largest key or value a frame can carry.
pub const MAX_ENTRY_SIZE: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum FrameOp {
    Put = 1,
    Delete = 2,
}

impl FrameOp {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Options for opening a [`FileWorldState`].
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// `fsync` after every put/delete (safer but slower).
    pub sync_on_write: bool,
    /// Create parent directories if missing.
    pub create_dirs: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            sync_on_write: true,
            create_dirs: true,
        }
    }
}

/// A world state persisted as an append-only journal.
///
/// Each `put`/`delete` appends one checksummed frame; opening the file
/// replays the journal into memory, so reads and scans never touch disk.
///
/// # Recovery
///
/// A frame cut short by a crash mid-append is dropped and the file is
/// truncated back to the last complete frame. That only happens when no
/// intact frame follows the damaged one; damage anywhere before the tail
/// is reported as [`StateError::Corrupted`] and the file is left as is.
/// A failed append is cut off again before the call returns.
///
/// # Locking
///
/// The journal is held under an exclusive advisory lock for the lifetime of
/// the value; a second open fails with [`StateError::Locked`].
///
/// # Example
///
/// ```no_run
/// use camledger_state::{FileWorldState, WorldState};
/// use std::path::Path;
///
/// let mut state = FileWorldState::open(Path::new("ledger.journal")).unwrap();
/// state.put(b"camera\0CAM-1", b"record").unwrap();
/// ```
#[derive(Debug)]
pub struct FileWorldState {
    path: PathBuf,
    file: File,
    entries: HashMap<Vec<u8>, Vec<u8>>,
    options: FileOptions,
    journal_len: u64,
}

impl FileWorldState {
    /// Opens or creates a journal at `path` with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is locked, or is
    /// corrupted.
    pub fn open(path: &Path) -> StateResult<Self> {
        Self::open_with(path, FileOptions::default())
    }

    /// Opens or creates a journal at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is locked, or is
    /// corrupted.
    pub fn open_with(path: &Path, options: FileOptions) -> StateResult<Self> {
        if options.create_dirs {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock(&file)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let (entries, valid_len) = replay(&buf)?;
        let journal_len = valid_len as u64;
        if valid_len < buf.len() {
            tracing::warn!(
                path = %path.display(),
                dropped = buf.len() - valid_len,
                "truncating incomplete journal tail"
            );
            file.set_len(journal_len)?;
            file.sync_all()?;
        }
        tracing::debug!(
            path = %path.display(),
            live = entries.len(),
            bytes = journal_len,
            "journal replayed"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            entries,
            options,
            journal_len,
        })
    }

    /// Returns the path to the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current journal size in bytes.
    #[must_use]
    pub fn journal_len(&self) -> u64 {
        self.journal_len
    }

    /// Rewrites the journal so it holds one put per live key.
    ///
    /// Frames are written in key order, so two compacted journals of equal
    /// states are byte-identical.
    ///
    /// # Errors
    ///
    /// Returns an error if the compacted journal cannot be written or
    /// swapped in; the original journal is left untouched in that case.
    pub fn compact(&mut self) -> StateResult<()> {
        let tmp_path = self.path.with_extension("compact");
        let mut live: Vec<_> = self.entries.iter().collect();
        live.sort();

        let mut buf = Vec::new();
        for (key, value) in live {
            buf.extend_from_slice(&encode_frame(FrameOp::Put, key, value)?);
        }

        let file = match swap_in(&tmp_path, &self.path, &buf) {
            Ok(file) => file,
            Err(err) => {
                if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                    if cleanup.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %tmp_path.display(),
                            error = %cleanup,
                            "could not remove compaction file"
                        );
                    }
                }
                return Err(err);
            }
        };
        let before = self.journal_len;
        self.file = file;
        self.journal_len = buf.len() as u64;

        tracing::info!(
            path = %self.path.display(),
            before,
            after = self.journal_len,
            "journal compacted"
        );
        Ok(())
    }

    fn append(&mut self, op: FrameOp, key: &[u8], value: &[u8]) -> StateResult<()> {
        let frame = encode_frame(op, key, value)?;
        if let Err(err) = self.write_frame(&frame) {
            self.discard_partial_append();
            return Err(err);
        }
        self.journal_len += frame.len() as u64;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> StateResult<()> {
        self.file.seek(SeekFrom::Start(self.journal_len))?;
        self.file.write_all(frame)?;
        self.file.flush()?;
        if self.options.sync_on_write {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cuts the file back to the last complete frame.
    fn discard_partial_append(&mut self) {
        if let Err(err) = self.file.set_len(self.journal_len) {
            tracing::error!(
                path = %self.path.display(),
                error = %err,
                "could not roll back partial journal frame"
            );
        }
    }
}

impl WorldState for FileWorldState {
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StateResult<()> {
        self.append(FrameOp::Put, key, value)?;
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StateResult<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        self.append(FrameOp::Delete, key, &[])?;
        self.entries.remove(key);
        Ok(())
    }

    fn scan_all(&self) -> StateResult<StateScan<'_>> {
        Ok(Box::new(
            self.entries.iter().map(|(k, v)| Ok((k.clone(), v.clone()))),
        ))
    }

    fn len(&self) -> StateResult<usize> {
        Ok(self.entries.len())
    }
}

fn lock(file: &File) -> StateResult<()> {
    file.try_lock_exclusive().map_err(|e| {
        let contended = fs2::lock_contended_error();
        if e.kind() == io::ErrorKind::WouldBlock || e.raw_os_error() == contended.raw_os_error() {
            StateError::Locked
        } else {
            StateError::Io(e)
        }
    })
}

/// Writes `contents` to a locked temporary journal and renames it over
/// `path`, returning the still-locked handle.
fn swap_in(tmp_path: &Path, path: &Path, contents: &[u8]) -> StateResult<File> {
    let mut tmp = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp_path)?;
    lock(&tmp)?;
    tmp.write_all(contents)?;
    tmp.sync_all()?;
    std::fs::rename(tmp_path, path)?;
    Ok(tmp)
}

fn encode_frame(op: FrameOp, key: &[u8], value: &[u8]) -> StateResult<Vec<u8>> {
    let key_len = u32::try_from(key.len()).map_err(|_| StateError::EntryTooLarge {
        len: key.len(),
        max: MAX_ENTRY_SIZE,
    })?;
    let value_len = u32::try_from(value.len()).map_err(|_| StateError::EntryTooLarge {
        len: value.len(),
        max: MAX_ENTRY_SIZE,
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + key.len() + value.len() + TRAILER_SIZE);
    frame.extend_from_slice(&FRAME_MAGIC);
    frame.push(op as u8);
    frame.extend_from_slice(&key_len.to_le_bytes());
    frame.extend_from_slice(&value_len.to_le_bytes());
    frame.extend_from_slice(key);
    frame.extend_from_slice(value);
    let crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// A frame split out of the journal.
struct Frame<'a> {
    op: FrameOp,
    key: &'a [u8],
    value: &'a [u8],
    len: usize,
    intact: bool,
}

/// Splits the frame at the start of `rest`; `None` if `rest` ends first.
fn split_frame(rest: &[u8]) -> Result<Option<Frame<'_>>, &'static str> {
    if rest.len() < HEADER_SIZE {
        return Ok(None);
    }
    if rest[..4] != FRAME_MAGIC {
        return Err("bad frame magic");
    }
    let op = FrameOp::from_byte(rest[4]).ok_or("unknown frame op")?;
    let key_len = u32::from_le_bytes([rest[5], rest[6], rest[7], rest[8]]) as usize;
    let value_len = u32::from_le_bytes([rest[9], rest[10], rest[11], rest[12]]) as usize;

    let Some(body_end) = HEADER_SIZE
        .checked_add(key_len)
        .and_then(|n| n.checked_add(value_len))
        .filter(|&end| end <= rest.len().saturating_sub(TRAILER_SIZE))
    else {
        return Ok(None);
    };
    let trailer = &rest[body_end..body_end + TRAILER_SIZE];
    let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);

    Ok(Some(Frame {
        op,
        key: &rest[HEADER_SIZE..HEADER_SIZE + key_len],
        value: &rest[HEADER_SIZE + key_len..body_end],
        len: body_end + TRAILER_SIZE,
        intact: crc32fast::hash(&rest[..body_end]) == stored,
    }))
}

/// Offset of the first checksummed frame starting after `from`.
fn next_intact_frame(buf: &[u8], from: usize) -> Option<usize> {
    (from..buf.len()).find(|&pos| {
        buf[pos..].starts_with(&FRAME_MAGIC)
            && matches!(split_frame(&buf[pos..]), Ok(Some(frame)) if frame.intact)
    })
}

/// Replays `buf`, returning the live entries and the length of the valid
/// prefix (everything after it is an incomplete tail).
fn replay(buf: &[u8]) -> StateResult<(HashMap<Vec<u8>, Vec<u8>>, usize)> {
    let mut entries = HashMap::new();
    let mut offset = 0usize;

    while offset < buf.len() {
        let frame = split_frame(&buf[offset..])
            .map_err(|reason| StateError::corrupted(offset as u64, reason))?;
        match frame {
            Some(frame) if frame.intact => {
                match frame.op {
                    FrameOp::Put => {
                        entries.insert(frame.key.to_vec(), frame.value.to_vec());
                    }
                    FrameOp::Delete => {
                        entries.remove(frame.key);
                    }
                }
                offset += frame.len;
            }
            Some(frame) if offset + frame.len < buf.len() => {
                return Err(StateError::corrupted(offset as u64, "frame checksum mismatch"));
            }
            // Cut short or damaged at the very end: a torn write, unless
            // something intact was written after it.
            _ => {
                if let Some(next) = next_intact_frame(buf, offset + 1) {
                    return Err(StateError::corrupted(
                        offset as u64,
                        format!("damaged frame followed by an intact frame at {next}"),
                    ));
                }
                break;
            }
        }
    }

    Ok((entries, offset))
}
