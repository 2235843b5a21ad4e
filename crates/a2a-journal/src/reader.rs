//! Journal reader implementation.

use crate::entry::JournalEntry;
use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// How a truncated tail is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Truncated frames are errors.
    Strict,
    /// Truncation is treated as end-of-file.
    Permissive,
}

/// Sequential reader over a journal file.
///
/// ```rust,no_run
/// use a2a_journal::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("anchors.a2aj", ReadMode::Permissive)?;
/// let entries = reader.read_all()?;
/// println!("{} entries", entries.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the file cannot be opened or its header
    /// is missing or invalid.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut header = [0u8; HEADER_SIZE];
        match input.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(JournalError::InvalidHeader("file shorter than header".into()))
            }
            Err(e) => return Err(e.into()),
        }
        JournalHeader::from_bytes(&header)?;
        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next raw frame. `Ok(None)` at end-of-file, or at a
    /// truncated tail in permissive mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        let start = self.position;
        let mut header = [0u8; FRAME_HEADER_SIZE];
        let got = read_up_to(&mut self.input, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < FRAME_HEADER_SIZE {
            return self.truncated(start);
        }
        let frame = RecordFrame::from_bytes(&header, start)?;

        let mut payload = vec![0u8; frame.len as usize];
        if read_up_to(&mut self.input, &mut payload)? < payload.len() {
            return self.truncated(start);
        }
        self.position = start + FRAME_HEADER_SIZE as u64 + u64::from(frame.len);
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next known entry, skipping unknown frame kinds.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] on an invalid frame, a payload that does not
    /// decode as its kind, truncation in strict mode, or I/O failure.
    pub fn read_entry(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        while let Some((kind, payload)) = self.read_frame()? {
            if let Some(entry) = JournalEntry::decode(kind, &payload)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Reads all remaining entries.
    pub fn read_all(&mut self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    fn truncated<T>(&self, offset: u64) -> Result<Option<T>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }
}

fn read_up_to<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
