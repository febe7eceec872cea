//! Local gzip file reading, one decoded text line at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};

/// Buffer size for gzip stream reader (256KB)
const GZIP_BUF_SIZE: usize = 256 * 1024;

/// Initial capacity for the per-line read buffer
const LINE_BUF_CAPACITY: usize = 4096;

/// Buffered reader over a gzipped local file, every member decoded
pub type GzipReader = BufReader<MultiGzDecoder<File>>;

/// open → gunzip (all members) → buffered reader
pub fn open_gzip_file(path: &Path) -> Result<GzipReader> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(BufReader::with_capacity(GZIP_BUF_SIZE, MultiGzDecoder::new(file)))
}

/// Lines of one gzip file with `\n` / `\r\n` terminators stripped.
///
/// Decompression happens on demand as lines are pulled.
pub struct GzipLines {
    path: PathBuf,
    reader: GzipReader,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

impl GzipLines {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            reader: open_gzip_file(path)?,
            buf: Vec::with_capacity(LINE_BUF_CAPACITY),
            line_no: 0,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for GzipLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                self.done = true;
                return Some(Err(Error::io(&self.path, e)));
            }
        }
        self.line_no += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        match String::from_utf8(std::mem::take(&mut self.buf)) {
            Ok(line) => Some(Ok(line)),
            Err(_) => {
                self.done = true;
                Some(Err(Error::InvalidUtf8 {
                    path: self.path.clone(),
                    line: self.line_no,
                }))
            }
        }
    }
}
