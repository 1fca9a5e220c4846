// io.rs
// Copyright 2022 Matti Hänninen
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

// The external collaborator interfaces the core engine consumes: a pull-based
// byte source, a push-based byte sink, and an auxiliary file loader for
// `file` dictionary entries. The core never assumes these are backed by real
// files — the CLI binary (`bin/main.rs`) is the only place that wires
// filesystem-backed implementations in.

use crate::error::Error;

/// A pull interface over a byte stream.
pub trait ByteSource {
    /// Reads into `buf`, returning the number of bytes read (0 at EOF).
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    fn exhausted(&self) -> bool;
    fn total_read(&self) -> u64;
}

/// A push interface over a byte stream. `end_of_data` on the last call is the
/// unique flush-and-commit signal.
pub trait ByteSink {
    fn write_byte(&mut self, b: u8, end_of_data: bool) -> std::io::Result<usize>;
    fn total_written(&self) -> u64;
}

/// Loads the content of a `file` dictionary entry.
pub trait FileLoader {
    fn load(&self, relative_name: &str) -> Result<Vec<u8>, Error>;
}

/// An in-memory byte source over an owned buffer, used by the compiler's
/// tests and by anything that has already slurped its input into memory.
pub struct SliceSource {
    data: Vec<u8>,
    pos: usize,
}

impl SliceSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = (self.data.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn total_read(&self) -> u64 {
        self.pos as u64
    }
}

/// An in-memory byte sink that accumulates everything written to it.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
    finished: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl ByteSink for VecSink {
    fn write_byte(&mut self, b: u8, end_of_data: bool) -> std::io::Result<usize> {
        if end_of_data {
            // The byte accompanying the end-of-data signal is irrelevant;
            // this call is the unique flush-and-commit notification.
            self.finished = true;
            return Ok(0);
        }
        self.buf.push(b);
        Ok(1)
    }

    fn total_written(&self) -> u64 {
        self.buf.len() as u64
    }
}

/// Loads `file` dictionary entries from the working directory, falling back
/// to a caller-supplied auxiliary directory when the relative path isn't
/// found directly.
pub struct FsFileLoader {
    pub fallback_dir: Option<std::path::PathBuf>,
}

impl FileLoader for FsFileLoader {
    fn load(&self, relative_name: &str) -> Result<Vec<u8>, Error> {
        if let Ok(bytes) = std::fs::read(relative_name) {
            return Ok(bytes);
        }
        if let Some(dir) = &self.fallback_dir {
            let candidate = dir.join(relative_name);
            if let Ok(bytes) = std::fs::read(&candidate) {
                return Ok(bytes);
            }
        }
        Err(Error::FileNotFound(relative_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reads_to_exhaustion() {
        let mut src = SliceSource::new(vec![1, 2, 3]);
        let mut buf = [0u8; 2];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert!(!src.exhausted());
        assert_eq!(src.read(&mut buf).unwrap(), 1);
        assert!(src.exhausted());
        assert_eq!(src.total_read(), 3);
    }

    #[test]
    fn vec_sink_collects_bytes() {
        let mut sink = VecSink::new();
        sink.write_byte(b'a', false).unwrap();
        // The byte that accompanies `end_of_data` is a placeholder, not data.
        sink.write_byte(0, true).unwrap();
        assert!(sink.finished());
        assert_eq!(sink.into_inner(), b"a");
    }
}
