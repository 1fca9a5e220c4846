// chain/equal_length.rs
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

// The equal-length primitive: three or more (source, target) pairs whose
// sources all share one common length L (and at least one source is longer
// than a single byte, otherwise the single-byte primitive would have been
// picked instead). Matching is a sliding window of exactly L bytes, looked
// up in a hash map on every byte fed.

use std::collections::{HashMap, VecDeque};

use super::Transformer;
use crate::error::Error;

pub struct EqualLengthReplacer<'a> {
    len: usize,
    table: HashMap<&'a [u8], &'a [u8]>,
    window: VecDeque<u8>,
    successor: Option<Box<dyn Transformer<'a> + 'a>>,
}

impl<'a> EqualLengthReplacer<'a> {
    pub fn new(pairs: &[(&'a [u8], &'a [u8])]) -> Self {
        let len = pairs[0].0.len();
        let mut table = HashMap::with_capacity(pairs.len());
        for &(src, trg) in pairs {
            debug_assert_eq!(src.len(), len);
            table.entry(src).or_insert(trg);
        }
        Self {
            len,
            table,
            window: VecDeque::with_capacity(len),
            successor: None,
        }
    }

    fn successor(&mut self) -> Result<&mut Box<dyn Transformer<'a> + 'a>, Error> {
        self.successor.as_mut().ok_or(Error::BrokenChain)
    }

    fn try_match(&mut self) -> Result<(), Error> {
        let contiguous: Vec<u8> = self.window.iter().copied().collect();
        if let Some(&trg) = self.table.get(contiguous.as_slice()) {
            self.window.clear();
            self.successor()?.feed_slice(trg)?;
        } else {
            let head = self.window.pop_front().unwrap();
            self.successor()?.feed(head)?;
        }
        Ok(())
    }
}

impl<'a> Transformer<'a> for EqualLengthReplacer<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error> {
        self.window.push_back(b);
        if self.window.len() == self.len {
            self.try_match()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        let remaining: Vec<u8> = self.window.drain(..).collect();
        self.successor()?.feed_slice(&remaining)?;
        self.successor()?.finish()
    }

    fn set_successor(&mut self, next: Box<dyn Transformer<'a> + 'a>) -> Result<(), Error> {
        self.successor = Some(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::sink::SinkAdapter;
    use crate::io::ByteSink;

    struct CollectingSink<'a>(&'a mut Vec<u8>);
    impl ByteSink for CollectingSink<'_> {
        fn write_byte(&mut self, b: u8, end_of_data: bool) -> std::io::Result<usize> {
            if !end_of_data {
                self.0.push(b);
            }
            Ok(1)
        }
        fn total_written(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn run(pairs: &[(&[u8], &[u8])], input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut rep = EqualLengthReplacer::new(pairs);
            let sink = CollectingSink(&mut out);
            rep.set_successor(Box::new(SinkAdapter::new(Box::new(sink))))
                .unwrap();
            for &b in input {
                rep.feed(b).unwrap();
            }
            rep.finish().unwrap();
        }
        out
    }

    #[test]
    fn matches_equal_length_sources() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"11".as_slice(), b"a".as_slice()), (b"22", b"b")];
        assert_eq!(run(&pairs, b"1122"), b"ab");
    }

    #[test]
    fn flushes_trailing_partial_window_on_finish() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"11".as_slice(), b"a".as_slice()), (b"22", b"b")];
        assert_eq!(run(&pairs, b"113"), b"a3");
    }

    #[test]
    fn consecutive_non_overlapping_windows_all_match() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"1111".as_slice(), b"x".as_slice()), (b"3333", b"y")];
        assert_eq!(run(&pairs, b"111111111111"), b"xxx");
    }
}
