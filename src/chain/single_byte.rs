// chain/single_byte.rs
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

// The single-byte-source primitive: two or more (source, target) pairs where
// every source is exactly one byte long. A 256-entry lookup table makes the
// match decision O(1) per byte with no buffering at all.

use super::Transformer;
use crate::error::Error;

pub struct SingleByteReplacer<'a> {
    table: [Option<&'a [u8]>; 256],
    successor: Option<Box<dyn Transformer<'a> + 'a>>,
}

impl<'a> SingleByteReplacer<'a> {
    pub fn new(pairs: &[(&'a [u8], &'a [u8])]) -> Self {
        let mut table: [Option<&'a [u8]>; 256] = [None; 256];
        for &(src, trg) in pairs {
            debug_assert_eq!(src.len(), 1);
            let idx = src[0] as usize;
            if table[idx].is_none() {
                table[idx] = Some(trg);
            }
        }
        Self {
            table,
            successor: None,
        }
    }

    fn successor(&mut self) -> Result<&mut Box<dyn Transformer<'a> + 'a>, Error> {
        self.successor.as_mut().ok_or(Error::BrokenChain)
    }
}

impl<'a> Transformer<'a> for SingleByteReplacer<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error> {
        match self.table[b as usize] {
            Some(trg) => {
                self.successor()?.feed_slice(trg)?;
            }
            None => {
                self.successor()?.feed(b)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
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
            let mut rep = SingleByteReplacer::new(pairs);
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
    fn swaps_two_bytes() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"a", b"b"), (b"b", b"a")];
        assert_eq!(run(&pairs, b"abba"), b"baab");
    }

    #[test]
    fn leaves_unmatched_bytes_alone() {
        let pairs: [(&[u8], &[u8]); 1] = [(b"x", b"y")];
        assert_eq!(run(&pairs, b"abc"), b"abc");
    }

    #[test]
    fn first_declaration_wins_on_duplicate_source_byte() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"a", b"1"), (b"a", b"2")];
        assert_eq!(run(&pairs, b"a"), b"1");
    }

    #[test]
    fn target_may_be_multi_byte() {
        let pairs: [(&[u8], &[u8]); 1] = [(b"a", b"xyz")];
        assert_eq!(run(&pairs, b"a"), b"xyz");
    }
}
