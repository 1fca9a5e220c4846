// chain/single.rs
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

// The single-pattern primitive: one (source, target) pair, matched with a
// cursor that correctly handles self-overlapping patterns (e.g. pattern
// "AAB" inside input "AAAB", or pattern "AA" inside input "AAAA").

use std::collections::VecDeque;

use super::Transformer;
use crate::error::Error;

pub struct SinglePatternReplacer<'a> {
    src: &'a [u8],
    trg: &'a [u8],
    cursor: usize,
    successor: Option<Box<dyn Transformer<'a> + 'a>>,
}

impl<'a> SinglePatternReplacer<'a> {
    pub fn new(src: &'a [u8], trg: &'a [u8]) -> Self {
        Self {
            src,
            trg,
            cursor: 0,
            successor: None,
        }
    }

    fn successor(&mut self) -> Result<&mut Box<dyn Transformer<'a> + 'a>, Error> {
        self.successor.as_mut().ok_or(Error::BrokenChain)
    }

    /// Matches `b` against the current tentative-match state. On a failed
    /// partial match, the first buffered byte is irrevocably emitted and
    /// the remaining buffered bytes are re-queued ahead of `b` to retry
    /// against a fresh cursor — this is what makes self-overlapping
    /// patterns (where a failed match's tail is itself a valid new prefix)
    /// match correctly without a full KMP failure-function table.
    fn process(&mut self, b: u8) -> Result<(), Error> {
        let mut pending: VecDeque<u8> = VecDeque::new();
        pending.push_back(b);
        while let Some(cur) = pending.pop_front() {
            if self.src[self.cursor] == cur {
                self.cursor += 1;
                if self.cursor == self.src.len() {
                    self.cursor = 0;
                    let trg = self.trg;
                    self.successor()?.feed_slice(trg)?;
                }
                continue;
            }
            if self.cursor == 0 {
                self.successor()?.feed(cur)?;
                continue;
            }
            let emit = self.src[0];
            let mut requeue: Vec<u8> = self.src[1..self.cursor].to_vec();
            requeue.push(cur);
            for &x in requeue.iter().rev() {
                pending.push_front(x);
            }
            self.cursor = 0;
            self.successor()?.feed(emit)?;
        }
        Ok(())
    }
}

impl<'a> Transformer<'a> for SinglePatternReplacer<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error> {
        self.process(b)
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.cursor > 0 {
            let bytes = self.src[..self.cursor].to_vec();
            self.cursor = 0;
            self.successor()?.feed_slice(&bytes)?;
        }
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

    fn run(src: &[u8], trg: &[u8], input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut rep = SinglePatternReplacer::new(src, trg);
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
    fn feeding_without_successor_errors() {
        let mut rep = SinglePatternReplacer::new(b"a", b"x");
        assert!(matches!(rep.feed(b'a'), Err(Error::BrokenChain)));
    }

    #[test]
    fn simple_match() {
        assert_eq!(run(b"ab", b"x", b"zzabzz"), b"zzxzz");
    }

    #[test]
    fn self_overlap_aab_to_x() {
        assert_eq!(run(b"AAB", b"X", b"AAAB"), b"AX");
    }

    #[test]
    fn self_overlap_aa_to_b() {
        assert_eq!(run(b"AA", b"B", b"AAAA"), b"BB");
    }

    #[test]
    fn unterminated_match_flushed_as_literal_on_finish() {
        assert_eq!(run(b"abc", b"X", b"zzab"), b"zzab");
    }
}
