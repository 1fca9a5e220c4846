// chain/mixed_length.rs
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

// The general-purpose primitive: sources of varying lengths, matched by
// scanning the declared (source, target) pairs in declaration order on every
// byte, exactly the way the cached amount is grown and searched one pair at
// a time. A pair is a candidate as long as the cached bytes are a prefix of
// its source (or vice versa); the search always starts at the lowest-index
// candidate still alive, so an earlier-declared pair that is still a live
// candidate blocks every later-declared pair from completing, even one that
// would match exactly right now. This is what gives declaration order its
// priority: a strict-prefix source only loses to a longer one sharing its
// prefix when the longer one was declared first.

use super::Transformer;
use crate::error::Error;

enum Match {
    Full { target_index: usize, source_len: usize },
    Partial { pair_index: usize },
    None,
}

pub struct MixedLengthReplacer<'a> {
    pairs: Vec<(&'a [u8], &'a [u8])>,
    cache: Vec<u8>,
    search_from: usize,
    successor: Option<Box<dyn Transformer<'a> + 'a>>,
}

impl<'a> MixedLengthReplacer<'a> {
    pub fn new(pairs: &[(&'a [u8], &'a [u8])]) -> Self {
        warn_on_prefix_conflicts(pairs);
        Self {
            pairs: pairs.to_vec(),
            cache: Vec::new(),
            search_from: 0,
            successor: None,
        }
    }

    fn successor(&mut self) -> Result<&mut Box<dyn Transformer<'a> + 'a>, Error> {
        self.successor.as_mut().ok_or(Error::BrokenChain)
    }

    fn find_match(&self, from: usize) -> Match {
        for (i, &(src, _)) in self.pairs.iter().enumerate().skip(from) {
            let cmp_len = src.len().min(self.cache.len());
            if src[..cmp_len] == self.cache[..cmp_len] {
                if cmp_len == src.len() {
                    return Match::Full {
                        target_index: i,
                        source_len: src.len(),
                    };
                }
                return Match::Partial { pair_index: i };
            }
        }
        Match::None
    }

    fn process(&mut self, b: u8) -> Result<(), Error> {
        self.cache.push(b);
        while !self.cache.is_empty() {
            match self.find_match(self.search_from) {
                Match::Full {
                    target_index,
                    source_len,
                } => {
                    let target = self.pairs[target_index].1;
                    self.cache.drain(..source_len);
                    self.search_from = 0;
                    self.successor()?.feed_slice(target)?;
                    return Ok(());
                }
                Match::Partial { pair_index } => {
                    self.search_from = pair_index;
                    return Ok(());
                }
                Match::None => {
                    let head = self.cache.remove(0);
                    self.search_from = 0;
                    self.successor()?.feed(head)?;
                }
            }
        }
        Ok(())
    }
}

impl<'a> Transformer<'a> for MixedLengthReplacer<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error> {
        self.process(b)
    }

    fn finish(&mut self) -> Result<(), Error> {
        // No more input can arrive to complete a partial candidate, so every
        // remaining byte is resolved by searching for a full match from the
        // very first pair, same as the feed path once data runs dry.
        while !self.cache.is_empty() {
            match self.find_match(0) {
                Match::Full {
                    target_index,
                    source_len,
                } => {
                    let target = self.pairs[target_index].1;
                    self.cache.drain(..source_len);
                    self.successor()?.feed_slice(target)?;
                }
                _ => {
                    let head = self.cache.remove(0);
                    self.successor()?.feed(head)?;
                }
            }
        }
        self.search_from = 0;
        self.successor()?.finish()
    }

    fn set_successor(&mut self, next: Box<dyn Transformer<'a> + 'a>) -> Result<(), Error> {
        self.successor = Some(next);
        Ok(())
    }
}

/// Warns when one declared source is a strict prefix of another within the
/// same stage; declaration order decides the winner, but a silent overlap is
/// worth flagging since it usually means two entries were meant to be
/// mutually exclusive and aren't.
fn warn_on_prefix_conflicts(pairs: &[(&[u8], &[u8])]) {
    for (i, &(a, _)) in pairs.iter().enumerate() {
        for &(b, _) in pairs.iter().skip(i + 1) {
            let cmp_len = a.len().min(b.len());
            if a.len() != b.len() && a[..cmp_len] == b[..cmp_len] {
                log::warn!(
                    "one declared source is a prefix of another in the same stage: {:?} / {:?}",
                    String::from_utf8_lossy(a),
                    String::from_utf8_lossy(b)
                );
            }
        }
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
            let mut rep = MixedLengthReplacer::new(pairs);
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
    fn priority_scenario_from_the_spec() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"BCDEFGH".as_slice(), b"1".as_slice()), (b"DCE", b"2")];
        assert_eq!(run(&pairs, b"ABCDBDCEBCDEFBCDEFGH"), b"ABCDB2BCDEF1");
    }

    #[test]
    fn unterminated_partial_match_is_flushed_literally() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"abcdef".as_slice(), b"X".as_slice()), (b"xyz", b"Y")];
        assert_eq!(run(&pairs, b"zzabc"), b"zzabc");
    }

    #[test]
    fn prefix_conflict_first_declared_pattern_wins() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"AB".as_slice(), b"x".as_slice()), (b"ABC", b"y")];
        assert_eq!(run(&pairs, b"zABCz"), b"zxCz");
        assert_eq!(run(&pairs, b"zABz"), b"zxz");
    }

    #[test]
    fn prefix_conflict_longer_pattern_declared_first_wins() {
        let pairs: [(&[u8], &[u8]); 2] = [(b"ABC".as_slice(), b"y".as_slice()), (b"AB", b"x")];
        assert_eq!(run(&pairs, b"zABCz"), b"zyz");
        assert_eq!(run(&pairs, b"zABz"), b"zxz");
    }
}
