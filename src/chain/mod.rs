// chain/mod.rs
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

// The chain driver: assembles compiled stage primitives into a linear list
// terminating in a sink adapter, and pushes bytes (and the end-of-data
// signal) through the head of that list.

mod equal_length;
mod mixed_length;
mod sink;
mod single;
mod single_byte;

use crate::compiler::Stage;
use crate::error::Error;
use crate::io::ByteSink;
use crate::lexeme::Dictionary;

/// A stream transformer: one node in the chain. Implementors buffer at most
/// the length of their longest registered source pattern and must forward
/// every byte (or its replacement) to their successor before `feed` returns.
///
/// Parameterized over `'a`, the lifetime of the lexeme byte views the chain
/// was compiled against, so a primitive's successor can borrow from the same
/// dictionary without an extra allocation or reference count per lexeme.
pub trait Transformer<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error>;
    fn finish(&mut self) -> Result<(), Error>;
    fn set_successor(&mut self, next: Box<dyn Transformer<'a> + 'a>) -> Result<(), Error>;

    /// Feeds a slice one byte at a time. A convenience for primitives that
    /// emit a whole target lexeme on a match.
    fn feed_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.feed(b)?;
        }
        Ok(())
    }
}

/// A compiled, linear chain of replacer primitives ending in a sink adapter.
pub struct Chain<'a> {
    head: Box<dyn Transformer<'a> + 'a>,
}

impl<'a> Chain<'a> {
    pub fn feed_byte(&mut self, b: u8) -> Result<(), Error> {
        self.head.feed(b)
    }

    pub fn finish(&mut self) -> Result<(), Error> {
        self.head.finish()
    }

    pub fn feed_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &b in bytes {
            self.feed_byte(b)?;
        }
        Ok(())
    }
}

/// Builds a chain from the compiled stage list, in declaration order,
/// terminating with a sink adapter wrapping `sink`.
pub fn build<'a>(
    dictionary: &'a Dictionary,
    stages: &[Stage],
    sink: Box<dyn ByteSink + 'a>,
) -> Result<Chain<'a>, Error> {
    let mut next: Box<dyn Transformer<'a> + 'a> = Box::new(sink::SinkAdapter::new(sink));
    for stage in stages.iter().rev() {
        let mut pairs = Vec::with_capacity(stage.pairs.len());
        for (src, trg) in &stage.pairs {
            let (src_lex, trg_lex) = dictionary
                .get_pair(src, trg)
                .expect("compiler already validated these names exist");
            pairs.push((src_lex.bytes(), trg_lex.bytes()));
        }
        let mut primitive = select_primitive(&pairs)?;
        primitive.set_successor(next)?;
        next = primitive;
    }
    Ok(Chain { head: next })
}

fn select_primitive<'a>(
    pairs: &[(&'a [u8], &'a [u8])],
) -> Result<Box<dyn Transformer<'a> + 'a>, Error> {
    if pairs.len() == 1 {
        let (src, trg) = pairs[0];
        return Ok(Box::new(single::SinglePatternReplacer::new(src, trg)));
    }
    if pairs.iter().all(|(src, _)| src.len() == 1) {
        return Ok(Box::new(single_byte::SingleByteReplacer::new(pairs)));
    }
    let first_len = pairs[0].0.len();
    if pairs.iter().all(|(src, _)| src.len() == first_len) {
        return Ok(Box::new(equal_length::EqualLengthReplacer::new(pairs)));
    }
    Ok(Box::new(mixed_length::MixedLengthReplacer::new(pairs)))
}
