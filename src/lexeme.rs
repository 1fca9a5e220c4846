// lexeme.rs
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

// Named, immutable byte sequences and the dictionary that owns them.

use std::collections::HashMap;

use crate::error::Error;

/// An immutable, named, non-empty byte sequence.
///
/// A lexeme's bytes are fixed at construction time and never change once the
/// lexeme is inserted into a [`Dictionary`]. Target-side lexemes (the
/// replacement half of a pair) are allowed to be empty, meaning "delete the
/// match"; source-side lexemes never are, and the compiler enforces that
/// before a lexeme is used as a pattern.
#[derive(Debug, Clone)]
pub struct Lexeme {
    name: String,
    bytes: Vec<u8>,
}

impl Lexeme {
    /// Builds a lexeme from an owned byte buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Builds a lexeme by copying bytes out of a borrowed view.
    pub fn from_view(name: impl Into<String>, view: &[u8]) -> Self {
        Self::from_bytes(name, view.to_vec())
    }

    /// Builds a lexeme by concatenating existing lexemes in order.
    pub fn concat(name: impl Into<String>, parts: &[&Lexeme]) -> Self {
        let mut bytes = Vec::with_capacity(parts.iter().map(|p| p.bytes.len()).sum());
        for part in parts {
            bytes.extend_from_slice(&part.bytes);
        }
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A mapping from name to lexeme.
///
/// Names are unique; inserting a duplicate name is a compile-time error.
/// Once inserted, a lexeme's byte view remains valid for the dictionary's
/// whole lifetime, so replacer primitives can hold plain `&[u8]` views into
/// it rather than reference-counted copies.
#[derive(Debug, Default)]
pub struct Dictionary {
    lexemes: HashMap<String, Lexeme>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lexeme: Lexeme) -> Result<(), Error> {
        if self.lexemes.contains_key(lexeme.name()) {
            return Err(Error::DuplicateName(lexeme.name().to_owned()));
        }
        self.lexemes.insert(lexeme.name().to_owned(), lexeme);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Lexeme> {
        self.lexemes.get(name)
    }

    pub fn get_pair(&self, src_name: &str, trg_name: &str) -> Option<(&Lexeme, &Lexeme)> {
        Some((self.lexemes.get(src_name)?, self.lexemes.get(trg_name)?))
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }
}
