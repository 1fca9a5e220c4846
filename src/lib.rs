// lib.rs
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

//! A streaming binary-patch engine.
//!
//! A configuration document declares a dictionary of named byte lexemes and
//! an ordered list of replacement stages; [`compiler::compile`] turns that
//! document into a [`lexeme::Dictionary`] and a [`compiler::Stage`] list, and
//! [`chain::build`] turns those into a [`chain::Chain`] that can be fed a
//! byte stream one byte (or slice) at a time.
//!
//! The engine never touches the filesystem or a terminal directly — it
//! consumes a [`io::ByteSource`]/[`io::ByteSink`] pair and a [`io::FileLoader`]
//! for `file` dictionary entries, leaving those collaborators to the caller.
//! The `bpatch` binary is one such caller.

pub mod chain;
pub mod compiler;
pub mod error;
pub mod io;
pub mod lexeme;
pub mod parser;

pub use chain::{build, Chain};
pub use compiler::{compile, Stage};
pub use error::Error;
pub use io::{ByteSink, ByteSource, FileLoader};
pub use lexeme::{Dictionary, Lexeme};
