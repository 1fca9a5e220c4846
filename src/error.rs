// error.rs
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

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{line}:{column}: {reason}")]
    Parse {
        line: usize,
        column: usize,
        reason: String,
    },
    #[error("{0}")]
    Schema(String),
    #[error("{0}")]
    Range(String),
    #[error("duplicate lexeme name {0:?}")]
    DuplicateName(String),
    #[error("unknown lexeme name {0:?}")]
    UnknownName(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("no replacement stages declared ('todo' is empty)")]
    EmptyTodo,
    #[error("attempted to extend the chain past the sink adapter")]
    ImmutableSink,
    #[error("replacer fed a byte with no successor installed")]
    BrokenChain,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
