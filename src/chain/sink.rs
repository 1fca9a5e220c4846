// chain/sink.rs
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

// The terminal node of a chain: wraps a byte sink and forwards every byte
// (and the end-of-data signal) to it. Refuses to have a successor.

use super::Transformer;
use crate::error::Error;
use crate::io::ByteSink;

pub struct SinkAdapter<'a> {
    sink: Box<dyn ByteSink + 'a>,
}

impl<'a> SinkAdapter<'a> {
    pub fn new(sink: Box<dyn ByteSink + 'a>) -> Self {
        Self { sink }
    }
}

impl<'a> Transformer<'a> for SinkAdapter<'a> {
    fn feed(&mut self, b: u8) -> Result<(), Error> {
        self.sink.write_byte(b, false)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.sink.write_byte(0, true)?;
        Ok(())
    }

    fn set_successor(&mut self, _next: Box<dyn Transformer<'a> + 'a>) -> Result<(), Error> {
        Err(Error::ImmutableSink)
    }
}
