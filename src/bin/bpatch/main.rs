// bin/main.rs
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

mod cli;

use std::{fs, io::Write as _, path, process, time::Instant};

use anyhow::Context;
use bpatch::io::{ByteSink, FsFileLoader};

use cli::Verbosity;

fn main() {
    if let Err(e) = main1() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn main1() -> Result<(), anyhow::Error> {
    let args = cli::Args::from_command_line()?;
    init_logger(args.verbosity);

    let started = Instant::now();

    let actions_text = fs::read_to_string(&args.actions)
        .with_context(|| format!("reading actions file {:?}", args.actions))?;
    let loader = FsFileLoader {
        fallback_dir: args
            .aux_dirs
            .first()
            .cloned()
            .or_else(|| args.actions.parent().map(path::Path::to_path_buf)),
    };
    let (dictionary, stages) = bpatch::compile(&actions_text, &loader)?;

    let batch = args.sources.len() > 1;
    for source in &args.sources {
        let dest = resolve_destination(&args.destination, source, batch)?;
        if dest.exists() && !args.overwrite {
            anyhow::bail!("destination {:?} already exists (use --overwrite)", dest);
        }

        let bytes = fs::read(source)
            .with_context(|| format!("reading source file {:?}", source))?;
        let out = fs::File::create(&dest)
            .with_context(|| format!("creating destination file {:?}", dest))?;
        let sink = FileByteSink::new(out);

        let mut chain = bpatch::build(&dictionary, &stages, Box::new(sink))?;
        chain.feed_all(&bytes)?;
        chain.finish()?;

        log::info!("patched {:?} -> {:?}", source, dest);
    }

    log::info!("done in {:?}", started.elapsed());
    Ok(())
}

/// For a single source the destination is used as given; in batch (glob)
/// mode the destination is treated as a directory and each source keeps its
/// own file name inside it.
fn resolve_destination(
    destination: &path::Path,
    source: &path::Path,
    batch: bool,
) -> Result<path::PathBuf, anyhow::Error> {
    if !batch {
        return Ok(destination.to_path_buf());
    }
    let name = source
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("source {:?} has no file name", source))?;
    fs::create_dir_all(destination)
        .with_context(|| format!("creating destination directory {:?}", destination))?;
    Ok(destination.join(name))
}

struct FileByteSink {
    file: fs::File,
    written: u64,
}

impl FileByteSink {
    fn new(file: fs::File) -> Self {
        Self { file, written: 0 }
    }
}

impl ByteSink for FileByteSink {
    fn write_byte(&mut self, b: u8, end_of_data: bool) -> std::io::Result<usize> {
        if end_of_data {
            self.file.flush()?;
            return Ok(0);
        }
        self.file.write_all(&[b])?;
        self.written += 1;
        Ok(1)
    }

    fn total_written(&self) -> u64 {
        self.written
    }
}

fn init_logger(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => log::LevelFilter::Error,
        Verbosity::Normal => log::LevelFilter::Info,
        Verbosity::Verbose(1) => log::LevelFilter::Debug,
        Verbosity::Verbose(_) => log::LevelFilter::Trace,
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("logger can only be initialized once");
}
