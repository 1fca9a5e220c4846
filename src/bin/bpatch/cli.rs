// cli.rs
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

use std::path;

use clap::Parser;

use bpatch::Error;

#[derive(Debug)]
pub struct Args {
    pub sources: Vec<path::PathBuf>,
    pub destination: path::PathBuf,
    pub actions: path::PathBuf,
    pub overwrite: bool,
    pub aux_dirs: Vec<path::PathBuf>,
    pub verbosity: Verbosity,
}

#[derive(Debug, Clone, Copy)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose(u8),
}

impl Args {
    pub fn from_command_line() -> Result<Self, Error> {
        Self::try_from(Cli::parse())
    }
}

impl TryFrom<Cli> for Args {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let sources: Vec<path::PathBuf> = nu_glob::glob(&cli.source)
            .map_err(|e| Error::Schema(format!("bad source pattern {:?}: {e}", cli.source)))?
            .filter_map(|entry| entry.ok())
            .collect();
        if sources.is_empty() {
            return Err(Error::FileNotFound(cli.source));
        }

        let verbosity = if cli.quiet {
            Verbosity::Quiet
        } else if cli.verbose > 0 {
            Verbosity::Verbose(cli.verbose)
        } else {
            Verbosity::Normal
        };

        Ok(Self {
            sources,
            destination: cli.destination,
            actions: cli.actions,
            overwrite: cli.overwrite,
            aux_dirs: cli.aux_dir,
            verbosity,
        })
    }
}

#[derive(Debug, clap::Parser)]
#[clap(about = "Patches byte streams by substituting declared lexemes", max_term_width = 80)]
pub struct Cli {
    /// Source file, or a glob pattern matching several source files.
    #[clap(value_name = "SOURCE")]
    source: String,

    /// Destination file (single source) or directory (glob source).
    #[clap(value_name = "DEST")]
    destination: path::PathBuf,

    /// Actions document declaring the lexeme dictionary and replacement stages.
    #[clap(long, short, value_name = "FILE")]
    actions: path::PathBuf,

    /// Overwrite the destination if it already exists.
    #[clap(long)]
    overwrite: bool,

    /// Extra directory to search for `file` dictionary entries; may be
    /// repeated, first match wins, falls back to the actions file's own
    /// directory.
    #[clap(long = "aux-dir", value_name = "DIR")]
    aux_dir: Vec<path::PathBuf>,

    /// Increase diagnostic verbosity; may be repeated.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all diagnostics but errors.
    #[clap(short, long, conflicts_with = "verbose")]
    quiet: bool,
}
