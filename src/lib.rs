//! # il2cpp-finder
//!
//! Recovers classes, fields and methods from an IL2CPP `dump.cs` report and
//! answers search queries over them.
//!
//! ## Architecture
//!
//! - **modifiers**: Declaration keywords as a flag set
//! - **model**: Classes, fields, methods and aggregate stats
//! - **parse**: Line-oriented state machine over the dump text
//! - **search**: Read-only index and queries over the parsed classes
//! - **scan**: Locating `dump.cs` under a dump folder
//! - **load**: Memory-mapped reading and parsing of a dump file
//! - **cli** / **config**: Command-line flags and their resolution
//! - **command**: The query language shared by `--cmd` and the REPL
//! - **render**: Text, JSON and TypeScript output
//! - **repl**: Interactive prompt with history

pub mod cli;
pub mod command;
pub mod config;
pub mod load;
pub mod model;
pub mod modifiers;
pub mod parse;
pub mod render;
pub mod repl;
pub mod scan;
pub mod search;
