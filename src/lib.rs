//
// Part of pinelint
// Copyright (c) 2026 pinelint contributors
// License: MIT
//

//! Static analysis for Pine Script: a tolerant lexer and parser, followed
//! by independent checkers whose violations are merged into one result.

pub mod analyzer;
pub mod builtin;
pub mod common;
pub mod error;
pub mod included;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod stdout;
pub mod text;
pub mod value_type;

pub use analyzer::{analyze, Analysis, Config};
