//! Shared plumbing for the jsinfer workspace.
//!
//! Currently this is the string interner. Property names, symbol names, and
//! operator spellings all flow through [`Atom`] so that the hot comparison
//! paths in the solver are integer comparisons.

pub mod interner;

pub use interner::{Atom, intern};
