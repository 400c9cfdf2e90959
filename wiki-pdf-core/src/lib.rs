#![doc = "wiki-pdf-core: core pipeline for wiki-pdf."]

//! Resolves local paths from a password-manager secure note, refreshes the
//! checkout, reads its sidebar for page order and has the converter render the
//! pages into one document.
//!
//! # Usage
//! Build a [`config::PipelineConfig`] and call [`pipeline::run_pipeline`] with
//! implementations of the [`contract`] traits (the CLI-backed ones live in
//! [`directory`], [`refresh`] and [`assemble`]).

pub mod assemble;
pub mod codebase;
pub mod config;
pub mod contract;
pub mod directory;
pub mod pipeline;
pub mod refresh;
pub mod sidebar;
