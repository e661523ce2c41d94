//! Gene-set scoring for expression QC.
//!
//! Loads a gene-set catalog and a count matrix, scores every
//! (sample, gene set) pair with a chosen aggregation, and writes per-gene-set
//! score tables, a clustered heatmap and a build manifest.

pub mod app;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod manifest;
pub mod matrix;
pub mod output;
pub mod render;
pub mod report;
pub mod score;
