// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, collecting sinks, and graph JSON export for rigsolve
//! diagnostics.
//!
//! This crate provides [`TraceSink`](rigsolve_core::trace::TraceSink)
//! implementations and a graph dump for development:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`collect::CollectingSink`]: keeps every event in memory for
//!   inspection in tests and tools.
//! - [`graph_json::export`]: writes a dependency graph, laid out by
//!   breadth-first level, as JSON for a graph viewer.

pub mod collect;
pub mod graph_json;
pub mod pretty;
