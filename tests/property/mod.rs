// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! proptest suites over write model folds and the in-memory log.

mod event_log;
mod write_model_replay;
