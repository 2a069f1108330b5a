//! Property-based tests for the partition, term-update, and framing laws.
//!
//! Run with: `cargo test --test property`

mod split_ranges;
mod stream_frames;
mod term_updates;
