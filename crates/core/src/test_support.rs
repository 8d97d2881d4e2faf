// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{ImageFormat, ImageTrack, StreamFormat, StreamTrack, Track, TrackRef};
use std::path::Path;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core value types.
pub mod strategies {
    use crate::GraftPoint;
    use proptest::prelude::*;

    pub fn arb_image_path() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-zA-Z0-9 _.-]{1,12}", 1..4)
            .prop_map(|parts| format!("/{}", parts.join("/")))
    }

    pub fn arb_graft_point() -> impl Strategy<Value = GraftPoint> {
        prop_oneof![
            arb_image_path().prop_map(GraftPoint::directory),
            (arb_image_path(), arb_image_path())
                .prop_map(|(src, dest)| GraftPoint::new(format!("file://{src}"), dest)),
        ]
    }
}

// ── Track factory functions ─────────────────────────────────────────────────

/// Audio stream track over `[start_s, end_s)` seconds of `source`.
pub fn stream_track(source: &str, start_s: u64, end_s: u64) -> TrackRef {
    Track::stream(
        StreamTrack::new(source, StreamFormat::UNDEFINED)
            .start(start_s * 1_000_000_000)
            .end(end_s * 1_000_000_000),
    )
}

/// ISO image track for an existing file.
pub fn image_track(path: &Path) -> TrackRef {
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    Track::image(ImageTrack::new(path, ImageFormat::Bin).with_blocks_from_len(len))
}
