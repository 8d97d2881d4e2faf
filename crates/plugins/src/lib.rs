// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! burner-plugins: the concrete jobs a burn session chains together

pub mod checksum_files;
pub mod checksum_image;
mod digest;
pub mod genisoimage;
pub mod local_track;
pub mod transcode;
pub mod wodim;

pub use checksum_files::ChecksumFiles;
pub use checksum_image::ChecksumImage;
pub use genisoimage::Genisoimage;
pub use local_track::LocalTrack;
pub use transcode::Transcode;
pub use wodim::Wodim;

use burner_engine::Job;

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 6] = ["checksum-image", "checksum-files", "local-track", "transcode", "genisoimage", "wodim"];

/// A fresh job for `name`.
pub fn by_name(name: &str) -> Option<Box<dyn Job>> {
    let job: Box<dyn Job> = match name {
        "checksum-image" => Box::new(ChecksumImage::new()),
        "checksum-files" => Box::new(ChecksumFiles::new()),
        "local-track" => Box::new(LocalTrack::new()),
        "transcode" => Box::new(Transcode::new()),
        "genisoimage" => Box::new(Genisoimage::job()),
        "wodim" => Box::new(Wodim::job()),
        _ => return None,
    };
    Some(job)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
