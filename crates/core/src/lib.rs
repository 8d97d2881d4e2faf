// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! burner-core: value types shared by every stage of the burning pipeline

pub mod macros;

pub mod action;
pub mod checksum;
pub mod error;
pub mod graft;
pub mod medium;
pub mod status;
pub mod tags;
pub mod track;
pub mod uri;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{Action, BurnAction, BurnFlags};
pub use checksum::{Checksum, ChecksumType};
pub use error::{BurnerError, ErrorKind};
pub use graft::GraftPoint;
pub use medium::{Drive, MediumFamily, MediumInfo, MediumStatus, MediumTrack, StaticDrive};
pub use status::{Status, StatusResult};
pub use tags::{TagValue, Tags};
pub use track::{
    DataTrack, DiscTrack, FsFlags, ImageFormat, ImageTrack, StreamFormat, StreamTrack, Track,
    TrackId, TrackKind, TrackRef, TrackSize, TrackType,
};
