// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disc track: the contents of a medium in a source drive.

use crate::medium::Drive;
use std::sync::{Arc, Weak};

/// Reads a whole source disc, or one of its sessions.
///
/// The drive is referenced weakly: the drive layer owns it.
#[derive(Clone)]
pub struct DiscTrack {
    drive: Weak<dyn Drive>,
    pub session: Option<u32>,
}

impl DiscTrack {
    pub fn new(drive: &Arc<dyn Drive>) -> Self {
        Self { drive: Arc::downgrade(drive), session: None }
    }

    pub fn session(mut self, session: u32) -> Self {
        self.session = Some(session);
        self
    }

    /// The source drive, if it is still around.
    pub fn drive(&self) -> Option<Arc<dyn Drive>> {
        self.drive.upgrade()
    }
}

impl std::fmt::Debug for DiscTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let device = self.drive().map(|d| d.device_path().display().to_string());
        f.debug_struct("DiscTrack").field("device", &device).field("session", &self.session).finish()
    }
}
