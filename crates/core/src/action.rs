// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a task is asked to do, and what it reports it is doing.

use serde::{Deserialize, Serialize};

/// The action a task (and every job in it) performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    /// Compute the size of the output without producing it
    Size,
    /// Produce an image or intermediate track
    Image,
    /// Write to the target medium
    Record,
    /// Blank a rewritable medium
    Erase,
    /// Compute or verify a checksum
    Checksum,
}

crate::simple_display! {
    Action {
        None => "none",
        Size => "size",
        Image => "image",
        Record => "record",
        Erase => "erase",
        Checksum => "checksum",
    }
}

/// Fine-grained activity reported to the user while a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BurnAction {
    #[default]
    None,
    GettingSize,
    CreatingImage,
    Recording,
    Blanking,
    Checksum,
    DriveCopy,
    FileCopy,
    Analysing,
    Transcoding,
    Preparing,
    Leadin,
    RecordingCdText,
    Fixating,
    Leadout,
    StartRecording,
    Finished,
    Ejecting,
}

impl BurnAction {
    /// Default human-readable label for the activity.
    pub fn label(self) -> &'static str {
        match self {
            BurnAction::None => "",
            BurnAction::GettingSize => "Getting size",
            BurnAction::CreatingImage => "Creating image",
            BurnAction::Recording => "Writing",
            BurnAction::Blanking => "Blanking",
            BurnAction::Checksum => "Creating checksum",
            BurnAction::DriveCopy => "Copying disc",
            BurnAction::FileCopy => "Copying file",
            BurnAction::Analysing => "Analysing audio files",
            BurnAction::Transcoding => "Transcoding song",
            BurnAction::Preparing => "Preparing to write",
            BurnAction::Leadin => "Writing leadin",
            BurnAction::RecordingCdText => "Writing CD-Text information",
            BurnAction::Fixating => "Finalizing",
            BurnAction::Leadout => "Writing leadout",
            BurnAction::StartRecording => "Starting to record",
            BurnAction::Finished => "Success",
            BurnAction::Ejecting => "Ejecting medium",
        }
    }
}

crate::flags! {
    /// Session-wide burn options shared by every job of the chain.
    pub struct BurnFlags: u32 {
        const EJECT = 1 << 0;
        const NOGRACE = 1 << 1;
        const BURNPROOF = 1 << 2;
        const OVERBURN = 1 << 3;
        const MULTI = 1 << 4;
        const DAO = 1 << 5;
        const RAW = 1 << 6;
        const DUMMY = 1 << 7;
        const APPEND = 1 << 8;
        const MERGE = 1 << 9;
        const FAST_BLANK = 1 << 10;
        const CHECK_SIZE = 1 << 11;
        const NO_TMP_FILES = 1 << 12;
        const BLANK_BEFORE_WRITE = 1 << 13;
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
