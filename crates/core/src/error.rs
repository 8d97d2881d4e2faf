// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain error raised by pipeline stages and surfaced to the user.

use std::io;

/// Structured category of a [`BurnerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    General,
    PluginMisbehavior,
    SlowDma,
    Permission,
    DriveBusy,
    DiskSpace,
    Empty,
    InputInvalid,
    OutputNone,
    FileInvalid,
    FileFolder,
    FilePlaylist,
    FileNotFound,
    FileNotLocal,
    WriteMedium,
    WriteImage,
    ImageInvalid,
    ImageJoliet,
    ImageLastSession,
    MediumNone,
    MediumInvalid,
    MediumSpace,
    MediumNoData,
    MediumNotWritable,
    MediumNotRewritable,
    MediumNeedReloading,
    BadChecksum,
    MissingAppAndPlugin,
    /// Checksums could not be verified; the burn itself succeeded
    ChecksumWarning,
    /// The source disc must be replaced by the target one
    InsertAfterCopyWarning,
    TmpDirectory,
    EncryptionKey,
}

impl ErrorKind {
    /// Warnings are reported to the user but never abort the chain.
    pub fn is_warning(self) -> bool {
        matches!(self, ErrorKind::ChecksumWarning | ErrorKind::InsertAfterCopyWarning)
    }
}

crate::simple_display! {
    ErrorKind {
        General => "general",
        PluginMisbehavior => "plugin_misbehavior",
        SlowDma => "slow_dma",
        Permission => "permission",
        DriveBusy => "drive_busy",
        DiskSpace => "disk_space",
        Empty => "empty",
        InputInvalid => "input_invalid",
        OutputNone => "output_none",
        FileInvalid => "file_invalid",
        FileFolder => "file_folder",
        FilePlaylist => "file_playlist",
        FileNotFound => "file_not_found",
        FileNotLocal => "file_not_local",
        WriteMedium => "write_medium",
        WriteImage => "write_image",
        ImageInvalid => "image_invalid",
        ImageJoliet => "image_joliet",
        ImageLastSession => "image_last_session",
        MediumNone => "medium_none",
        MediumInvalid => "medium_invalid",
        MediumSpace => "medium_space",
        MediumNoData => "medium_no_data",
        MediumNotWritable => "medium_not_writable",
        MediumNotRewritable => "medium_not_rewritable",
        MediumNeedReloading => "medium_need_reloading",
        BadChecksum => "bad_checksum",
        MissingAppAndPlugin => "missing_app_and_plugin",
        ChecksumWarning => "checksum_warning",
        InsertAfterCopyWarning => "insert_after_copy_warning",
        TmpDirectory => "tmp_directory",
        EncryptionKey => "encryption_key",
    }
}

/// Error reported by a job, carrying a kind and a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BurnerError {
    kind: ErrorKind,
    message: String,
}

impl BurnerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::General, message)
    }

    /// Wrap an I/O failure, mapping the few errno values that have a
    /// dedicated kind.
    pub fn io(context: impl std::fmt::Display, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::Permission,
            io::ErrorKind::StorageFull => ErrorKind::DiskSpace,
            _ => ErrorKind::General,
        };
        Self::new(kind, format!("{context}: {err}"))
    }

    /// Error for a child process that exited unsuccessfully without a more
    /// specific diagnosis.
    pub fn exit_code(program: &str, code: i32) -> Self {
        Self::general(format!("Process \"{program}\" ended with an error code ({code})"))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
