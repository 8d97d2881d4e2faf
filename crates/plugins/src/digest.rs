// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming digests shared by the checksum jobs.

use burner_core::{Checksum, ChecksumType};
use burner_engine::{JobError, WorkerScope};
use sha1::Digest as _;
use std::io::Read;

const CHUNK: usize = 64 * 1024;

/// Incremental hasher for one [`ChecksumType`].
pub enum Hasher {
    Md5(md5::Context),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
}

impl Hasher {
    /// `None` for [`ChecksumType::None`].
    pub fn new(kind: ChecksumType) -> Option<Self> {
        match kind {
            ChecksumType::None => None,
            ChecksumType::Md5 => Some(Hasher::Md5(md5::Context::new())),
            ChecksumType::Sha1 => Some(Hasher::Sha1(sha1::Sha1::new())),
            ChecksumType::Sha256 => Some(Hasher::Sha256(sha2::Sha256::new())),
        }
    }

    pub fn kind(&self) -> ChecksumType {
        match self {
            Hasher::Md5(_) => ChecksumType::Md5,
            Hasher::Sha1(_) => ChecksumType::Sha1,
            Hasher::Sha256(_) => ChecksumType::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(ctx) => ctx.consume(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    pub fn finish(self) -> Result<Checksum, JobError> {
        let kind = self.kind();
        let hex = match self {
            Hasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            Hasher::Sha1(h) => format!("{:x}", h.finalize()),
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
        };
        match Checksum::new(kind, &hex) {
            Some(checksum) => Ok(checksum),
            None => Err(JobError::general(format!("malformed {kind} digest \"{hex}\""))),
        }
    }
}

/// Digest at most `limit` bytes of `reader` on a worker, counting progress
/// and honouring cancellation between chunks.
pub fn hash_reader(
    kind: ChecksumType,
    reader: &mut impl Read,
    limit: Option<u64>,
    scope: &WorkerScope,
) -> Result<Checksum, JobError> {
    let Some(mut hasher) = Hasher::new(kind) else {
        return Err(JobError::general("no checksum type selected"));
    };
    let mut buf = vec![0u8; CHUNK];
    let mut remaining = limit.unwrap_or(u64::MAX);
    while remaining > 0 {
        scope.check()?;
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = scope.retry_io(|| reader.read(&mut buf[..want]))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        scope.add_done(n as u64);
        remaining -= n as u64;
    }
    hasher.finish()
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
