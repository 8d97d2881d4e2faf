// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";
const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

fn fixture() -> (tempfile::TempDir, PathBuf, EngineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hello.iso");
    std::fs::write(&file, b"hello").unwrap();
    let config = EngineConfig { tmp_dir: dir.path().to_path_buf(), tick_interval_ms: 10, ..EngineConfig::default() };
    (dir, file, config)
}

fn args(file: PathBuf, kind: Option<ChecksumType>, expect: Option<&str>) -> ChecksumArgs {
    ChecksumArgs { file, kind, expect: expect.map(str::to_string) }
}

#[parameterized(
    md5 = { None, HELLO_MD5 },
    sha1 = { Some(ChecksumType::Sha1), HELLO_SHA1 },
)]
fn digests_are_computed(kind: Option<ChecksumType>, digest: &str) {
    let (_dir, file, config) = fixture();
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    let checksum = runtime.block_on(run(&args(file, kind, None), config)).unwrap();
    assert_eq!(checksum.value(), digest);
}

#[tokio::test]
async fn matching_digest_verifies() {
    let (_dir, file, config) = fixture();
    let checksum = run(&args(file, None, Some(HELLO_SHA1)), config).await.unwrap();
    assert_eq!(checksum.kind(), ChecksumType::Sha1);
}

#[tokio::test]
async fn mismatch_exits_with_the_checksum_code() {
    let (_dir, file, config) = fixture();
    let wrong = "00000000000000000000000000000000";
    let err = run(&args(file, None, Some(wrong)), config).await.unwrap_err();
    assert_eq!(err.code, codes::BAD_CHECKSUM);
}

#[tokio::test]
async fn malformed_digest_is_rejected_before_running() {
    let (_dir, file, config) = fixture();
    let err = run(&args(file, Some(ChecksumType::Md5), Some(HELLO_SHA1)), config).await.unwrap_err();
    assert_eq!(err.code, codes::FAILURE);
    assert!(err.message.contains("not a valid digest"));
}

#[tokio::test]
async fn missing_file_fails() {
    let (dir, _file, config) = fixture();
    let err = run(&args(dir.path().join("nope.iso"), None, None), config).await.unwrap_err();
    assert!(err.message.contains("cannot read"));
}
