// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn every_name_builds_the_matching_job() {
    for name in NAMES {
        let job = by_name(name).unwrap();
        assert_eq!(job.name(), name);
    }
}

#[test]
fn unknown_name_is_none() {
    assert!(by_name("growisofs").is_none());
}
