// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    none = { Action::None, "none" },
    size = { Action::Size, "size" },
    image = { Action::Image, "image" },
    record = { Action::Record, "record" },
    erase = { Action::Erase, "erase" },
    checksum = { Action::Checksum, "checksum" },
)]
fn action_display(action: Action, expected: &str) {
    assert_eq!(action.to_string(), expected);
}

#[test]
fn flags_contains_and_remove() {
    let mut flags = BurnFlags::DAO | BurnFlags::EJECT;
    assert!(flags.contains(BurnFlags::DAO));
    assert!(flags.contains(BurnFlags::DAO | BurnFlags::EJECT));
    assert!(!flags.contains(BurnFlags::DUMMY));

    flags.remove(BurnFlags::DAO);
    assert!(!flags.contains(BurnFlags::DAO));
    assert!(flags.intersects(BurnFlags::EJECT | BurnFlags::DUMMY));
}

#[test]
fn flags_debug_lists_names() {
    let flags = BurnFlags::MULTI | BurnFlags::NOGRACE;
    assert_eq!(format!("{flags:?}"), "BurnFlags(NOGRACE | MULTI)");
    assert_eq!(format!("{:?}", BurnFlags::empty()), "BurnFlags(empty)");
}

#[test]
fn flags_set_toggles() {
    let mut flags = BurnFlags::empty();
    flags.set(BurnFlags::FAST_BLANK, true);
    assert!(flags.contains(BurnFlags::FAST_BLANK));
    flags.set(BurnFlags::FAST_BLANK, false);
    assert!(flags.is_empty());
}

#[test]
fn burn_action_labels_are_distinct_for_user_facing_steps() {
    assert_eq!(BurnAction::Fixating.label(), "Finalizing");
    assert_ne!(BurnAction::Recording.label(), BurnAction::Blanking.label());
    assert!(BurnAction::None.label().is_empty());
}
