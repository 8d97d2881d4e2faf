// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed key-value side metadata attached to tracks and to the session.

use crate::checksum::Checksum;
use std::collections::HashMap;

/// Well-known tag keys.
pub mod keys {
    pub const TRACK_TITLE: &str = "track::title";
    pub const TRACK_ARTIST: &str = "track::artist";
    pub const TRACK_COMPOSER: &str = "track::composer";
    pub const TRACK_ISRC: &str = "track::isrc";
    pub const TRACK_CHECKSUM: &str = "track::checksum";
    pub const DATA_LABEL: &str = "data::label";
    pub const AUDIO_TITLE: &str = "audio::title";
    pub const CD_TEXT_ALBUM: &str = "cd-text::album";
    /// Paths whose digest did not match the checksum manifest
    pub const CHECKSUM_MISMATCHES: &str = "checksum::mismatches";
}

/// A typed tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
    Checksum(Checksum),
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Str(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Str(v)
    }
}

impl From<Vec<String>> for TagValue {
    fn from(v: Vec<String>) -> Self {
        TagValue::StrList(v)
    }
}

impl From<Checksum> for TagValue {
    fn from(v: Checksum) -> Self {
        TagValue::Checksum(v)
    }
}

/// String-keyed tag store. Setting a key replaces any previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    values: HashMap<String, TagValue>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, returning the replaced value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Option<TagValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            TagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_checksum(&self, key: &str) -> Option<&Checksum> {
        match self.values.get(key)? {
            TagValue::Checksum(c) => Some(c),
            _ => None,
        }
    }

    /// Copy every tag of `other` that is not already set here.
    pub fn merge_missing(&mut self, other: &Tags) {
        for (key, value) in &other.values {
            self.values.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[path = "tags_tests.rs"]
mod tests;
