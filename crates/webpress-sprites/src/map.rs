/*
 * map.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Machine-readable record of an assembly run.
//!
//! Downstream tooling (and the test suite) uses this map to verify which
//! source image landed at which offset in which sheet. It is emitted as
//! JSON next to the rewritten stylesheet.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::packer::SpriteLayout;

/// One source-image entry within a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub original_file: PathBuf,
    pub assembled_file: PathBuf,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// One produced sheet with its ordered inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
    pub inputs: Vec<InputRecord>,
}

impl SheetRecord {
    /// Build the record for a packed layout, in first-referenced order.
    pub fn from_layout(layout: &SpriteLayout) -> Self {
        Self {
            file: layout.sheet_path.clone(),
            width: layout.width,
            height: layout.height,
            inputs: layout
                .entries()
                .map(|(reference, placed)| InputRecord {
                    original_file: reference.image_path.clone(),
                    assembled_file: layout.sheet_path.clone(),
                    offset_x: placed.x,
                    offset_y: placed.y,
                })
                .collect(),
        }
    }
}

/// The full assembly log for one stylesheet run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyMap {
    pub sheets: Vec<SheetRecord>,
}

impl AssemblyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sheet(&mut self, sheet: SheetRecord) {
        self.sheets.push(sheet);
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Find the entry for a source image, searching sheets in order.
    pub fn find_input(&self, original: &Path) -> Option<&InputRecord> {
        self.sheets
            .iter()
            .flat_map(|sheet| sheet.inputs.iter())
            .find(|input| input.original_file == original)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the map as JSON.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssemblyMap {
        AssemblyMap {
            sheets: vec![SheetRecord {
                file: PathBuf::from("/out/icons.png"),
                width: 16,
                height: 48,
                inputs: vec![
                    InputRecord {
                        original_file: PathBuf::from("/img/a.gif"),
                        assembled_file: PathBuf::from("/out/icons.png"),
                        offset_x: 0,
                        offset_y: 0,
                    },
                    InputRecord {
                        original_file: PathBuf::from("/img/b.gif"),
                        assembled_file: PathBuf::from("/out/icons.png"),
                        offset_x: 0,
                        offset_y: -16,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let map = sample();
        let json = map.to_json().expect("serialize");
        let back: AssemblyMap = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, map);
    }

    #[test]
    fn test_find_input() {
        let map = sample();
        let entry = map.find_input(Path::new("/img/b.gif")).expect("entry");
        assert_eq!(entry.offset_y, -16);
        assert!(map.find_input(Path::new("/img/zzz.gif")).is_none());
    }

    #[test]
    fn test_write_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("assembly.json");
        sample().write_to(&path).expect("write");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.contains("icons.png"));
    }
}
