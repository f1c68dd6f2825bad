//! Reading and writing of the group file format

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;

use super::{extension_for, part_file, LoadReport, PersistError};
use crate::seq_store::{SequenceEntry, SequenceStore, DEFAULT_SPEED};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const GROUP_PREFIX: &str = "POSITION";
const KEY_POSITIONS: &str = "jointPositions";
const KEY_SPEEDS: &str = "jointVelocities";
const KEY_TIMING: &str = "timing";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A record as read from the file, before validation against the part.
#[derive(Debug, Default)]
struct RawRecord {
    positions: Option<Vec<f64>>,
    speeds: Option<Vec<f64>>,
    timing: Option<f64>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Save a table for the given part.
///
/// Rows are written in slot order, stopping at the first slot which is empty or has no timing.
/// The part's extension is appended to `path`, the path actually written is returned.
pub fn save<P: AsRef<Path>>(
    store: &SequenceStore,
    path: P,
    part_label: &str,
) -> Result<PathBuf, PersistError> {
    let path = path.as_ref();

    let out_path =
        part_file(path, part_label).ok_or_else(|| PersistError::InvalidPath(path.to_path_buf()))?;

    let mut text = String::new();
    let mut num_records = 0;

    for slot in 0..store.capacity() {
        let entry = match store.entry(slot) {
            Some(e) if e.has_timing() => e,
            _ => break,
        };

        // Writing to a String cannot fail
        let _ = writeln!(text, "[{}{}]", GROUP_PREFIX, slot);
        let _ = writeln!(text, "{} {}", KEY_POSITIONS, format_values(&entry.positions));
        let _ = writeln!(text, "{} {}", KEY_SPEEDS, format_values(&entry.speeds));
        let _ = writeln!(text, "{} {:.2}", KEY_TIMING, entry.timing);
        text.push('\n');

        num_records += 1;
    }

    if num_records == 0 {
        return Err(PersistError::NothingToSave);
    }

    fs::write(&out_path, text).map_err(|e| PersistError::Io(out_path.clone(), e))?;

    info!("Saved {} records to {:?}", num_records, out_path);

    Ok(out_path)
}

/// Load a table for the given part from a file previously saved for it.
///
/// Records `POSITION0` to `POSITION<capacity - 2>` are read. The first record must be valid,
/// later records which have the wrong number of joints, or are missing before the last record,
/// are skipped and leave their slot empty. A valid record at `capacity - 1` means the file held more than the table can take,
/// this is reported in [`LoadReport::truncated`].
///
/// Loaded rows get a play order equal to their slot.
pub fn load<P: AsRef<Path>>(
    path: P,
    part_label: &str,
    capacity: usize,
    num_joints: usize,
) -> Result<LoadReport, PersistError> {
    let path = path.as_ref();

    let expected = extension_for(part_label);
    if path.extension().and_then(|e| e.to_str()) != Some(expected.as_str()) {
        return Err(PersistError::WrongExtension {
            path: path.to_path_buf(),
            expected,
        });
    }

    let text = fs::read_to_string(path).map_err(|e| PersistError::Io(path.to_path_buf(), e))?;
    let mut records = parse(&text)?;

    let mut store = SequenceStore::new(capacity, num_joints)?;
    let mut skipped = Vec::new();

    // The first record must be present and of the right length
    match records.remove(&0) {
        Some(r) => {
            let found = r.positions.as_ref().map_or(0, |p| p.len());
            if found != num_joints {
                return Err(PersistError::FirstRecordWrongLength {
                    expected: num_joints,
                    found,
                });
            }
            store.restore(to_entry(0, r, num_joints))?;
        }
        None => return Err(PersistError::MissingFirstRecord),
    }

    let sentinel = store.sentinel_slot();

    // Gaps before the last record are reported, the unused tail of the table is not
    let last_index = records.keys().copied().filter(|&i| i < sentinel).max().unwrap_or(0);

    for index in 1..sentinel {
        match records.remove(&index) {
            Some(r) if is_valid(&r, num_joints) => {
                store.restore(to_entry(index, r, num_joints))?
            }
            Some(_) => {
                warn!(
                    "Skipping record {} of {:?}, it does not have {} joints",
                    index, path, num_joints
                );
                skipped.push(index);
            }
            None if index < last_index => {
                warn!("Record {} is missing from {:?}", index, path);
                skipped.push(index);
            }
            None => (),
        }
    }

    let truncated = records
        .get(&sentinel)
        .map_or(false, |r| is_valid(r, num_joints));
    if truncated {
        warn!(
            "{:?} holds more than {} records, the sequence was truncated",
            path,
            sentinel
        );
    }

    info!("Loaded {} records from {:?}", store.len(), path);

    Ok(LoadReport {
        store,
        truncated,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.2}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_valid(record: &RawRecord, num_joints: usize) -> bool {
    record.positions.as_ref().map_or(false, |p| p.len() == num_joints)
        && record.speeds.as_ref().map_or(true, |s| s.len() == num_joints)
}

fn to_entry(slot: usize, record: RawRecord, num_joints: usize) -> SequenceEntry {
    SequenceEntry {
        slot,
        positions: record.positions.unwrap_or_default(),
        speeds: match record.speeds {
            Some(s) if s.len() == num_joints => s,
            _ => vec![DEFAULT_SPEED; num_joints],
        },
        timing: record.timing.unwrap_or(0.0),
        play_order: slot as i32,
    }
}

/// Parse the text of a file into its `POSITION<n>` records.
///
/// Groups with other names are ignored.
fn parse(text: &str) -> Result<BTreeMap<usize, RawRecord>, PersistError> {
    let group_re = Regex::new(r"^\[\s*([A-Za-z_]\w*?)(\d*)\s*\]$").map_err(|e| {
        PersistError::Malformed {
            line: 0,
            reason: e.to_string(),
        }
    })?;

    let mut records = BTreeMap::new();

    // Index of the record being read, `None` inside an ignored group, and whether a group has
    // been opened at all
    let mut current: Option<usize> = None;
    let mut in_group = false;

    for (i, raw_line) in text.lines().enumerate() {
        let line_num = i + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if let Some(cap) = group_re.captures(line) {
            in_group = true;
            let name = cap.get(1).map_or("", |m| m.as_str());
            let index = cap.get(2).map_or("", |m| m.as_str());

            current = if name == GROUP_PREFIX && !index.is_empty() {
                let index: usize = index.parse().map_err(|_| PersistError::Malformed {
                    line: line_num,
                    reason: format!("invalid record index in {}", line),
                })?;
                if records.insert(index, RawRecord::default()).is_some() {
                    return Err(PersistError::Malformed {
                        line: line_num,
                        reason: format!("record {} appears twice", index),
                    });
                }
                Some(index)
            } else {
                debug!("Ignoring group {} at line {}", line, line_num);
                None
            };
            continue;
        }

        if !in_group {
            return Err(PersistError::Malformed {
                line: line_num,
                reason: "value outside of a record".into(),
            });
        }

        let record = match current.and_then(|c| records.get_mut(&c)) {
            Some(r) => r,
            None => continue,
        };

        let mut words = line.split_whitespace();
        let key = words.next().unwrap_or("");
        let values = words
            .map(|w| w.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| PersistError::Malformed {
                line: line_num,
                reason: format!("{} in \"{}\"", e, line),
            })?;

        if values.iter().any(|v| !v.is_finite()) {
            return Err(PersistError::Malformed {
                line: line_num,
                reason: format!("non-finite value in \"{}\"", line),
            });
        }

        match key {
            KEY_POSITIONS => record.positions = Some(values),
            KEY_SPEEDS => record.speeds = Some(values),
            KEY_TIMING => {
                if values.len() != 1 {
                    return Err(PersistError::Malformed {
                        line: line_num,
                        reason: format!("expected one timing value, found {}", values.len()),
                    });
                }
                record.timing = Some(values[0]);
            }
            k => debug!("Ignoring unknown key {} at line {}", k, line_num),
        }
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
