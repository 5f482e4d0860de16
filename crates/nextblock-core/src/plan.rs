//! YAML session plans.
//!
//! ```yaml
//! name: Writing day
//! blocks:
//!   - name: Outline
//!     duration: 25
//!   - name: Draft
//!     duration: 50
//! ```
//!
//! A plan without a top-level `name` (or one that is not valid YAML) fails
//! as a whole. Individual block entries that are incomplete or carry a
//! non-integer duration are skipped with a warning.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::PlanError;
use crate::session::Block;

/// Immutable template a session is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub name: String,
    pub blocks: Vec<Block>,
}

impl Plan {
    /// Read and parse a plan file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, PlanError> {
        let doc: Value = serde_yaml::from_str(content)?;
        let root = doc.as_mapping().ok_or(PlanError::MissingName)?;
        let name = get(root, "name")
            .and_then(scalar_to_string)
            .ok_or(PlanError::MissingName)?;

        let entries = match get(root, "blocks") {
            None | Some(Value::Null) => &[][..],
            Some(Value::Sequence(seq)) => seq.as_slice(),
            Some(_) => {
                tracing::warn!(plan = %name, "'blocks' is not a list; plan has no blocks");
                &[][..]
            }
        };

        let blocks = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match parse_block(entry) {
                Ok(block) => Some(block),
                Err(reason) => {
                    tracing::warn!(plan = %name, index = i, "skipping time block: {reason}");
                    None
                }
            })
            .collect();

        Ok(Self { name, blocks })
    }

    pub fn total_duration_min(&self) -> u64 {
        self.blocks
            .iter()
            .map(|b| u64::from(b.planned_duration()))
            .sum()
    }
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(Value::String(key.to_string()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_block(entry: &Value) -> Result<Block, String> {
    let map = entry
        .as_mapping()
        .ok_or_else(|| "entry is not a mapping".to_string())?;
    let (Some(name), Some(duration)) = (get(map, "name"), get(map, "duration")) else {
        return Err("missing 'name' or 'duration'".to_string());
    };
    let name = scalar_to_string(name).ok_or_else(|| "'name' is not a scalar".to_string())?;
    let duration = parse_minutes(duration)?;
    Ok(Block::new(name, duration))
}

fn parse_minutes(value: &Value) -> Result<u32, String> {
    let minutes = match value {
        Value::Number(n) => {
            if let Some(m) = n.as_u64() {
                Some(m)
            } else {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    minutes
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| format!("invalid duration {value:?}"))
}
