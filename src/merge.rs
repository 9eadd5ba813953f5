//! Curated synonym merging of indicator columns.
//!
//! Rule files are JSON arrays of `{"canonical": ..., "sources": [...]}`
//! objects, one file per family. Names are tokens without the family prefix,
//! normalized like cell values. Every column touched by a group is replaced
//! by a single canonical column holding the logical OR of its members.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::encode::{FamilyTable, IndicatorColumn};
use crate::error::{MergeRuleError, PipelineError, Result};
use crate::family::Family;
use crate::tokenize::normalize_token;

/// A canonical column and the source columns folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeGroup {
    pub canonical: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl MergeGroup {
    pub fn new<I, S>(canonical: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical token first, then every listed source other than the canonical.
    ///
    /// The canonical is always a member, so an existing column of that name is
    /// folded in rather than overwritten.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(
            self.sources
                .iter()
                .map(String::as_str)
                .filter(move |s| *s != self.canonical),
        )
    }
}

/// Validated merge groups for one family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRules {
    groups: Vec<MergeGroup>,
}

impl MergeRules {
    /// Normalizes and validates a list of groups.
    ///
    /// Rejects empty or repeated canonical names and any column claimed by
    /// more than one group. Repeats inside one group are dropped.
    pub fn new(groups: Vec<MergeGroup>) -> std::result::Result<Self, MergeRuleError> {
        let mut canonicals = HashSet::new();
        let mut owner: HashMap<String, String> = HashMap::new();
        let mut validated = Vec::with_capacity(groups.len());

        for (index, group) in groups.into_iter().enumerate() {
            let canonical = normalize_token(&group.canonical)
                .ok_or(MergeRuleError::EmptyCanonical { index })?;
            if !canonicals.insert(canonical.clone()) {
                return Err(MergeRuleError::DuplicateCanonical { canonical });
            }

            let mut seen = HashSet::new();
            let sources: Vec<String> = group
                .sources
                .iter()
                .filter_map(|s| normalize_token(s))
                .filter(|s| seen.insert(s.clone()))
                .collect();

            let normalized = MergeGroup {
                canonical: canonical.clone(),
                sources,
            };
            for member in normalized.members() {
                if let Some(previous) = owner.get(member) {
                    return Err(if member == canonical {
                        MergeRuleError::CanonicalClaimed {
                            canonical: canonical.clone(),
                            claimed_by: previous.clone(),
                        }
                    } else if member == previous.as_str() {
                        MergeRuleError::CanonicalClaimed {
                            canonical: previous.clone(),
                            claimed_by: canonical.clone(),
                        }
                    } else {
                        MergeRuleError::OverlappingSource {
                            source_token: member.to_string(),
                            first: previous.clone(),
                            second: canonical.clone(),
                        }
                    });
                }
                owner.insert(member.to_string(), canonical.clone());
            }
            validated.push(normalized);
        }

        Ok(Self { groups: validated })
    }

    /// Parses and validates a JSON rule list. `origin` names the source in errors.
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self> {
        let groups: Vec<MergeGroup> = serde_json::from_str(json)?;
        Self::new(groups).map_err(|source| PipelineError::MergeRules {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json, &path.display().to_string())
    }

    /// The curated rules shipped with the crate.
    pub fn builtin(family: Family) -> Result<Self> {
        let json = match family {
            Family::Technology => include_str!("../rules/technology.json"),
            Family::Sector => include_str!("../rules/sector.json"),
            Family::Issue => include_str!("../rules/issue.json"),
            Family::Transparency => include_str!("../rules/transparency.json"),
        };
        Self::from_json_str(json, &format!("built-in {family} rules"))
    }

    pub fn groups(&self) -> &[MergeGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Collapses each group's existing columns into one canonical column.
    ///
    /// Members without a column are skipped; a group with no existing member
    /// produces nothing. Untouched columns keep their order and come first,
    /// followed by the canonical columns in group order.
    pub fn apply(&self, table: FamilyTable) -> FamilyTable {
        let family = table.family();
        let rows = table.rows();
        let columns = table.into_columns();
        let index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.token().to_owned(), i))
            .collect();
        let mut slots: Vec<Option<IndicatorColumn>> = columns.into_iter().map(Some).collect();
        let mut merged = Vec::new();

        for group in &self.groups {
            let mut combined: Option<Vec<bool>> = None;
            for member in group.members() {
                let Some(column) = index.get(member).and_then(|&i| slots[i].take()) else {
                    if member != group.canonical {
                        debug!("{family}: no '{member}' column for '{}'", group.canonical);
                    }
                    continue;
                };
                let values = column.into_values();
                combined = Some(match combined.take() {
                    None => values,
                    Some(mut acc) => {
                        for (flag, other) in acc.iter_mut().zip(values) {
                            *flag |= other;
                        }
                        acc
                    }
                });
            }
            if let Some(values) = combined {
                merged.push(IndicatorColumn::new(group.canonical.clone(), values));
            }
        }

        let mut out: Vec<IndicatorColumn> = slots.into_iter().flatten().collect();
        out.extend(merged);
        FamilyTable::new(family, rows, out)
    }
}

/// Merge rules for every family.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<Family, MergeRules>,
}

impl RuleBook {
    /// Rules for all four families from the files shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let mut book = Self::default();
        for family in Family::ALL {
            book.insert(family, MergeRules::builtin(family)?);
        }
        Ok(book)
    }

    /// Loads `<dir>/<family>.json` for every family.
    ///
    /// A family without a file gets no merge rules.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PipelineError::Configuration(format!(
                "rules directory {} does not exist",
                dir.display()
            )));
        }
        let mut book = Self::default();
        for family in Family::ALL {
            let path = dir.join(format!("{}.json", family.name()));
            if path.is_file() {
                book.insert(family, MergeRules::load(&path)?);
            } else {
                warn!(
                    "no merge rules for {family} ({} not found), columns are kept as encoded",
                    path.display()
                );
            }
        }
        Ok(book)
    }

    pub fn insert(&mut self, family: Family, rules: MergeRules) {
        self.rules.insert(family, rules);
    }

    pub fn get(&self, family: Family) -> Option<&MergeRules> {
        self.rules.get(&family)
    }
}
