use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four multi-value categorical fields of an incident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Technology,
    Sector,
    Issue,
    Transparency,
}

impl Family {
    /// Processing order used by the pipeline.
    pub const ALL: [Family; 4] = [
        Family::Technology,
        Family::Sector,
        Family::Issue,
        Family::Transparency,
    ];

    /// Header of the raw multi-value column in the input table.
    pub fn source_column(self) -> &'static str {
        match self {
            Family::Technology => "Technology(ies)",
            Family::Sector => "Sector(s)",
            Family::Issue => "Issue(s)",
            Family::Transparency => "Transparency",
        }
    }

    /// Prefix of the exported indicator column names.
    pub fn prefix(self) -> &'static str {
        match self {
            Family::Technology => "tech",
            Family::Sector => "sector",
            Family::Issue => "issue",
            Family::Transparency => "transp",
        }
    }

    /// Human readable name used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Family::Technology => "Technology",
            Family::Sector => "Sector",
            Family::Issue => "Issue",
            Family::Transparency => "Transparency",
        }
    }

    /// Lower-case identifier, also the rule file stem (`rules/<name>.json`).
    pub fn name(self) -> &'static str {
        match self {
            Family::Technology => "technology",
            Family::Sector => "sector",
            Family::Issue => "issue",
            Family::Transparency => "transparency",
        }
    }

    /// Exported column name for a token of this family, e.g. `tech_facial analysis`.
    pub fn column_name(self, token: &str) -> String {
        format!("{}_{}", self.prefix(), token)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Family::ALL
            .into_iter()
            .find(|f| f.name() == wanted || f.prefix() == wanted)
            .ok_or_else(|| {
                format!("unknown family '{s}' (expected technology, sector, issue or transparency)")
            })
    }
}
