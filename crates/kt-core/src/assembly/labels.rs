//! Assembly labels and base-link selection

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kinematics::ConvertError;
use crate::part::Part;

/// Node of the assembly hierarchy, carrying the human-assigned name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    /// Containing assembly label (None for the top-level assembly)
    #[serde(default)]
    pub parent: Option<Uuid>,
}

impl Label {
    /// Create a label for a (sub-)assembly
    pub fn new(name: impl Into<String>, parent: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent,
        }
    }

    /// Create the label naming `part` (shares the part's id)
    pub fn for_part(part: &Part, parent: Option<Uuid>) -> Self {
        Self {
            id: part.id,
            name: part.name.clone(),
            parent,
        }
    }
}

/// Compiled base-link name pattern, anchored at the start of the name
#[derive(Debug, Clone)]
pub struct BaseLinkPattern {
    source: String,
    regex: Regex,
}

impl BaseLinkPattern {
    pub fn new(pattern: &str) -> Result<Self, ConvertError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            ConvertError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Select the parts whose label name matches `pattern`.
///
/// Result is sorted by (name, id). Matching labels that do not name a part are
/// skipped. An empty result is an error.
pub fn locate_base_links(
    labels: &HashMap<Uuid, Label>,
    pattern: &BaseLinkPattern,
    parts: &HashMap<Uuid, Part>,
) -> Result<Vec<Uuid>, ConvertError> {
    let mut matches: Vec<&Label> = labels
        .values()
        .filter(|label| pattern.is_match(&label.name))
        .filter(|label| {
            let is_part = parts.contains_key(&label.id);
            if !is_part {
                tracing::warn!(
                    "Label '{}' matches base-link pattern '{}' but is not a part; skipping",
                    label.name,
                    pattern.as_str()
                );
            }
            is_part
        })
        .collect();

    if matches.is_empty() {
        return Err(ConvertError::NoBaseLinkFound {
            pattern: pattern.as_str().to_string(),
        });
    }

    matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(matches.into_iter().map(|label| label.id).collect())
}

/// Find the single top-level assembly label (the one without a parent)
pub fn root_assembly(labels: &HashMap<Uuid, Label>) -> Result<&Label, ConvertError> {
    let mut roots = labels.values().filter(|label| label.parent.is_none());
    match (roots.next(), roots.next()) {
        (Some(root), None) => Ok(root),
        _ => Err(ConvertError::RootAssembly {
            count: labels.values().filter(|l| l.parent.is_none()).count(),
        }),
    }
}
