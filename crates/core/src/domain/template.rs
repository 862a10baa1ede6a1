use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One position in a template's approval chain. Levels start at 1 and are
/// acted on in strict ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverLevel {
    pub level: u32,
    pub approver_id: String,
    pub approver_name: String,
}

/// Ordered approver levels a submission must clear. An empty chain means the
/// template requires no approval at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChain(pub Vec<ApproverLevel>);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain levels must start at 1 and ascend without gaps; found level {found} at position {position}")]
    NonContiguousLevels { position: usize, found: u32 },
    #[error("approver id must not be blank at level {level}")]
    BlankApprover { level: u32 },
}

impl ApprovalChain {
    pub fn new(levels: Vec<ApproverLevel>) -> Result<Self, ChainError> {
        let chain = Self(levels);
        chain.validate()?;
        Ok(chain)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        for (position, entry) in self.0.iter().enumerate() {
            let expected = position as u32 + 1;
            if entry.level != expected {
                return Err(ChainError::NonContiguousLevels { position, found: entry.level });
            }
            if entry.approver_id.trim().is_empty() {
                return Err(ChainError::BlankApprover { level: entry.level });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Highest level in the chain, or 0 for an empty chain.
    pub fn last_level(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn approver_at(&self, level: u32) -> Option<&ApproverLevel> {
        if level == 0 {
            return None;
        }
        self.0.get(level as usize - 1)
    }

    pub fn levels(&self) -> impl Iterator<Item = &ApproverLevel> {
        self.0.iter()
    }
}

/// A form definition as the engine sees it: the field contract plus the
/// approval chain. Field rendering and layout live outside this engine; the
/// only schema knowledge carried here is which field ids must be present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: TemplateId,
    pub name: String,
    pub required_fields: Vec<String>,
    pub chain: ApprovalChain,
    pub is_reusable: bool,
    pub archived: bool,
}

impl FormTemplate {
    pub fn requires_approval(&self) -> bool {
        !self.chain.is_empty()
    }
}
