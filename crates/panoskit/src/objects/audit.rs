//! Audit comment history of security rules.

use serde::{Deserialize, Serialize};

/// One audit comment attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditComment {
    pub admin: String,
    pub comment: String,
    pub config_version: i64,
    pub time_generated: String,
}

/// Paging direction through the history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Oldest first
    Forward,
    /// Newest first
    #[default]
    Backward,
}

impl Direction {
    /// Parse the `forward`/`backward` attribute value; empty means backward.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "backward" => Some(Self::Backward),
            "forward" => Some(Self::Forward),
            _ => None,
        }
    }
}

/// Paging parameters for an audit comment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditQuery {
    /// Maximum number of comments
    pub nlogs: usize,
    /// Comments to skip first
    pub skip: usize,
    pub direction: Direction,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            nlogs: 100,
            skip: 0,
            direction: Direction::Backward,
        }
    }
}

impl AuditQuery {
    /// Apply paging to a history stored oldest first.
    pub fn page(&self, history: &[AuditComment]) -> Vec<AuditComment> {
        let ordered: Box<dyn Iterator<Item = &AuditComment>> = match self.direction {
            Direction::Forward => Box::new(history.iter()),
            Direction::Backward => Box::new(history.iter().rev()),
        };
        ordered.skip(self.skip).take(self.nlogs).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<AuditComment> {
        (1..=5)
            .map(|v| AuditComment {
                admin: "admin".into(),
                comment: format!("change {v}"),
                config_version: v,
                time_generated: format!("2024/01/0{v} 10:00:00"),
            })
            .collect()
    }

    #[test]
    fn test_backward_paging() {
        let query = AuditQuery {
            nlogs: 2,
            skip: 1,
            direction: Direction::Backward,
        };
        let page = query.page(&history());
        let versions: Vec<i64> = page.iter().map(|c| c.config_version).collect();
        assert_eq!(versions, vec![4, 3]);
    }

    #[test]
    fn test_forward_paging() {
        let query = AuditQuery {
            nlogs: 10,
            skip: 3,
            direction: Direction::Forward,
        };
        let versions: Vec<i64> = query.page(&history()).iter().map(|c| c.config_version).collect();
        assert_eq!(versions, vec![4, 5]);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse(""), Some(Direction::Backward));
        assert_eq!(Direction::parse("forward"), Some(Direction::Forward));
        assert_eq!(Direction::parse("sideways"), None);
    }
}
