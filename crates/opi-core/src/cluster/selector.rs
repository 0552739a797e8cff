use std::{collections::BTreeMap, fmt};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Requirement {
    Equals(String, String),
    Exists(String),
}

/// Label query used by list calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Matches every object.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::everything().and_eq(key, value)
    }

    pub fn exists(key: impl Into<String>) -> Self {
        Self::everything().and_exists(key)
    }

    pub fn and_eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .push(Requirement::Equals(key.into(), value.into()));
        self
    }

    pub fn and_exists(mut self, key: impl Into<String>) -> Self {
        self.requirements.push(Requirement::Exists(key.into()));
        self
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| match req {
            Requirement::Equals(k, v) => labels.get(k) == Some(v),
            Requirement::Exists(k) => labels.contains_key(k),
        })
    }
}

/// Renders in the orchestrator's query syntax, e.g. `name=app0,tier`.
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, req) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match req {
                Requirement::Equals(k, v) => write!(f, "{k}={v}")?,
                Requirement::Exists(k) => f.write_str(k)?,
            }
        }
        Ok(())
    }
}
