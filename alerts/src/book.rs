//! Per-user limit thresholds stored as a `user -> symbol -> kind -> [values]` tree.

use tracing::debug;

use crate::{
    errors::{LimitsError, TreeError},
    limits::{CoinLimits, LimitKind, LimitSpec},
    tree::ConfigNode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    AlreadyExists,
}

/// What [`LimitsBook::remove_limit`] deletes for one user and symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoveTarget {
    /// Every threshold of the symbol.
    Symbol,
    /// Every threshold of one kind.
    Kind(LimitKind),
    /// A single threshold.
    Value(LimitKind, f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitsBook {
    root: ConfigNode,
}

fn malformed(path: &[&str], what: &str) -> LimitsError {
    LimitsError::Malformed(format!("{what} at `{}`", path.join(".")))
}

fn spec_from_node(kind: LimitKind, node: &ConfigNode, path: &[&str]) -> Result<LimitSpec, LimitsError> {
    let ConfigNode::List(items) = node else {
        return Err(malformed(path, "expected a list of numbers"));
    };
    let values = items
        .iter()
        .map(|item| match item {
            ConfigNode::Number(n) => Ok(*n),
            _ => Err(malformed(path, "expected a number")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LimitSpec::new(kind, values))
}

fn spec_to_node(spec: &LimitSpec) -> ConfigNode {
    ConfigNode::List(spec.thresholds().iter().map(|v| ConfigNode::Number(*v)).collect())
}

impl LimitsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a tree only if it has the `user -> symbol -> low|high -> [numbers]` shape.
    pub fn from_tree(root: ConfigNode) -> Result<Self, LimitsError> {
        let users = root.as_branch().ok_or_else(|| malformed(&[], "expected an object of users"))?;
        for (user, symbols) in users {
            let symbols = symbols
                .as_branch()
                .ok_or_else(|| malformed(&[user.as_str()], "expected an object of symbols"))?;
            for (symbol, kinds) in symbols {
                let kinds = kinds
                    .as_branch()
                    .ok_or_else(|| malformed(&[user.as_str(), symbol.as_str()], "expected an object of limit kinds"))?;
                for (kind, values) in kinds {
                    let path = [user.as_str(), symbol.as_str(), kind.as_str()];
                    let kind = LimitKind::parse(kind)
                        .filter(|k| k.as_str() == kind.as_str())
                        .ok_or_else(|| malformed(&path, "limit kind must be `low` or `high`"))?;
                    spec_from_node(kind, values, &path)?;
                }
            }
        }
        Ok(Self { root })
    }

    pub fn from_json(text: &str) -> Result<Self, LimitsError> {
        Self::from_tree(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, LimitsError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn as_tree(&self) -> &ConfigNode {
        &self.root
    }

    pub fn users(&self) -> Vec<String> {
        self.root
            .as_branch()
            .map(|users| users.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn symbols_for(&self, user: &str) -> Vec<String> {
        self.root
            .get(&[user])
            .ok()
            .and_then(ConfigNode::as_branch)
            .map(|symbols| symbols.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn spec(&self, user: &str, symbol: &str, kind: LimitKind) -> Result<LimitSpec, LimitsError> {
        let path = [user, symbol, kind.as_str()];
        match self.root.get(&path) {
            Ok(node) => spec_from_node(kind, node, &path),
            Err(TreeError::KeyNotFound { .. }) => Ok(LimitSpec::empty(kind)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn coin_limits(&self, user: &str, symbol: &str) -> Result<CoinLimits, LimitsError> {
        if self.root.get(&[user]).is_err() {
            return Err(LimitsError::ConfigMissing {
                user: user.to_string(),
                symbol: None,
            });
        }
        if self.root.get(&[user, symbol]).is_err() {
            return Err(LimitsError::ConfigMissing {
                user: user.to_string(),
                symbol: Some(symbol.to_string()),
            });
        }
        Ok(CoinLimits {
            low: self.spec(user, symbol, LimitKind::Low)?,
            high: self.spec(user, symbol, LimitKind::High)?,
        })
    }

    pub fn add_limit(
        &mut self,
        user: &str,
        symbol: &str,
        kind: LimitKind,
        value: f64,
    ) -> Result<AddOutcome, LimitsError> {
        if !value.is_finite() {
            return Err(LimitsError::InvalidValue(value));
        }
        let mut spec = self.spec(user, symbol, kind)?;
        if !spec.insert(value) {
            return Ok(AddOutcome::AlreadyExists);
        }
        self.root.set(&[user, symbol, kind.as_str()], spec_to_node(&spec))?;
        debug!(user, symbol, %kind, value, "limit added");
        Ok(AddOutcome::Created)
    }

    /// Deletes thresholds and then any branch the deletion left empty.
    pub fn remove_limit(&mut self, user: &str, symbol: &str, target: RemoveTarget) -> Result<(), LimitsError> {
        self.coin_limits(user, symbol)?;
        match target {
            RemoveTarget::Symbol => {
                self.root.remove(&[user, symbol])?;
            }
            RemoveTarget::Kind(kind) => {
                self.root.remove(&[user, symbol, kind.as_str()])?;
            }
            RemoveTarget::Value(kind, value) => {
                let mut spec = self.spec(user, symbol, kind)?;
                if !spec.remove(value) {
                    return Err(LimitsError::ValueNotFound {
                        user: user.to_string(),
                        symbol: symbol.to_string(),
                        kind,
                        value,
                    });
                }
                let path = [user, symbol, kind.as_str()];
                if spec.is_empty() {
                    self.root.remove(&path)?;
                } else {
                    self.root.set(&path, spec_to_node(&spec))?;
                }
            }
        }
        self.prune(&[user, symbol])?;
        debug!(user, symbol, ?target, "limit removed");
        Ok(())
    }

    pub fn remove_user(&mut self, user: &str) -> Result<(), LimitsError> {
        match self.root.remove(&[user]) {
            Ok(_) => Ok(()),
            Err(TreeError::KeyNotFound { .. }) => Err(LimitsError::ConfigMissing {
                user: user.to_string(),
                symbol: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes `path` and its ancestors, deepest first, while they are empty.
    fn prune(&mut self, path: &[&str]) -> Result<(), TreeError> {
        for depth in (1..=path.len()).rev() {
            let prefix = &path[..depth];
            match self.root.is_populated(prefix) {
                Ok(true) => break,
                Ok(false) => {
                    self.root.remove(prefix)?;
                }
                Err(TreeError::KeyNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Human-readable listing of a user's limits.
    pub fn describe_user(&self, user: &str) -> String {
        let symbols = self.symbols_for(user);
        if symbols.is_empty() {
            return format!("{user} has no coins");
        }
        let mut out = format!("{user} coins:\n");
        for symbol in symbols {
            out.push_str(&format!("> {symbol}\n"));
            let Ok(limits) = self.coin_limits(user, &symbol) else {
                continue;
            };
            for spec in [&limits.low, &limits.high] {
                if spec.is_empty() {
                    continue;
                }
                out.push_str(&format!("-> {}\n", spec.kind));
                for value in spec.thresholds() {
                    out.push_str(&format!("--> {value}\n"));
                }
            }
        }
        out
    }
}
