use std::fmt;
use std::str::FromStr;

use snmp2::Oid;

use crate::error::WalkError;

/// Идентификатор объекта (OID).
///
/// Порядок лексикографический по дугам, в том же порядке обходит агент.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(Vec<u32>);

impl ObjectId {
    pub fn new(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &ObjectId) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Дуги после `prefix`, либо `None`, если `self` вне поддерева.
    pub fn suffix(&self, prefix: &ObjectId) -> Option<&[u32]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Добавляет дуги и возвращает новый идентификатор.
    pub fn child(&self, arcs: &[u32]) -> ObjectId {
        let mut next = self.0.clone();
        next.extend_from_slice(arcs);
        ObjectId(next)
    }

    /// Переводит в представление `snmp2`.
    pub fn to_snmp(&self) -> Result<Oid<'static>, WalkError> {
        let parts: Vec<u64> = self.0.iter().map(|&arc| u64::from(arc)).collect();
        Oid::from(&parts)
            .map_err(|e| WalkError::Protocol(format!("cannot encode OID {}: {:?}", self, e)))
    }

    /// Читает идентификатор из `snmp2`.
    pub fn from_snmp(oid: &Oid<'_>) -> Result<Self, WalkError> {
        oid.to_string()
            .parse()
            .map_err(|e: OidParseError| WalkError::Protocol(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid OID '{input}': {reason}")]
pub struct OidParseError {
    input: String,
    reason: String,
}

impl FromStr for ObjectId {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let arcs: Result<Vec<u32>, _> = trimmed
            .split('.')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u32>())
            .collect();

        let arcs = arcs.map_err(|e| OidParseError {
            input: s.to_string(),
            reason: e.to_string(),
        })?;

        if arcs.len() < 2 {
            return Err(OidParseError {
                input: s.to_string(),
                reason: "at least two arcs required".to_string(),
            });
        }

        Ok(ObjectId(arcs))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

/// Строит [`ObjectId`] из литеральных дуг.
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::snmp::ObjectId::new(vec![$($arc),+])
    };
}
