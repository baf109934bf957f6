use std::fmt;

use snmp2::Value;

use super::ObjectId;
use crate::error::FieldError;

/// Копия значения varbind, не привязанная к буферу ответа.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    Counter32(u32),
    Unsigned32(u32),
    Timeticks(u32),
    Counter64(u64),
    OctetString(Vec<u8>),
    ObjectIdentifier(ObjectId),
    IpAddress([u8; 4]),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Всё остальное, в виде debug текста.
    Other(String),
}

impl SnmpValue {
    pub fn from_snmp(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(v) => SnmpValue::Integer(*v),
            Value::Counter32(v) => SnmpValue::Counter32(*v),
            Value::Unsigned32(v) => SnmpValue::Unsigned32(*v),
            Value::Timeticks(v) => SnmpValue::Timeticks(*v),
            Value::Counter64(v) => SnmpValue::Counter64(*v),
            Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
            Value::IpAddress(addr) => SnmpValue::IpAddress(*addr),
            Value::ObjectIdentifier(oid) => match ObjectId::from_snmp(oid) {
                Ok(oid) => SnmpValue::ObjectIdentifier(oid),
                Err(_) => SnmpValue::Other(format!("{:?}", value)),
            },
            Value::Null => SnmpValue::Null,
            Value::NoSuchObject => SnmpValue::NoSuchObject,
            Value::NoSuchInstance => SnmpValue::NoSuchInstance,
            Value::EndOfMibView => SnmpValue::EndOfMibView,
            other => SnmpValue::Other(format!("{:?}", other)),
        }
    }

    /// `noSuchObject` / `noSuchInstance`: у агента здесь нет значения.
    pub fn is_missing(&self) -> bool {
        matches!(self, SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SnmpValue::Integer(_) => "INTEGER",
            SnmpValue::Counter32(_) => "Counter32",
            SnmpValue::Unsigned32(_) => "Unsigned32",
            SnmpValue::Timeticks(_) => "TimeTicks",
            SnmpValue::Counter64(_) => "Counter64",
            SnmpValue::OctetString(_) => "OCTET STRING",
            SnmpValue::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            SnmpValue::IpAddress(_) => "IpAddress",
            SnmpValue::Null => "NULL",
            SnmpValue::NoSuchObject => "noSuchObject",
            SnmpValue::NoSuchInstance => "noSuchInstance",
            SnmpValue::EndOfMibView => "endOfMibView",
            SnmpValue::Other(_) => "opaque",
        }
    }

    fn mismatch(&self, expected: &'static str) -> FieldError {
        FieldError {
            expected,
            found: self.type_name().to_string(),
        }
    }

    /// Unsigned32, Gauge32 и неотрицательные INTEGER.
    pub fn as_u32(&self) -> Result<u32, FieldError> {
        match self {
            SnmpValue::Unsigned32(v) | SnmpValue::Counter32(v) | SnmpValue::Timeticks(v) => Ok(*v),
            SnmpValue::Integer(v) => u32::try_from(*v).map_err(|_| self.mismatch("Unsigned32")),
            _ => Err(self.mismatch("Unsigned32")),
        }
    }

    pub fn as_u64(&self) -> Result<u64, FieldError> {
        match self {
            SnmpValue::Counter64(v) => Ok(*v),
            SnmpValue::Unsigned32(v) | SnmpValue::Counter32(v) | SnmpValue::Timeticks(v) => {
                Ok(u64::from(*v))
            }
            SnmpValue::Integer(v) => u64::try_from(*v).map_err(|_| self.mismatch("Counter64")),
            _ => Err(self.mismatch("Counter64")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, FieldError> {
        match self {
            SnmpValue::Integer(v) => Ok(*v),
            SnmpValue::Unsigned32(v) | SnmpValue::Counter32(v) | SnmpValue::Timeticks(v) => {
                Ok(i64::from(*v))
            }
            _ => Err(self.mismatch("INTEGER")),
        }
    }

    /// SNMPv2-TC TruthValue: true(1), false(2).
    pub fn as_truth_value(&self) -> Result<bool, FieldError> {
        match self {
            SnmpValue::Integer(1) => Ok(true),
            SnmpValue::Integer(2) => Ok(false),
            _ => Err(self.mismatch("TruthValue")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], FieldError> {
        match self {
            SnmpValue::OctetString(bytes) => Ok(bytes),
            _ => Err(self.mismatch("OCTET STRING")),
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpValue::Integer(v) => write!(f, "{}", v),
            SnmpValue::Counter32(v) | SnmpValue::Unsigned32(v) | SnmpValue::Timeticks(v) => {
                write!(f, "{}", v)
            }
            SnmpValue::Counter64(v) => write!(f, "{}", v),
            SnmpValue::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) if text.chars().all(|c| !c.is_control()) => f.write_str(text),
                _ => {
                    for (i, b) in bytes.iter().enumerate() {
                        if i > 0 {
                            f.write_str(":")?;
                        }
                        write!(f, "{:02x}", b)?;
                    }
                    Ok(())
                }
            },
            SnmpValue::ObjectIdentifier(oid) => write!(f, "{}", oid),
            SnmpValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            SnmpValue::Other(text) => f.write_str(text),
            other => f.write_str(other.type_name()),
        }
    }
}
