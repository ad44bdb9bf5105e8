/*!
 * Resource Vectors
 * Normalized resource accounting shared by nodes, pods and allocations.
 *
 * Every dimension uses a single unit: memory in bytes, cpu in milli-units
 * ("vcore"). Extended resources (GPUs, custom device plugins, ...) pass through
 * as opaque named integer quantities.
 */

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::errors::ResourceParseError;

pub const DIM_MEMORY: &str = "memory";
pub const DIM_VCORE: &str = "vcore";

/// A resource quantity vector: memory (bytes), vcore (milli-cpu), plus an open
/// set of extended resources keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVector {
    pub memory: i64,
    pub vcore: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extended: BTreeMap<String, i64>,
}

impl ResourceVector {
    pub fn new(memory: i64, vcore: i64) -> Self {
        Self {
            memory,
            vcore,
            extended: BTreeMap::new(),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.memory == 0 && self.vcore == 0 && self.extended.values().all(|v| *v == 0)
    }

    pub fn added(&self, other: &ResourceVector) -> ResourceVector {
        let mut extended = self.extended.clone();
        for (k, v) in &other.extended {
            *extended.entry(k.clone()).or_insert(0) += v;
        }
        ResourceVector {
            memory: self.memory + other.memory,
            vcore: self.vcore + other.vcore,
            extended,
        }
    }

    pub fn subtracted(&self, other: &ResourceVector) -> ResourceVector {
        let mut extended = self.extended.clone();
        for (k, v) in &other.extended {
            *extended.entry(k.clone()).or_insert(0) -= v;
        }
        ResourceVector {
            memory: self.memory - other.memory,
            vcore: self.vcore - other.vcore,
            extended,
        }
    }

    /// Parses a Kubernetes-style memory quantity ("1024", "512Mi", "2Gi", "1G")
    /// into bytes. Binary (Ki/Mi/Gi/Ti) and decimal (k/M/G/T) suffixes are both
    /// accepted; decimal is the canonical form produced by this shim.
    pub fn parse_memory_quantity(raw: &str) -> std::result::Result<i64, ResourceParseError> {
        parse_quantity(raw, 1)
            .ok_or_else(|| ResourceParseError::InvalidMemoryQuantity(raw.to_string()))
    }

    /// Parses a Kubernetes-style cpu quantity ("1", "0.5", "500m") into
    /// milli-cpu units. `"1"` cpu parses to `1000`.
    pub fn parse_cpu_quantity(raw: &str) -> std::result::Result<i64, ResourceParseError> {
        if let Some(stripped) = raw.strip_suffix('m') {
            return stripped
                .parse::<i64>()
                .map_err(|_| ResourceParseError::InvalidCpuQuantity(raw.to_string()));
        }
        let whole: f64 = raw
            .parse()
            .map_err(|_| ResourceParseError::InvalidCpuQuantity(raw.to_string()))?;
        Ok((whole * 1000.0).round() as i64)
    }
}

impl Add for ResourceVector {
    type Output = ResourceVector;
    fn add(self, rhs: ResourceVector) -> ResourceVector {
        self.added(&rhs)
    }
}

impl Sub for ResourceVector {
    type Output = ResourceVector;
    fn sub(self, rhs: ResourceVector) -> ResourceVector {
        self.subtracted(&rhs)
    }
}

fn parse_quantity(raw: &str, _unused: i64) -> Option<i64> {
    const BINARY_SUFFIXES: &[(&str, i64)] = &[
        ("Ki", 1024),
        ("Mi", 1024 * 1024),
        ("Gi", 1024 * 1024 * 1024),
        ("Ti", 1024i64.pow(4)),
    ];
    const DECIMAL_SUFFIXES: &[(&str, i64)] = &[
        ("k", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
    ];

    for (suffix, multiplier) in BINARY_SUFFIXES {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            let value: f64 = stripped.parse().ok()?;
            return Some((value * *multiplier as f64).round() as i64);
        }
    }
    for (suffix, multiplier) in DECIMAL_SUFFIXES {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            let value: f64 = stripped.parse().ok()?;
            return Some((value * *multiplier as f64).round() as i64);
        }
    }
    raw.parse::<i64>().ok()
}
