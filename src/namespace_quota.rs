/*!
 * Namespace Quota Resolver
 * Reads annotations on the namespace an application is registered under and
 * enriches its tags before registration. Unparseable
 * annotations are reported as warnings; they never block application
 * creation.
 */

use std::collections::BTreeMap;

use crate::config::ShimConfig;
use crate::orchestrator::Namespace;
use crate::resources::{ResourceVector, DIM_MEMORY, DIM_VCORE};

pub const TAG_NAMESPACE_MAX_RESOURCE: &str = "namespace.max.resource";
pub const TAG_NAMESPACE_GUARANTEED_RESOURCE: &str = "namespace.guaranteed.resource";
pub const TAG_PARENT_QUEUE: &str = "namespace.parentqueue";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceEnrichment {
    pub max_resource: Option<ResourceVector>,
    pub guaranteed_resource: Option<ResourceVector>,
    pub parent_queue: Option<String>,
}

impl NamespaceEnrichment {
    /// Flattens into the application-request tag map.
    pub fn into_tags(self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        if let Some(max) = self.max_resource.as_ref().and_then(|v| serde_json::to_string(v).ok()) {
            tags.insert(TAG_NAMESPACE_MAX_RESOURCE.to_string(), max);
        }
        if let Some(guaranteed) = self
            .guaranteed_resource
            .as_ref()
            .and_then(|v| serde_json::to_string(v).ok())
        {
            tags.insert(TAG_NAMESPACE_GUARANTEED_RESOURCE.to_string(), guaranteed);
        }
        if let Some(parent) = self.parent_queue {
            tags.insert(TAG_PARENT_QUEUE.to_string(), parent);
        }
        tags
    }
}

#[derive(Debug, Clone)]
pub struct ParseWarning(pub String);

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves quota/guaranteed-resource/parent-queue enrichment for `namespace`
/// in precedence order: the structured `namespace.quota` annotation, then the
/// legacy per-resource `namespace.max.<resource>` annotations, then the
/// guaranteed-resource annotation and parent-queue override.
pub fn resolve_namespace_quota(
    namespace: &Namespace,
    config: &ShimConfig,
) -> (NamespaceEnrichment, Vec<ParseWarning>) {
    let mut enrichment = NamespaceEnrichment::default();
    let mut warnings = Vec::new();

    if let Some(raw) = namespace.annotations.get(&config.namespace_quota_annotation()) {
        match parse_resource_json(raw) {
            Ok(vec) => enrichment.max_resource = Some(vec),
            Err(e) => warnings.push(ParseWarning(format!(
                "namespace {}: {}: {}",
                namespace.name,
                config.namespace_quota_annotation(),
                e
            ))),
        }
    } else {
        let mut legacy = ResourceVector::zero();
        let mut any = false;

        let mem_key = config.namespace_max_annotation(DIM_MEMORY);
        if let Some(raw) = namespace.annotations.get(&mem_key) {
            any = true;
            match ResourceVector::parse_memory_quantity(raw) {
                Ok(v) => legacy.memory = v,
                Err(e) => warnings.push(ParseWarning(format!("namespace {}: {}: {}", namespace.name, mem_key, e))),
            }
        }

        let cpu_key = config.namespace_max_annotation(DIM_VCORE);
        if let Some(raw) = namespace.annotations.get(&cpu_key) {
            any = true;
            match ResourceVector::parse_cpu_quantity(raw) {
                Ok(v) => legacy.vcore = v,
                Err(e) => warnings.push(ParseWarning(format!("namespace {}: {}: {}", namespace.name, cpu_key, e))),
            }
        }

        if any {
            enrichment.max_resource = Some(legacy);
        }
    }

    if let Some(raw) = namespace.annotations.get(&config.namespace_guaranteed_annotation()) {
        match parse_resource_json(raw) {
            Ok(vec) => enrichment.guaranteed_resource = Some(vec),
            Err(e) => warnings.push(ParseWarning(format!(
                "namespace {}: {}: {}",
                namespace.name,
                config.namespace_guaranteed_annotation(),
                e
            ))),
        }
    }

    if let Some(raw) = namespace.annotations.get(&config.parent_queue_annotation()) {
        enrichment.parent_queue = Some(raw.clone());
    }

    (enrichment, warnings)
}

fn parse_resource_json(raw: &str) -> Result<ResourceVector, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let obj = value.as_object().ok_or_else(|| "expected a JSON object".to_string())?;
    let mut vec = ResourceVector::zero();
    for (key, v) in obj {
        let raw_str = match v {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return Err(format!("resource {:?} has a non-scalar value", key)),
        };
        match key.as_str() {
            DIM_MEMORY => {
                vec.memory = ResourceVector::parse_memory_quantity(&raw_str).map_err(|e| e.to_string())?;
            }
            DIM_VCORE => {
                vec.vcore = ResourceVector::parse_cpu_quantity(&raw_str).map_err(|e| e.to_string())?;
            }
            other => {
                let parsed: i64 = raw_str
                    .parse()
                    .map_err(|_| format!("extended resource {:?} has an invalid quantity {:?}", other, raw_str))?;
                vec.extended.insert(other.to_string(), parsed);
            }
        }
    }
    Ok(vec)
}
