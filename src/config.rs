/*!
 * Shim Configuration
 * Static, infallible configuration for the context subsystem. Loading this from
 * a file or command-line flags is out of scope; this module only
 * defines the struct and its defaults.
 */

/// Default annotation/label domain prefix, e.g. `<domain>/application-id`.
pub const DEFAULT_DOMAIN: &str = "yunikorn.apache.org";

/// Default scheduler name a pod's `spec.schedulerName` is compared against to
/// classify it as managed rather than foreign.
pub const DEFAULT_SCHEDULER_NAME: &str = "yunikorn";

/// Default bound on the dispatcher's event queue before `Dispatch` blocks the
/// calling informer thread.
pub const DEFAULT_DISPATCHER_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ShimConfig {
    pub domain: String,
    pub scheduler_name: String,
    pub dispatcher_queue_capacity: usize,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            scheduler_name: DEFAULT_SCHEDULER_NAME.to_string(),
            dispatcher_queue_capacity: DEFAULT_DISPATCHER_QUEUE_CAPACITY,
        }
    }
}

impl ShimConfig {
    pub fn builder() -> ShimConfigBuilder {
        ShimConfigBuilder::new()
    }

    pub fn application_id_annotation(&self) -> String {
        format!("{}/application-id", self.domain)
    }

    pub fn namespace_quota_annotation(&self) -> String {
        format!("{}/namespace.quota", self.domain)
    }

    pub fn namespace_max_annotation(&self, resource: &str) -> String {
        format!("{}/namespace.max.{}", self.domain, resource)
    }

    pub fn namespace_guaranteed_annotation(&self) -> String {
        format!("{}/namespace.guaranteed", self.domain)
    }

    pub fn parent_queue_annotation(&self) -> String {
        format!("{}/parentqueue", self.domain)
    }

    pub fn allow_preemption_annotation(&self) -> String {
        format!("{}/allow-preemption", self.domain)
    }
}

/// Fluent builder for [`ShimConfig`]; `build()` fills in defaults for anything unset.
#[derive(Debug, Default)]
pub struct ShimConfigBuilder {
    domain: Option<String>,
    scheduler_name: Option<String>,
    dispatcher_queue_capacity: Option<usize>,
}

impl ShimConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_scheduler_name(mut self, scheduler_name: impl Into<String>) -> Self {
        self.scheduler_name = Some(scheduler_name.into());
        self
    }

    pub fn with_dispatcher_queue_capacity(mut self, capacity: usize) -> Self {
        self.dispatcher_queue_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> ShimConfig {
        let defaults = ShimConfig::default();
        ShimConfig {
            domain: self.domain.unwrap_or(defaults.domain),
            scheduler_name: self.scheduler_name.unwrap_or(defaults.scheduler_name),
            dispatcher_queue_capacity: self
                .dispatcher_queue_capacity
                .unwrap_or(defaults.dispatcher_queue_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_annotation_keys() {
        let cfg = ShimConfig::default();
        assert_eq!(cfg.application_id_annotation(), "yunikorn.apache.org/application-id");
        assert_eq!(
            cfg.namespace_max_annotation("memory"),
            "yunikorn.apache.org/namespace.max.memory"
        );
    }

    #[test]
    fn builder_overrides_domain() {
        let cfg = ShimConfig::builder().with_domain("example.com").build();
        assert_eq!(cfg.application_id_annotation(), "example.com/application-id");
    }
}
