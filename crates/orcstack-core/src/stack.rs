//! Stack declaration and the provisioning routine.
//!
//! `provision` is the only place that branches: a ready config declares the
//! full stack, a config with missing fields declares nothing and yields one
//! diagnostic.

use crate::error::{Result, StackError};
use crate::grants::{Capability, Grant, Principal, Target, SQS_SERVICE_PRINCIPAL};
use crate::resources::*;
use orcstack_config::{
    ConfigOutcome, DeployConfig, MissingField, MAX_FUNCTION_TIMEOUT_SECS, MAX_MEMORY_MB,
    MIN_MEMORY_MB,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Fully declared ORC parser stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub name: String,
    pub bucket: BucketRef,
    pub table: Table,
    pub queue: Queue,
    pub function: Function,
    pub event_source: EventSourceMapping,
    grants: Vec<Grant>,
}

/// Number of primary resources by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub bucket_refs: usize,
    pub tables: usize,
    pub queues: usize,
    pub functions: usize,
}

impl ResourceCounts {
    pub fn total(&self) -> usize {
        self.bucket_refs + self.tables + self.queues + self.functions
    }
}

impl Stack {
    /// Declare every resource and grant for a ready configuration.
    pub fn declare(config: &DeployConfig) -> Result<Self> {
        let bucket = BucketRef::from_name(&config.bucket);
        let table = Table::user_details();
        let queue = Queue::trigger_for(config.function.timeout());

        let mut environment = BTreeMap::new();
        environment.insert(
            USERS_TABLE_NAME_ENV.to_string(),
            EnvValue::TableName(table.logical_id.clone()),
        );

        let function = Function {
            logical_id: FUNCTION_LOGICAL_ID.to_string(),
            runtime: Runtime::Java11,
            code: Code {
                bucket: config.bucket.clone(),
                key: config.artifact.clone(),
            },
            handler: Handler::parse(HANDLER)?,
            memory_mb: config.function.memory_mb,
            timeout: config.function.timeout(),
            tracing: Tracing::Active,
            environment,
        };

        let event_source = EventSourceMapping {
            logical_id: EVENT_SOURCE_LOGICAL_ID.to_string(),
            queue: queue.logical_id.clone(),
            function: function.logical_id.clone(),
            batch_size: EVENT_SOURCE_BATCH_SIZE,
        };

        let role = Principal::FunctionRole(function.logical_id.clone());
        let grants = vec![
            Grant::new(
                Principal::Service(SQS_SERVICE_PRINCIPAL.to_string()),
                Capability::Invoke,
                Target::Function(function.logical_id.clone()),
            ),
            Grant::new(
                role.clone(),
                Capability::ConsumeMessages,
                Target::Queue(queue.logical_id.clone()),
            ),
            Grant::new(
                role.clone(),
                Capability::ReadWriteData,
                Target::Table(table.logical_id.clone()),
            ),
            Grant::new(
                role,
                Capability::ReadObjects,
                Target::Bucket(bucket.name.clone()),
            ),
        ];

        let stack = Self {
            name: config.stack_name.clone(),
            bucket,
            table,
            queue,
            function,
            event_source,
            grants,
        };
        stack.check_invariants()?;

        info!(
            stack = %stack.name,
            bucket = %stack.bucket.name,
            artifact = %stack.function.code.key,
            "Declared stack"
        );
        for grant in &stack.grants {
            debug!(%grant, "Declared grant");
        }

        Ok(stack)
    }

    /// Check the timing and sizing invariants of the declared stack.
    pub fn check_invariants(&self) -> Result<()> {
        let timeout_secs = self.function.timeout.as_secs();
        let visibility_secs = self.queue.visibility_timeout.as_secs();

        if timeout_secs == 0 || timeout_secs > MAX_FUNCTION_TIMEOUT_SECS {
            return Err(StackError::limit_exceeded(
                "function.timeout_secs",
                timeout_secs,
                1,
                MAX_FUNCTION_TIMEOUT_SECS,
            ));
        }

        if visibility_secs > MAX_VISIBILITY_TIMEOUT_SECS {
            return Err(StackError::limit_exceeded(
                "queue.visibility_timeout_secs",
                visibility_secs,
                0,
                MAX_VISIBILITY_TIMEOUT_SECS,
            ));
        }

        if timeout_secs > visibility_secs {
            return Err(StackError::timeout_exceeds_visibility(
                timeout_secs,
                visibility_secs,
            ));
        }

        let memory_mb = self.function.memory_mb;
        if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&memory_mb) {
            return Err(StackError::limit_exceeded(
                "function.memory_mb",
                u64::from(memory_mb),
                u64::from(MIN_MEMORY_MB),
                u64::from(MAX_MEMORY_MB),
            ));
        }

        if self.event_source.batch_size != EVENT_SOURCE_BATCH_SIZE {
            return Err(StackError::limit_exceeded(
                "event_source.batch_size",
                u64::from(self.event_source.batch_size),
                u64::from(EVENT_SOURCE_BATCH_SIZE),
                u64::from(EVENT_SOURCE_BATCH_SIZE),
            ));
        }

        Ok(())
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    /// Grants held by the function's execution role.
    pub fn role_grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants
            .iter()
            .filter(|grant| matches!(grant.principal, Principal::FunctionRole(_)))
    }

    pub fn resource_kinds(&self) -> Vec<ResourceKind> {
        vec![
            ResourceKind::BucketRef,
            ResourceKind::Table,
            ResourceKind::Queue,
            ResourceKind::Function,
        ]
    }

    pub fn resource_counts(&self) -> ResourceCounts {
        count_kinds(&self.resource_kinds())
    }
}

fn count_kinds(kinds: &[ResourceKind]) -> ResourceCounts {
    let mut counts = ResourceCounts::default();
    for kind in kinds {
        match kind {
            ResourceKind::BucketRef => counts.bucket_refs += 1,
            ResourceKind::Table => counts.tables += 1,
            ResourceKind::Queue => counts.queues += 1,
            ResourceKind::Function => counts.functions += 1,
        }
    }
    counts
}

/// What provisioning produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Declared(Box<Stack>),
    /// Required inputs were missing; nothing was declared.
    Abandoned {
        missing: Vec<MissingField>,
        diagnostic: String,
    },
}

impl ProvisionOutcome {
    pub fn stack(&self) -> Option<&Stack> {
        match self {
            ProvisionOutcome::Declared(stack) => Some(&**stack),
            ProvisionOutcome::Abandoned { .. } => None,
        }
    }

    pub fn into_stack(self) -> Option<Stack> {
        match self {
            ProvisionOutcome::Declared(stack) => Some(*stack),
            ProvisionOutcome::Abandoned { .. } => None,
        }
    }

    pub fn resources(&self) -> Vec<ResourceKind> {
        self.stack().map(Stack::resource_kinds).unwrap_or_default()
    }

    pub fn resource_counts(&self) -> ResourceCounts {
        count_kinds(&self.resources())
    }

    pub fn diagnostics(&self) -> Vec<&str> {
        match self {
            ProvisionOutcome::Declared(_) => Vec::new(),
            ProvisionOutcome::Abandoned { diagnostic, .. } => vec![diagnostic.as_str()],
        }
    }
}

/// Declare the stack if the configuration is ready, otherwise abandon it.
///
/// Missing configuration is not an error: the outcome reports it and a single
/// warning is logged. Errors are reserved for a ready config that breaks a
/// stack invariant.
pub fn provision(outcome: &ConfigOutcome) -> Result<ProvisionOutcome> {
    match outcome {
        ConfigOutcome::Ready(config) => {
            Stack::declare(config).map(|stack| ProvisionOutcome::Declared(Box::new(stack)))
        }
        ConfigOutcome::MissingConfig(missing) => {
            let diagnostic = missing_config_diagnostic(missing);
            warn!(missing = missing.len(), "{}", diagnostic);
            Ok(ProvisionOutcome::Abandoned {
                missing: missing.clone(),
                diagnostic,
            })
        }
    }
}

fn missing_config_diagnostic(missing: &[MissingField]) -> String {
    let fields: Vec<String> = missing.iter().map(ToString::to_string).collect();
    format!(
        "Required deployment configuration missing: {}; no resources declared",
        if fields.is_empty() {
            "unknown".to_string()
        } else {
            fields.join(", ")
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_declare_defaults() {
        let stack = Stack::declare(&DeployConfig::new("my-artifacts", "parser.jar")).unwrap();

        assert_eq!(stack.name, "OrcParserStack");
        assert_eq!(stack.function.code.bucket, "my-artifacts");
        assert_eq!(stack.function.code.key, "parser.jar");
        assert_eq!(stack.function.runtime, Runtime::Java11);
        assert_eq!(stack.function.tracing, Tracing::Active);
        assert_eq!(stack.event_source.batch_size, 1);
        assert_eq!(stack.event_source.queue, stack.queue.logical_id);
        assert_eq!(stack.event_source.function, stack.function.logical_id);
    }

    #[test]
    fn test_visibility_follows_configured_timeout() {
        let mut config = DeployConfig::new("b", "a");
        config.function.timeout_secs = 300;

        let stack = Stack::declare(&config).unwrap();
        assert_eq!(stack.function.timeout, Duration::from_secs(300));
        assert_eq!(stack.queue.visibility_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_invariant_rejects_short_visibility() {
        let mut stack = Stack::declare(&DeployConfig::new("b", "a")).unwrap();
        stack.queue.visibility_timeout = Duration::from_secs(899);

        let err = stack.check_invariants().unwrap_err();
        assert!(matches!(err, StackError::TimeoutExceedsVisibility { .. }));
    }

    #[test]
    fn test_invariant_allows_longer_visibility() {
        let mut stack = Stack::declare(&DeployConfig::new("b", "a")).unwrap();
        stack.queue.visibility_timeout = Duration::from_secs(1800);
        assert!(stack.check_invariants().is_ok());

        stack.queue.visibility_timeout = Duration::from_secs(MAX_VISIBILITY_TIMEOUT_SECS + 1);
        assert!(matches!(
            stack.check_invariants().unwrap_err(),
            StackError::LimitExceeded { .. }
        ));
    }

    #[test]
    fn test_declare_rejects_timeout_above_limit() {
        let mut config = DeployConfig::new("b", "a");
        config.function.timeout_secs = MAX_FUNCTION_TIMEOUT_SECS + 1;

        let err = Stack::declare(&config).unwrap_err();
        assert!(matches!(err, StackError::LimitExceeded { field, .. } if field == "function.timeout_secs"));
    }

    #[test]
    fn test_declare_rejects_memory_out_of_range() {
        let mut config = DeployConfig::new("b", "a");
        config.function.memory_mb = 64;
        assert!(Stack::declare(&config).is_err());
    }

    #[test]
    fn test_role_grants_exclude_service_invoke() {
        let stack = Stack::declare(&DeployConfig::new("b", "a")).unwrap();
        let capabilities: Vec<Capability> =
            stack.role_grants().map(|grant| grant.capability).collect();
        assert_eq!(
            capabilities,
            vec![
                Capability::ConsumeMessages,
                Capability::ReadWriteData,
                Capability::ReadObjects
            ]
        );
    }

    #[test]
    fn test_diagnostic_lists_every_missing_field() {
        let msg = missing_config_diagnostic(&[MissingField::Bucket, MissingField::Artifact]);
        assert!(msg.contains("ORC_DEPLOYMENT_BUCKET"));
        assert!(msg.contains("ORC_JAR_NAME"));
        assert!(msg.contains("no resources declared"));
    }
}
