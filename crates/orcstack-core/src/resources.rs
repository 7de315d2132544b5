//! Declared resources of the ORC parser stack.
//!
//! Each resource carries the logical id it is synthesized under. Durations
//! are kept as [`Duration`] and rendered in whole seconds.

use crate::error::{Result, StackError};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Name of the trigger queue.
pub const QUEUE_NAME: &str = "OrcParserTrigger";
/// Entry point inside the externally supplied artifact.
pub const HANDLER: &str = "com.proserv.orcParser.OrcParserFn::handleRequest";
/// Environment key the function reads the state table name from.
pub const USERS_TABLE_NAME_ENV: &str = "USERS_TABLE_NAME";
/// Partition key of the state table.
pub const TABLE_PARTITION_KEY: &str = "id";
/// Messages handed to one invocation.
pub const EVENT_SOURCE_BATCH_SIZE: u32 = 1;
/// Upper bound the queue service allows for visibility timeouts (12 hours).
pub const MAX_VISIBILITY_TIMEOUT_SECS: u64 = 43_200;

pub const BUCKET_LOGICAL_ID: &str = "OrcDeploymentBucket";
pub const TABLE_LOGICAL_ID: &str = "UserDetailsTable";
pub const QUEUE_LOGICAL_ID: &str = "OrcQueue";
pub const FUNCTION_LOGICAL_ID: &str = "OrcParser";
pub const EVENT_SOURCE_LOGICAL_ID: &str = "OrcParserSqsEventSource";

/// Kinds of primary resource a stack declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    BucketRef,
    Table,
    Queue,
    Function,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::BucketRef => write!(f, "bucket reference"),
            ResourceKind::Table => write!(f, "table"),
            ResourceKind::Queue => write!(f, "queue"),
            ResourceKind::Function => write!(f, "function"),
        }
    }
}

/// A pre-existing bucket, looked up by name and never created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRef {
    pub logical_id: String,
    pub name: String,
}

impl BucketRef {
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            logical_id: BUCKET_LOGICAL_ID.to_string(),
            name: name.into(),
        }
    }

    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }

    /// ARN matching every object in the bucket.
    pub fn objects_arn(&self) -> String {
        format!("{}/*", self.arn())
    }
}

/// Scalar attribute types a key may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Number,
}

impl AttributeType {
    /// Single-letter code used in table definitions.
    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::Number => "N",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// What happens to a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Retain,
    Delete,
}

impl RemovalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Delete => "Delete",
        }
    }
}

/// Key-value table holding per-user state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub logical_id: String,
    pub partition_key: KeyAttribute,
    pub read_capacity: u32,
    pub write_capacity: u32,
    pub removal_policy: RemovalPolicy,
}

impl Table {
    /// The user details table: numeric `id` key, retained on stack deletion.
    pub fn user_details() -> Self {
        Self {
            logical_id: TABLE_LOGICAL_ID.to_string(),
            partition_key: KeyAttribute {
                name: TABLE_PARTITION_KEY.to_string(),
                attribute_type: AttributeType::Number,
            },
            read_capacity: 5,
            write_capacity: 5,
            removal_policy: RemovalPolicy::Retain,
        }
    }
}

/// Queue whose messages trigger the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    pub logical_id: String,
    pub name: String,
    pub visibility_timeout: Duration,
    pub removal_policy: RemovalPolicy,
}

impl Queue {
    /// Trigger queue whose visibility window covers one full invocation.
    pub fn trigger_for(function_timeout: Duration) -> Self {
        Self {
            logical_id: QUEUE_LOGICAL_ID.to_string(),
            name: QUEUE_NAME.to_string(),
            visibility_timeout: function_timeout,
            removal_policy: RemovalPolicy::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Java11,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Java11 => "java11",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracing {
    Active,
}

impl Tracing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tracing::Active => "Active",
        }
    }
}

/// Entry point of the form `<package>.<Class>::<method>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler(String);

impl Handler {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((class_path, method)) = raw.split_once("::") else {
            return Err(StackError::invalid_handler(raw));
        };

        let Some((package, class)) = class_path.rsplit_once('.') else {
            return Err(StackError::invalid_handler(raw));
        };

        let well_formed = !package.is_empty()
            && !class.is_empty()
            && !method.is_empty()
            && !method.contains("::")
            && package.split('.').all(|segment| !segment.is_empty())
            && !raw.chars().any(char::is_whitespace);

        if !well_formed {
            return Err(StackError::invalid_handler(raw));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artifact location for the function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub bucket: String,
    pub key: String,
}

/// Value of a function environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// Name of the table with this logical id, resolved at deploy time.
    TableName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub logical_id: String,
    pub runtime: Runtime,
    pub code: Code,
    pub handler: Handler,
    pub memory_mb: u32,
    pub timeout: Duration,
    pub tracing: Tracing,
    pub environment: BTreeMap<String, EnvValue>,
}

impl Function {
    pub fn env(&self, key: &str) -> Option<&EnvValue> {
        self.environment.get(key)
    }
}

/// Binding that polls a queue and invokes a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSourceMapping {
    pub logical_id: String,
    pub queue: String,
    pub function: String,
    pub batch_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_parse() {
        let handler = Handler::parse(HANDLER).unwrap();
        assert_eq!(handler.as_str(), HANDLER);
        assert_eq!(handler.to_string(), HANDLER);
    }

    #[test]
    fn test_handler_rejects_malformed() {
        for raw in [
            "",
            "handleRequest",
            "OrcParserFn::handleRequest",
            "com.proserv.OrcParserFn::",
            "com.proserv.OrcParserFn",
            "::handleRequest",
            "com..OrcParserFn::handleRequest",
            "com.proserv.OrcParserFn::handle::Request",
            "com.proserv.Orc ParserFn::handleRequest",
        ] {
            assert!(Handler::parse(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_bucket_arns() {
        let bucket = BucketRef::from_name("my-artifacts");
        assert_eq!(bucket.arn(), "arn:aws:s3:::my-artifacts");
        assert_eq!(bucket.objects_arn(), "arn:aws:s3:::my-artifacts/*");
    }

    #[test]
    fn test_user_details_table() {
        let table = Table::user_details();
        assert_eq!(table.partition_key.name, "id");
        assert_eq!(table.partition_key.attribute_type.code(), "N");
        assert_eq!(table.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn test_trigger_queue_follows_timeout() {
        let queue = Queue::trigger_for(Duration::from_secs(120));
        assert_eq!(queue.name, "OrcParserTrigger");
        assert_eq!(queue.visibility_timeout, Duration::from_secs(120));
        assert_eq!(queue.removal_policy, RemovalPolicy::Delete);
    }
}
