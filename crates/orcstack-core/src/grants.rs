//! Permission grants between stack resources.
//!
//! A grant lets a principal exercise one capability on one resource. The
//! capability decides the exact IAM actions; nothing else in the crate
//! spells out action names.

use std::fmt;

/// Service principal the queue trigger invokes functions as.
pub const SQS_SERVICE_PRINCIPAL: &str = "sqs.amazonaws.com";

const INVOKE_ACTIONS: &[&str] = &["lambda:InvokeFunction"];

const CONSUME_MESSAGES_ACTIONS: &[&str] = &[
    "sqs:ReceiveMessage",
    "sqs:ChangeMessageVisibility",
    "sqs:GetQueueUrl",
    "sqs:DeleteMessage",
    "sqs:GetQueueAttributes",
];

// Item reads and writes; no item or table deletion.
const READ_WRITE_DATA_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:BatchWriteItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DescribeTable",
];

const READ_OBJECTS_ACTIONS: &[&str] = &["s3:GetObject*", "s3:GetBucket*", "s3:List*"];

/// Actions the function needs for active tracing.
pub const TRACING_ACTIONS: &[&str] = &["xray:PutTraceSegments", "xray:PutTelemetryRecords"];

/// What a grant allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Invoke the function.
    Invoke,
    /// Receive, hide and delete messages from the queue.
    ConsumeMessages,
    /// Read and write table items.
    ReadWriteData,
    /// Read objects from the bucket.
    ReadObjects,
}

impl Capability {
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Capability::Invoke => INVOKE_ACTIONS,
            Capability::ConsumeMessages => CONSUME_MESSAGES_ACTIONS,
            Capability::ReadWriteData => READ_WRITE_DATA_ACTIONS,
            Capability::ReadObjects => READ_OBJECTS_ACTIONS,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Invoke => write!(f, "invoke"),
            Capability::ConsumeMessages => write!(f, "consume messages"),
            Capability::ReadWriteData => write!(f, "read/write data"),
            Capability::ReadObjects => write!(f, "read objects"),
        }
    }
}

/// Resource a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Bucket looked up by name.
    Bucket(String),
    /// Table by logical id.
    Table(String),
    /// Queue by logical id.
    Queue(String),
    /// Function by logical id.
    Function(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Bucket(name) => write!(f, "bucket {}", name),
            Target::Table(id) => write!(f, "table {}", id),
            Target::Queue(id) => write!(f, "queue {}", id),
            Target::Function(id) => write!(f, "function {}", id),
        }
    }
}

/// Who receives a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A managed service, e.g. the queue trigger.
    Service(String),
    /// Execution role of the function with this logical id.
    FunctionRole(String),
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Service(service) => write!(f, "service {}", service),
            Principal::FunctionRole(id) => write!(f, "role of {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub principal: Principal,
    pub capability: Capability,
    pub target: Target,
}

impl Grant {
    pub fn new(principal: Principal, capability: Capability, target: Target) -> Self {
        Self {
            principal,
            capability,
            target,
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        self.capability.actions()
    }

    /// True if any action can create, change or remove data in the target.
    pub fn allows_write(&self) -> bool {
        self.actions().iter().any(|action| {
            let verb = action.split_once(':').map(|(_, verb)| verb).unwrap_or(*action);
            ["Put", "Update", "Delete", "BatchWrite", "Create", "Send"]
                .iter()
                .any(|prefix| verb.starts_with(prefix))
        })
    }

    /// True if any action is a dedicated delete of items, objects or the
    /// resource itself. Batch writes count as writes only.
    pub fn allows_delete(&self) -> bool {
        self.actions().iter().any(|action| {
            let verb = action.split_once(':').map(|(_, verb)| verb).unwrap_or(*action);
            verb.starts_with("Delete")
        })
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} may {} on {}", self.principal, self.capability, self.target)
    }
}
