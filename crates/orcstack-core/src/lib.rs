//! orcstack-core - Resource model for the ORC parser stack
//!
//! Declares a bucket reference, a state table, a trigger queue and a compute
//! function, wires the grants between them, and renders the result as a
//! CloudFormation template.
//!
//! ```text
//! StackConfig ──validate──▶ ConfigOutcome ──provision──▶ ProvisionOutcome
//!                                                         │
//!                                                         └─ Declared(Stack) ──synthesize──▶ Template
//! ```

pub mod error;
pub mod grants;
pub mod resources;
pub mod stack;
pub mod template;

pub use error::{ErrorCode, StackError};
pub use grants::{Capability, Grant, Principal, Target};
pub use resources::{
    AttributeType, BucketRef, Code, EnvValue, EventSourceMapping, Function, Handler, Queue,
    ResourceKind, Runtime, Table, Tracing,
};
pub use stack::{provision, ProvisionOutcome, ResourceCounts, Stack};
pub use template::{synthesize, Template};

// Re-export config types so callers need only one dependency
pub use orcstack_config::{ConfigOutcome, DeployConfig, MissingField};
