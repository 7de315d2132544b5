//! CloudFormation synthesis.
//!
//! Renders a declared [`Stack`] as a template document. Logical ids are
//! fixed, so the same stack always renders to the same JSON.

use crate::error::Result;
use crate::grants::{Grant, Principal, Target, TRACING_ACTIONS};
use crate::resources::{EnvValue, Tracing};
use crate::stack::Stack;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
const POLICY_VERSION: &str = "2012-10-17";

pub const ROLE_LOGICAL_ID: &str = "OrcParserServiceRole";
pub const POLICY_LOGICAL_ID: &str = "OrcParserServiceRoleDefaultPolicy";
pub const INVOKE_PERMISSION_LOGICAL_ID: &str = "OrcParserInvokeBySqs";

pub mod resource_type {
    pub const TABLE: &str = "AWS::DynamoDB::Table";
    pub const QUEUE: &str = "AWS::SQS::Queue";
    pub const ROLE: &str = "AWS::IAM::Role";
    pub const POLICY: &str = "AWS::IAM::Policy";
    pub const FUNCTION: &str = "AWS::Lambda::Function";
    pub const EVENT_SOURCE_MAPPING: &str = "AWS::Lambda::EventSourceMapping";
    pub const PERMISSION: &str = "AWS::Lambda::Permission";
}

/// A synthesized template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    pub description: String,
    pub resources: BTreeMap<String, Value>,
    pub outputs: BTreeMap<String, Value>,
}

impl Template {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    /// Logical ids of every resource of the given type.
    pub fn logical_ids_of(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource["Type"] == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Every action granted by the execution role policy.
    pub fn policy_actions(&self) -> Vec<String> {
        let Some(policy) = self.resource(POLICY_LOGICAL_ID) else {
            return Vec::new();
        };

        policy["Properties"]["PolicyDocument"]["Statement"]
            .as_array()
            .into_iter()
            .flatten()
            .flat_map(|statement| statement["Action"].as_array().into_iter().flatten())
            .filter_map(|action| action.as_str().map(str::to_string))
            .collect()
    }
}

/// Render the stack as a template.
pub fn synthesize(stack: &Stack) -> Template {
    let mut resources = BTreeMap::new();

    resources.insert(stack.table.logical_id.clone(), table_resource(stack));
    resources.insert(stack.queue.logical_id.clone(), queue_resource(stack));
    resources.insert(ROLE_LOGICAL_ID.to_string(), role_resource());
    resources.insert(POLICY_LOGICAL_ID.to_string(), policy_resource(stack));
    resources.insert(stack.function.logical_id.clone(), function_resource(stack));
    resources.insert(
        stack.event_source.logical_id.clone(),
        event_source_resource(stack),
    );

    for grant in stack.grants() {
        if let Principal::Service(service) = &grant.principal {
            resources.insert(
                INVOKE_PERMISSION_LOGICAL_ID.to_string(),
                permission_resource(stack, grant, service),
            );
        }
    }

    let mut outputs = BTreeMap::new();
    outputs.insert(
        "UsersTableName".to_string(),
        json!({ "Value": reference(&stack.table.logical_id) }),
    );
    outputs.insert(
        "TriggerQueueUrl".to_string(),
        json!({ "Value": reference(&stack.queue.logical_id) }),
    );
    outputs.insert(
        "FunctionName".to_string(),
        json!({ "Value": reference(&stack.function.logical_id) }),
    );

    debug!(
        stack = %stack.name,
        resources = resources.len(),
        "Synthesized template"
    );

    Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: format!(
            "{}: queue-triggered ORC parser with user details table",
            stack.name
        ),
        resources,
        outputs,
    }
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn arn_of(logical_id: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, "Arn"] })
}

fn table_resource(stack: &Stack) -> Value {
    let table = &stack.table;
    let key = &table.partition_key;
    let policy = table.removal_policy.as_str();

    json!({
        "Type": resource_type::TABLE,
        "Properties": {
            "KeySchema": [{ "AttributeName": key.name, "KeyType": "HASH" }],
            "AttributeDefinitions": [{
                "AttributeName": key.name,
                "AttributeType": key.attribute_type.code(),
            }],
            "ProvisionedThroughput": {
                "ReadCapacityUnits": table.read_capacity,
                "WriteCapacityUnits": table.write_capacity,
            },
        },
        "UpdateReplacePolicy": policy,
        "DeletionPolicy": policy,
    })
}

fn queue_resource(stack: &Stack) -> Value {
    let policy = stack.queue.removal_policy.as_str();

    json!({
        "Type": resource_type::QUEUE,
        "Properties": {
            "QueueName": stack.queue.name,
            "VisibilityTimeout": stack.queue.visibility_timeout.as_secs(),
        },
        "UpdateReplacePolicy": policy,
        "DeletionPolicy": policy,
    })
}

fn role_resource() -> Value {
    json!({
        "Type": resource_type::ROLE,
        "Properties": {
            "AssumeRolePolicyDocument": {
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                }],
                "Version": POLICY_VERSION,
            },
            "ManagedPolicyArns": [{
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
                ]],
            }],
        },
    })
}

fn policy_resource(stack: &Stack) -> Value {
    let mut statements: Vec<Value> = stack
        .role_grants()
        .map(|grant| role_statement(stack, grant))
        .collect();

    if stack.function.tracing == Tracing::Active {
        statements.push(json!({
            "Action": TRACING_ACTIONS,
            "Effect": "Allow",
            "Resource": "*",
        }));
    }

    json!({
        "Type": resource_type::POLICY,
        "Properties": {
            "PolicyDocument": {
                "Statement": statements,
                "Version": POLICY_VERSION,
            },
            "PolicyName": POLICY_LOGICAL_ID,
            "Roles": [reference(ROLE_LOGICAL_ID)],
        },
    })
}

fn role_statement(stack: &Stack, grant: &Grant) -> Value {
    let resource = match &grant.target {
        Target::Bucket(_) => json!([stack.bucket.arn(), stack.bucket.objects_arn()]),
        Target::Table(id) | Target::Queue(id) | Target::Function(id) => json!([arn_of(id)]),
    };

    json!({
        "Action": grant.actions(),
        "Effect": "Allow",
        "Resource": resource,
    })
}

fn function_resource(stack: &Stack) -> Value {
    let function = &stack.function;

    let variables: serde_json::Map<String, Value> = function
        .environment
        .iter()
        .map(|(key, value)| {
            let EnvValue::TableName(id) = value;
            (key.clone(), reference(id))
        })
        .collect();

    json!({
        "Type": resource_type::FUNCTION,
        "Properties": {
            "Code": {
                "S3Bucket": function.code.bucket,
                "S3Key": function.code.key,
            },
            "Handler": function.handler.as_str(),
            "MemorySize": function.memory_mb,
            "Role": arn_of(ROLE_LOGICAL_ID),
            "Runtime": function.runtime.as_str(),
            "Timeout": function.timeout.as_secs(),
            "TracingConfig": { "Mode": function.tracing.as_str() },
            "Environment": { "Variables": variables },
        },
        "DependsOn": [POLICY_LOGICAL_ID, ROLE_LOGICAL_ID],
    })
}

fn event_source_resource(stack: &Stack) -> Value {
    let mapping = &stack.event_source;
    json!({
        "Type": resource_type::EVENT_SOURCE_MAPPING,
        "Properties": {
            "BatchSize": mapping.batch_size,
            "EventSourceArn": arn_of(&mapping.queue),
            "FunctionName": reference(&mapping.function),
        },
    })
}

fn permission_resource(stack: &Stack, grant: &Grant, service: &str) -> Value {
    let function_id = match &grant.target {
        Target::Function(id) => id.as_str(),
        _ => stack.function.logical_id.as_str(),
    };

    json!({
        "Type": resource_type::PERMISSION,
        "Properties": {
            "Action": grant.actions().first().copied().unwrap_or("lambda:InvokeFunction"),
            "FunctionName": arn_of(function_id),
            "Principal": service,
            "SourceArn": arn_of(&stack.queue.logical_id),
        },
    })
}
