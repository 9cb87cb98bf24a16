//! CloudFormation template rendering
//!
//! Native declarations become `Resources`; bootstrap actions are listed under
//! `Metadata` so the synthesized template documents the full plan, and run
//! separately by the provisioner after the stack is deployed.

use crate::context::StackContext;
use crate::graph::ResourceGraph;
use serde_json::{Map, Value, json};

/// Metadata key listing bootstrap actions
pub const BOOTSTRAP_METADATA_KEY: &str = "FaceAuth::Bootstrap";

/// Render a validated graph as a CloudFormation template
pub fn render(context: &StackContext, graph: &ResourceGraph) -> Value {
    let mut resources = Map::new();
    for decl in graph.native() {
        let mut resource = Map::new();
        if let Some(cfn_type) = decl.kind().cfn_type() {
            resource.insert("Type".into(), json!(cfn_type));
        }
        if let Some(properties) = decl.spec.properties() {
            resource.insert("Properties".into(), properties);
        }
        if decl.retain_on_delete() {
            resource.insert("DeletionPolicy".into(), json!("Retain"));
            resource.insert("UpdateReplacePolicy".into(), json!("Retain"));
        }
        resources.insert(decl.logical_id.to_string(), Value::Object(resource));
    }

    let mut outputs = Map::new();
    for output in graph.outputs() {
        outputs.insert(
            output.key.clone(),
            json!({
                "Description": output.description,
                "Value": output.value.to_cfn()
            }),
        );
    }

    let bootstrap: Vec<Value> = graph
        .bootstrap_actions()
        .map(|(logical_id, action)| {
            json!({
                "LogicalId": logical_id.as_str(),
                "Service": action.call.service(),
                "Action": action.call.action(),
                "Parameters": action.call.parameters(),
                "PhysicalResourceId": action.physical_resource_id
            })
        })
        .collect();

    let mut template = Map::new();
    template.insert("AWSTemplateFormatVersion".into(), json!("2010-09-09"));
    template.insert(
        "Description".into(),
        json!(format!("face-auth identity and face collection stack {}", context.name())),
    );
    if !bootstrap.is_empty() {
        let mut metadata = Map::new();
        metadata.insert(BOOTSTRAP_METADATA_KEY.into(), Value::Array(bootstrap));
        template.insert("Metadata".into(), Value::Object(metadata));
    }
    template.insert("Resources".into(), Value::Object(resources));
    template.insert("Outputs".into(), Value::Object(outputs));
    Value::Object(template)
}

/// Render as a pretty-printed template body
pub fn render_body(context: &StackContext, graph: &ResourceGraph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&render(context, graph))
}
