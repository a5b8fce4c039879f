// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! The evaluator's product: resources keyed by logical id, deploy-time
//! parameters, and output bindings. Edges are the `Ref` / `Fn::GetAtt`
//! intrinsics inside resource properties plus explicit `DependsOn` entries.
//! The graph renders to a CloudFormation template document.
//!
//! All maps are ordered so two evaluations of the same definition render
//! byte-identical templates.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{AttributeRef, OutputBinding};
use crate::errors::{TopologyError, TopologyResult};

/// Template format version emitted in every template
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Build a logical id from path components
///
/// Non-alphanumeric characters are dropped: `["pub-instance_a", "Role"]`
/// becomes `pubinstanceaRole`.
pub fn logical_id(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// `{"Ref": id}`
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

impl AttributeRef {
    /// Intrinsic expression resolving this reference
    pub fn to_intrinsic(&self) -> Value {
        match &self.attribute {
            Some(attribute) => get_att(&self.resource, attribute),
            None => reference(&self.resource),
        }
    }
}

/// One resource in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub resource_type: String,
    pub properties: Map<String, Value>,
    pub depends_on: BTreeSet<String>,
}

impl Resource {
    /// `properties` must be a JSON object
    pub fn new(resource_type: impl Into<String>, properties: Value) -> TopologyResult<Self> {
        let resource_type = resource_type.into();
        let properties = match properties {
            Value::Object(map) => map,
            other => {
                return Err(TopologyError::ConstraintViolation(format!(
                    "properties of {} must be a JSON object, got {}",
                    resource_type, other
                )))
            }
        };
        Ok(Self {
            resource_type,
            properties,
            depends_on: BTreeSet::new(),
        })
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.insert(logical_id.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Logical ids this resource points at through intrinsics or `DependsOn`
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = self.depends_on.clone();
        for value in self.properties.values() {
            collect_references(value, &mut out);
        }
        out
    }

    fn to_template(&self) -> Value {
        let mut body = Map::new();
        body.insert("Type".into(), Value::String(self.resource_type.clone()));
        if !self.properties.is_empty() {
            body.insert("Properties".into(), Value::Object(self.properties.clone()));
        }
        if !self.depends_on.is_empty() {
            body.insert(
                "DependsOn".into(),
                Value::Array(self.depends_on.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(body)
    }
}

fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                out.insert(target.clone());
            }
            if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(target)) = parts.first() {
                    out.insert(target.clone());
                }
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

/// Parameter resolved by the provider when the template deploys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub parameter_type: String,
    pub default: String,
}

impl TemplateParameter {
    /// Image id read from a provider-side parameter at deploy time
    pub fn image_id_from_ssm(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_type: "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>".to_string(),
            default: parameter_name.into(),
        }
    }
}

/// Resources, parameters and outputs of one stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    pub description: Option<String>,
    parameters: BTreeMap<String, TemplateParameter>,
    resources: BTreeMap<String, Resource>,
    outputs: Vec<OutputBinding>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a resource; logical ids are unique
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> TopologyResult<()> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(TopologyError::ConstraintViolation(format!(
                "duplicate logical id '{}'",
                logical_id
            )));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Add a parameter; re-adding an identical one is a no-op
    pub fn add_parameter(
        &mut self,
        logical_id: impl Into<String>,
        parameter: TemplateParameter,
    ) -> TopologyResult<()> {
        let logical_id = logical_id.into();
        match self.parameters.get(&logical_id) {
            Some(existing) if *existing == parameter => Ok(()),
            Some(_) => Err(TopologyError::ConstraintViolation(format!(
                "conflicting parameter '{}'",
                logical_id
            ))),
            None => {
                self.parameters.insert(logical_id, parameter);
                Ok(())
            }
        }
    }

    /// Add an output; its target must already be in the graph
    pub fn add_output(&mut self, binding: OutputBinding) -> TopologyResult<()> {
        if !self.resources.contains_key(&binding.target.resource) {
            return Err(TopologyError::ConstraintViolation(format!(
                "output '{}' targets unknown resource '{}'",
                binding.name, binding.target.resource
            )));
        }
        if self
            .outputs
            .iter()
            .any(|o| o.name == binding.name || o.logical_id == binding.logical_id)
        {
            return Err(TopologyError::ConstraintViolation(format!(
                "duplicate output '{}'",
                binding.name
            )));
        }
        self.outputs.push(binding);
        Ok(())
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources.iter()
    }

    /// Resources of one provider type, in logical id order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn parameters(&self) -> &BTreeMap<String, TemplateParameter> {
        &self.parameters
    }

    pub fn outputs(&self) -> &[OutputBinding] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Every reference points at a resource or parameter of this graph
    pub fn validate_references(&self) -> TopologyResult<()> {
        for (id, resource) in &self.resources {
            for target in resource.references() {
                if target.starts_with("AWS::") {
                    continue;
                }
                if !self.resources.contains_key(&target) && !self.parameters.contains_key(&target)
                {
                    return Err(TopologyError::ConstraintViolation(format!(
                        "resource '{}' references unknown '{}'",
                        id, target
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render as a CloudFormation template document
    pub fn to_template(&self) -> Value {
        let mut template = Map::new();
        template.insert(
            "AWSTemplateFormatVersion".into(),
            Value::String(TEMPLATE_FORMAT_VERSION.to_string()),
        );
        if let Some(description) = &self.description {
            template.insert("Description".into(), Value::String(description.clone()));
        }

        if !self.parameters.is_empty() {
            let parameters = self
                .parameters
                .iter()
                .map(|(id, p)| {
                    (
                        id.clone(),
                        json!({ "Type": p.parameter_type, "Default": p.default }),
                    )
                })
                .collect();
            template.insert("Parameters".into(), Value::Object(parameters));
        }

        let resources = self
            .resources
            .iter()
            .map(|(id, r)| (id.clone(), r.to_template()))
            .collect();
        template.insert("Resources".into(), Value::Object(resources));

        if !self.outputs.is_empty() {
            let outputs = self
                .outputs
                .iter()
                .map(|o| (o.logical_id.clone(), json!({ "Value": o.target.to_intrinsic() })))
                .collect();
            template.insert("Outputs".into(), Value::Object(outputs));
        }

        Value::Object(template)
    }
}
