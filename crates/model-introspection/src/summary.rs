//! Human-readable summaries of models, fields and relationships

use std::fmt;

use crate::descriptor::{AuthRule, ConnectionType, FieldDescriptor, FieldType};

/// A field as shown in model listings
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub name: String,
    pub field_type: FieldType,
    pub is_required: bool,
    pub is_array: bool,
}

impl FieldSummary {
    pub(crate) fn new(name: &str, field: &FieldDescriptor) -> Self {
        Self {
            name: name.to_string(),
            field_type: field.field_type.clone(),
            is_required: field.is_required,
            is_array: field.is_array,
        }
    }

    fn annotations(&self) -> Vec<&'static str> {
        let mut annotations = Vec::new();
        if self.is_required {
            annotations.push("required");
        }
        if self.is_array {
            annotations.push("array");
        }
        annotations
    }
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.field_type)?;
        let annotations = self.annotations();
        if !annotations.is_empty() {
            write!(f, " [{}]", annotations.join(", "))?;
        }
        Ok(())
    }
}

/// A model as shown in model listings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub name: String,
    pub fields: Vec<FieldSummary>,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for field in &self.fields {
            write!(f, "\n  - {field}")?;
        }
        Ok(())
    }
}

/// A field with everything known about it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDetail {
    pub summary: FieldSummary,
    pub is_read_only: bool,
    pub connection_type: Option<ConnectionType>,
    pub associated_with: Vec<String>,
    pub target_names: Vec<String>,
}

impl FieldDetail {
    pub(crate) fn new(name: &str, field: &FieldDescriptor) -> Self {
        let association = field.association.as_ref();
        Self {
            summary: FieldSummary::new(name, field),
            is_read_only: field.is_read_only,
            connection_type: association.map(|association| association.connection_type),
            associated_with: association
                .map(|association| association.associated_with.clone())
                .unwrap_or_default(),
            target_names: association
                .map(|association| association.target_names.clone())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for FieldDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut annotations = self.summary.annotations();
        if self.is_read_only {
            annotations.push("read-only");
        }
        write!(f, "{}: {}", self.summary.name, self.summary.field_type)?;
        if !annotations.is_empty() {
            write!(f, " [{}]", annotations.join(", "))?;
        }
        if let Some(connection_type) = self.connection_type {
            write!(f, "\n      association: {connection_type}")?;
            if !self.associated_with.is_empty() {
                write!(f, ", associated with: {}", self.associated_with.join(", "))?;
            }
            if !self.target_names.is_empty() {
                write!(f, ", target fields: {}", self.target_names.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Detailed description of a single model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDetails {
    pub name: String,
    pub plural_name: Option<String>,
    pub primary_key: String,
    pub sort_keys: Vec<String>,
    pub fields: Vec<FieldDetail>,
    pub auth_rules: Vec<AuthRule>,
}

impl fmt::Display for ModelDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model: {}", self.name)?;
        if let Some(plural_name) = &self.plural_name {
            write!(f, " (plural: {plural_name})")?;
        }
        write!(f, "\nPrimary key: {}", self.primary_key)?;
        if !self.sort_keys.is_empty() {
            write!(f, " (sort keys: {})", self.sort_keys.join(", "))?;
        }

        write!(f, "\n\nFields:")?;
        for field in &self.fields {
            write!(f, "\n  - {field}")?;
        }

        if self.auth_rules.is_empty() {
            write!(f, "\n\nAuthorization rules: none")
        } else {
            write!(f, "\n\nAuthorization rules:")?;
            for rule in &self.auth_rules {
                write!(f, "\n  - {rule}")?;
            }
            Ok(())
        }
    }
}

/// A field linking one model to another
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub field: String,
    pub related_model: String,
    pub kind: Option<ConnectionType>,
    pub associated_with: Vec<String>,
    pub target_names: Vec<String>,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} (", self.field, self.related_model)?;
        match self.kind {
            Some(kind) => write!(f, "{kind})")?,
            None => write!(f, "unspecified)")?,
        }
        if !self.associated_with.is_empty() {
            write!(f, ", associated with: {}", self.associated_with.join(", "))?;
        }
        if !self.target_names.is_empty() {
            write!(f, ", target fields: {}", self.target_names.join(", "))?;
        }
        Ok(())
    }
}
