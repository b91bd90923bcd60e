//! Edge and entity validation.
//!
//! Runs before every mutation and on query arguments. Checks, in order:
//! - required fields are present and non-empty
//! - no reserved words or characters, identifiers within length limits
//! - a subject relation, when present, is non-empty

use std::fmt;

use crate::model::{Edge, EntityRef};

/// Characters that may not appear in any identifier. `%` is the storage
/// separator, the rest delimit the `ns:name#rel@ns:name` text form.
pub const RESERVED_CHARACTERS: &[char] = &['%', ':', '#', '@'];

/// Words that may not be used as a whole namespace or relation.
pub const RESERVED_WORDS: &[&str] = &["*", "..."];

/// Maximum identifier length in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Identity field of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ObjectNamespace,
    ObjectName,
    ObjectRelation,
    SubjectNamespace,
    SubjectName,
    SubjectRelation,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ObjectNamespace => "object_namespace",
            Field::ObjectName => "object_name",
            Field::ObjectRelation => "relation",
            Field::SubjectNamespace => "subject_namespace",
            Field::SubjectName => "subject_name",
            Field::SubjectRelation => "subject_relation",
        }
    }

    fn is_name(&self) -> bool {
        matches!(self, Field::ObjectName | Field::SubjectName)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty
    MissingField { field: Field },
    /// A namespace or relation is a reserved word
    ReservedWord { field: Field, value: String },
    /// An identifier contains a reserved character
    ReservedCharacter {
        field: Field,
        value: String,
        character: char,
    },
    /// An identifier exceeds [`MAX_IDENTIFIER_LENGTH`]
    TooLong { field: Field, length: usize },
    /// The subject carries a relation that is empty
    EmptySubjectRelation,
}

impl ValidationError {
    /// The offending field.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::ReservedWord { field, .. }
            | ValidationError::ReservedCharacter { field, .. }
            | ValidationError::TooLong { field, .. } => *field,
            ValidationError::EmptySubjectRelation => Field::SubjectRelation,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "{} is required and cannot be empty", field)
            }
            ValidationError::ReservedWord { field, value } => {
                write!(f, "{} '{}' is a reserved word", field, value)
            }
            ValidationError::ReservedCharacter {
                field,
                value,
                character,
            } => write!(
                f,
                "{} '{}' contains reserved character '{}'",
                field, value, character
            ),
            ValidationError::TooLong { field, length } => write!(
                f,
                "{} is {} bytes long (max: {})",
                field, length, MAX_IDENTIFIER_LENGTH
            ),
            ValidationError::EmptySubjectRelation => {
                write!(f, "subject_relation cannot be empty when present")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Validates an edge before it is written.
pub fn validate_edge(edge: &Edge) -> ValidationResult {
    let object_relation = edge.object.relation.as_deref().unwrap_or_default();
    let required = [
        (Field::ObjectNamespace, edge.object.namespace.as_str()),
        (Field::ObjectName, edge.object.name.as_str()),
        (Field::ObjectRelation, object_relation),
        (Field::SubjectNamespace, edge.subject.namespace.as_str()),
        (Field::SubjectName, edge.subject.name.as_str()),
    ];
    check_present(&required)?;

    let mut identifiers = required.to_vec();
    if let Some(relation) = edge.subject.relation.as_deref() {
        identifiers.push((Field::SubjectRelation, relation));
    }
    check_identifiers(&identifiers)?;
    check_subject_relation(&edge.subject)
}

/// Validates the subject argument of a query.
pub fn validate_subject(subject: &EntityRef) -> ValidationResult {
    let required = [
        (Field::SubjectNamespace, subject.namespace.as_str()),
        (Field::SubjectName, subject.name.as_str()),
    ];
    check_present(&required)?;

    let mut identifiers = required.to_vec();
    if let Some(relation) = subject.relation.as_deref() {
        identifiers.push((Field::SubjectRelation, relation));
    }
    check_identifiers(&identifiers)?;
    check_subject_relation(subject)
}

/// Validates the object argument of a query. The relation is required.
pub fn validate_object(object: &EntityRef) -> ValidationResult {
    let identifiers = [
        (Field::ObjectNamespace, object.namespace.as_str()),
        (Field::ObjectName, object.name.as_str()),
        (
            Field::ObjectRelation,
            object.relation.as_deref().unwrap_or_default(),
        ),
    ];
    check_present(&identifiers)?;
    check_identifiers(&identifiers)
}

fn check_present(fields: &[(Field, &str)]) -> ValidationResult {
    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((field, _)) => Err(ValidationError::MissingField { field: *field }),
        None => Ok(()),
    }
}

fn check_identifiers(fields: &[(Field, &str)]) -> ValidationResult {
    for (field, value) in fields {
        if !field.is_name() && RESERVED_WORDS.contains(value) {
            return Err(ValidationError::ReservedWord {
                field: *field,
                value: value.to_string(),
            });
        }
        if let Some(character) = value.chars().find(|c| RESERVED_CHARACTERS.contains(c)) {
            return Err(ValidationError::ReservedCharacter {
                field: *field,
                value: value.to_string(),
                character,
            });
        }
        if value.len() > MAX_IDENTIFIER_LENGTH {
            return Err(ValidationError::TooLong {
                field: *field,
                length: value.len(),
            });
        }
    }
    Ok(())
}

fn check_subject_relation(subject: &EntityRef) -> ValidationResult {
    match subject.relation.as_deref() {
        Some("") => Err(ValidationError::EmptySubjectRelation),
        _ => Ok(()),
    }
}
