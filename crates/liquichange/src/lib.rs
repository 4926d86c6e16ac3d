// src/lib.rs

#![doc = "Builds Liquibase changelogs in memory and serializes them to XML."]
#![doc = ""]
#![doc = "Every record implements [`Element`]: a fixed tag, text, ordered children and"]
#![doc = "a list of typed fields. The generic engine turns fields into camelCase"]
#![doc = "attributes and records into an [`XmlElement`] tree; precondition groups"]
#![doc = "additionally wrap their children in `and` / `or` / `not` elements."]
#![doc = ""]
#![doc = "- `Element::to_xml`: builds the element tree of any record."]
#![doc = "- `extract_attributes`: the attribute map of any record."]
#![doc = "- `save_changelog_to_string` / `save_changelog_to_file`: validated document output."]

// --- Crate Modules ---

mod builder;
mod changelog;
mod config;
mod element;
mod error;
mod precondition;
mod xml;

// --- Public API Re-exports ---

pub use builder::{save_changelog_to_file, save_changelog_to_string};
pub use changelog::{
    ChangeType, Changelog, ChangelogChild, Changeset, ChangesetChild, Comment, CypherChange,
    Include, IncludeAll, ObjectQuotingStrategy, Property, Rollback, RunOrder,
};
pub use config::{Encoding, Indent, WriteOptions};
pub use element::{
    AttrValue, Element, Exclusions, Field, build_element, element_shell, extract_attributes,
    snake_to_camel,
};
pub use error::ChangelogError;
pub use precondition::{
    Action, Condition, CypherCheckPrecondition, DbmsPrecondition, DbmsType,
    EditionPrecondition, ExpectedResult, Logic, PreconditionChild, Preconditions, SqlAction,
    VersionPrecondition,
};
pub use xml::{
    NAMESPACE, NEO4J_NAMESPACE, ROOT_ATTRIBUTES, SCHEMA_LOCATION, XSI_NAMESPACE, XmlElement,
};
