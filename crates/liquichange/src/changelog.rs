//! Changelog, changesets and the records they hold.

use crate::element::{Element, Exclusions, Field, attr_enum, element_enum};
use crate::error::ChangelogError;
use crate::precondition::{DbmsType, PreconditionChild, Preconditions};
use crate::xml::XmlElement;
use core::fmt;
use log::debug;

attr_enum! {
    /// Values for `objectQuotingStrategy`.
    pub enum ObjectQuotingStrategy {
        Legacy => "LEGACY",
        QuoteAllObjects => "QUOTE_ALL_OBJECTS",
        QuoteOnlyReservedWords => "QUOTE_ONLY_RESERVED_WORDS",
    }
}

attr_enum! {
    /// Values for `runOrder`.
    pub enum RunOrder {
        First => "first",
        Last => "last",
    }
}

/// Fails with `MissingAttribute` when `value` is blank.
fn require(
    element: &'static str,
    attribute: &'static str,
    value: &str,
) -> Result<(), ChangelogError> {
    if value.trim().is_empty() {
        return Err(ChangelogError::MissingAttribute { element, attribute });
    }
    Ok(())
}

// --- Change types ---

/// `<neo4j:cypher>`: a Cypher statement run by the changeset.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherChange {
    pub statement: String,
}

impl CypherChange {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
        }
    }
}

impl Element for CypherChange {
    fn tag(&self) -> &str {
        "neo4j:cypher"
    }

    fn text(&self) -> &str {
        &self.statement
    }

    fn fields(&self) -> Vec<Field> {
        Vec::new()
    }
}

element_enum! {
    /// The change a changeset applies.
    pub enum ChangeType {
        Cypher(CypherChange),
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag())
    }
}

// --- Changeset children ---

/// `<comment>`: free text attached to a changeset.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Element for Comment {
    fn tag(&self) -> &str {
        "comment"
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn fields(&self) -> Vec<Field> {
        Vec::new()
    }
}

/// `<rollback>`: how to undo a changeset, either as raw text, a change type,
/// or a reference to another changeset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollback {
    pub change_set_id: Option<String>,
    pub change_set_author: Option<String>,
    pub change_type: Option<ChangeType>,
    pub text: String,
    pub subelements: Vec<ChangeType>,
}

impl Rollback {
    const EXCLUDED: Exclusions = Exclusions::extend(&["change_type"]);

    /// A rollback given as raw statement text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A rollback running `change`, which becomes its first child.
    pub fn with_change(change: impl Into<ChangeType>) -> Self {
        let change = change.into();
        Self {
            subelements: vec![change.clone()],
            change_type: Some(change),
            ..Default::default()
        }
    }
}

impl Element for Rollback {
    fn tag(&self) -> &str {
        "rollback"
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn children(&self) -> Vec<&dyn Element> {
        self.subelements.iter().map(|c| c as &dyn Element).collect()
    }

    fn excluded_attrs(&self) -> Exclusions {
        Self::EXCLUDED
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("change_set_id", self.change_set_id.as_deref()),
            Field::new("change_set_author", self.change_set_author.as_deref()),
            Field::new("change_type", self.change_type.as_ref().map(ToString::to_string)),
        ]
    }
}

element_enum! {
    /// A record nested inside a `<changeSet>`.
    pub enum ChangesetChild {
        Change(ChangeType),
        Comment(Comment),
        Preconditions(Preconditions),
        Rollback(Rollback),
    }
}

// --- Changeset ---

/// `<changeSet>`: the unit of change, identified by `id` and `author`.
#[derive(Debug, Clone, PartialEq)]
pub struct Changeset {
    pub id: String,
    pub author: String,
    pub change_type: ChangeType,
    pub dbms: Option<String>,
    pub context_filter: Option<String>,
    pub created: Option<String>,
    pub labels: Option<String>,
    pub logical_file_path: Option<String>,
    pub run_order: Option<RunOrder>,
    pub fail_on_error: Option<bool>,
    pub ignore: Option<bool>,
    pub object_quoting_strategy: Option<ObjectQuotingStrategy>,
    pub run_always: Option<bool>,
    pub run_in_transaction: Option<bool>,
    pub run_on_change: Option<bool>,
    pub subelements: Vec<ChangesetChild>,
}

impl Changeset {
    const EXCLUDED: Exclusions = Exclusions::extend(&["change_type"]);

    /// Creates a changeset whose first child is `change_type`.
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        change_type: impl Into<ChangeType>,
    ) -> Result<Self, ChangelogError> {
        let change_type = change_type.into();
        let changeset = Self {
            id: id.into(),
            author: author.into(),
            subelements: vec![ChangesetChild::Change(change_type.clone())],
            change_type,
            dbms: None,
            context_filter: None,
            created: None,
            labels: None,
            logical_file_path: None,
            run_order: None,
            fail_on_error: None,
            ignore: None,
            object_quoting_strategy: None,
            run_always: None,
            run_in_transaction: None,
            run_on_change: None,
        };
        changeset.validate()?;
        Ok(changeset)
    }

    /// Adds a precondition group. The first group becomes a child of the
    /// changeset; later ones are nested inside it.
    pub fn add_preconditions(&mut self, preconditions: Preconditions) {
        let existing = self.subelements.iter_mut().find_map(|child| match child {
            ChangesetChild::Preconditions(group) => Some(group),
            _ => None,
        });
        match existing {
            Some(group) => group.subelements.push(PreconditionChild::Group(preconditions)),
            None => self
                .subelements
                .push(ChangesetChild::Preconditions(preconditions)),
        }
    }

    pub fn set_rollback(&mut self, rollback: Rollback) {
        self.subelements.push(ChangesetChild::Rollback(rollback));
    }

    pub fn set_comment(&mut self, comment: Comment) {
        self.subelements.push(ChangesetChild::Comment(comment));
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        require("changeSet", "id", &self.id)?;
        require("changeSet", "author", &self.author)?;
        self.subelements.iter().try_for_each(|child| match child {
            ChangesetChild::Preconditions(group) => group.validate(),
            _ => Ok(()),
        })
    }
}

impl Element for Changeset {
    fn tag(&self) -> &str {
        "changeSet"
    }

    fn children(&self) -> Vec<&dyn Element> {
        self.subelements.iter().map(|c| c as &dyn Element).collect()
    }

    fn excluded_attrs(&self) -> Exclusions {
        Self::EXCLUDED
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("id", Some(self.id.as_str())),
            Field::new("author", Some(self.author.as_str())),
            Field::new("change_type", Some(self.change_type.to_string())),
            Field::new("dbms", self.dbms.as_deref()),
            Field::new("context_filter", self.context_filter.as_deref()),
            Field::new("created", self.created.as_deref()),
            Field::new("labels", self.labels.as_deref()),
            Field::new("logical_file_path", self.logical_file_path.as_deref()),
            Field::new("run_order", self.run_order),
            Field::new("fail_on_error", self.fail_on_error),
            Field::new("ignore", self.ignore),
            Field::new("object_quoting_strategy", self.object_quoting_strategy),
            Field::new("run_always", self.run_always),
            Field::new("run_in_transaction", self.run_in_transaction),
            Field::new("run_on_change", self.run_on_change),
        ]
    }
}

// --- Changelog directives ---

/// `<property>`: a value substituted for `${name}` tokens, or a file of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: Option<String>,
    pub value: Option<String>,
    pub file: Option<String>,
    pub relative_to_changelog_file: Option<String>,
    pub context: Option<String>,
    pub dbms: Option<DbmsType>,
    pub global_: Option<bool>,
}

impl Property {
    pub fn new(
        name: Option<String>,
        value: Option<String>,
        file: Option<String>,
    ) -> Result<Self, ChangelogError> {
        let property = Self {
            name,
            value,
            file,
            ..Default::default()
        };
        property.validate()?;
        Ok(property)
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn from_file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        let unset = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
        if unset(&self.file) && unset(&self.name) && unset(&self.value) {
            return Err(ChangelogError::ValidationError(
                "if file isn't provided, name and value are required",
            ));
        }
        Ok(())
    }
}

impl Element for Property {
    fn tag(&self) -> &str {
        "property"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("name", self.name.as_deref()),
            Field::new("value", self.value.as_deref()),
            Field::new("file", self.file.as_deref()),
            Field::new(
                "relative_to_changelog_file",
                self.relative_to_changelog_file.as_deref(),
            ),
            Field::new("context", self.context.as_deref()),
            Field::new("dbms", self.dbms),
            Field::new("global_", self.global_),
        ]
    }
}

/// `<include>`: pulls in another changelog file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Include {
    pub file: String,
    pub relative_to_changelog_file: Option<bool>,
    pub context_filter: Option<String>,
    pub labels: Option<String>,
}

impl Include {
    pub fn new(file: impl Into<String>) -> Result<Self, ChangelogError> {
        let include = Self {
            file: file.into(),
            ..Default::default()
        };
        include.validate()?;
        Ok(include)
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        require("include", "file", &self.file)
    }
}

impl Element for Include {
    fn tag(&self) -> &str {
        "include"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("file", Some(self.file.as_str())),
            Field::new("relative_to_changelog_file", self.relative_to_changelog_file),
            Field::new("context_filter", self.context_filter.as_deref()),
            Field::new("labels", self.labels.as_deref()),
        ]
    }
}

/// `<includeAll>`: pulls in every changelog file of a directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncludeAll {
    pub path: String,
    pub error_if_missing_or_empty: Option<bool>,
    pub relative_to_changelog_file: Option<bool>,
    pub resource_comparator: Option<String>,
    pub filter: Option<String>,
    pub context_filter: Option<String>,
}

impl IncludeAll {
    pub fn new(path: impl Into<String>) -> Result<Self, ChangelogError> {
        let include_all = Self {
            path: path.into(),
            ..Default::default()
        };
        include_all.validate()?;
        Ok(include_all)
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        require("includeAll", "path", &self.path)
    }
}

impl Element for IncludeAll {
    fn tag(&self) -> &str {
        "includeAll"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("path", Some(self.path.as_str())),
            Field::new("error_if_missing_or_empty", self.error_if_missing_or_empty),
            Field::new("relative_to_changelog_file", self.relative_to_changelog_file),
            Field::new("resource_comparator", self.resource_comparator.as_deref()),
            Field::new("filter", self.filter.as_deref()),
            Field::new("context_filter", self.context_filter.as_deref()),
        ]
    }
}

element_enum! {
    /// A record nested directly inside `<databaseChangeLog>`.
    pub enum ChangelogChild {
        Preconditions(Preconditions),
        Property(Property),
        Changeset(Changeset),
        Include(Include),
        IncludeAll(IncludeAll),
    }
}

// --- Changelog ---

/// `<databaseChangeLog>`: the document root, an ordered list of changesets
/// and directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changelog {
    pub logical_file_path: Option<String>,
    pub object_quoting_strategy: Option<ObjectQuotingStrategy>,
    pub subelements: Vec<ChangelogChild>,
}

impl Changelog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_changeset(&mut self, changeset: Changeset) {
        self.subelements.push(ChangelogChild::Changeset(changeset));
    }

    pub fn add_preconditions(&mut self, preconditions: Preconditions) {
        self.subelements
            .push(ChangelogChild::Preconditions(preconditions));
    }

    pub fn add_property(&mut self, property: Property) {
        self.subelements.push(ChangelogChild::Property(property));
    }

    pub fn add_include(&mut self, include: Include) {
        self.subelements.push(ChangelogChild::Include(include));
    }

    pub fn add_include_all(&mut self, include_all: IncludeAll) {
        self.subelements.push(ChangelogChild::IncludeAll(include_all));
    }

    pub fn count_changesets(&self) -> usize {
        self.subelements
            .iter()
            .filter(|child| matches!(child, ChangelogChild::Changeset(_)))
            .count()
    }

    /// The full document tree, namespace block included.
    pub fn to_document(&self) -> XmlElement {
        self.to_xml(true)
    }

    /// Checks every record in the changelog, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ChangelogError> {
        let result = self.subelements.iter().try_for_each(|child| match child {
            ChangelogChild::Preconditions(group) => group.validate(),
            ChangelogChild::Property(property) => property.validate(),
            ChangelogChild::Changeset(changeset) => changeset.validate(),
            ChangelogChild::Include(include) => include.validate(),
            ChangelogChild::IncludeAll(include_all) => include_all.validate(),
        });
        if let Err(e) = &result {
            debug!("changelog validation failed: {}", e);
        }
        result
    }
}

impl Element for Changelog {
    fn tag(&self) -> &str {
        "databaseChangeLog"
    }

    fn children(&self) -> Vec<&dyn Element> {
        self.subelements.iter().map(|c| c as &dyn Element).collect()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("logical_file_path", self.logical_file_path.as_deref()),
            Field::new("object_quoting_strategy", self.object_quoting_strategy),
        ]
    }
}
