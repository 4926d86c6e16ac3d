//! Preconditions: leaf conditions and the `<preConditions>` container, whose
//! boolean operator becomes an extra layer of `and`/`or`/`not` elements.

use crate::element::{Element, Exclusions, Field, attr_enum, element_enum, element_shell};
use crate::error::ChangelogError;
use crate::xml::XmlElement;
use log::trace;

attr_enum! {
    /// Values for `onFail` and `onError`.
    pub enum Action {
        Continue => "CONTINUE",
        Halt => "HALT",
        MarkRan => "MARK_RAN",
        Warn => "WARN",
    }
}

attr_enum! {
    /// Values for `onSqlOutput` and `onUpdateSql`.
    pub enum SqlAction {
        Fail => "FAIL",
        Ignore => "IGNORE",
        Test => "TEST",
    }
}

attr_enum! {
    /// How the children of a precondition group combine.
    pub enum Logic {
        And => "and",
        Or => "or",
        Not => "not",
    }
}

impl Default for Logic {
    fn default() -> Self {
        Logic::And
    }
}

attr_enum! {
    /// Database types for `<dbms type="...">`.
    pub enum DbmsType {
        Neo4j => "neo4j",
    }
}

// --- Leaf conditions ---

/// Passes when the target database matches the given type.
#[derive(Debug, Clone, PartialEq)]
pub struct DbmsPrecondition {
    pub dbms_type: DbmsType,
}

impl DbmsPrecondition {
    pub fn new(dbms_type: DbmsType) -> Self {
        Self { dbms_type }
    }
}

impl Element for DbmsPrecondition {
    fn tag(&self) -> &str {
        "dbms"
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("type", Some(self.dbms_type))]
    }
}

/// Asserts the Neo4j version, given as `major.minor.patch`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionPrecondition {
    pub matches: String,
}

impl VersionPrecondition {
    pub fn new(matches: impl Into<String>) -> Result<Self, ChangelogError> {
        let condition = Self {
            matches: matches.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        let mut parts = 0;
        let well_formed = self.matches.split('.').all(|part| {
            parts += 1;
            !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
        });
        if well_formed && parts == 3 {
            Ok(())
        } else {
            Err(ChangelogError::InvalidAttributeFormat {
                element: "neo4j:version",
                attribute: "matches",
                expected: "major.minor.patch",
            })
        }
    }
}

impl Element for VersionPrecondition {
    fn tag(&self) -> &str {
        "neo4j:version"
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("matches", Some(self.matches.as_str()))]
    }
}

/// Asserts the Neo4j edition. Exactly one of the flags must be `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditionPrecondition {
    pub enterprise: Option<bool>,
    pub community: Option<bool>,
}

impl EditionPrecondition {
    pub fn new(enterprise: Option<bool>, community: Option<bool>) -> Result<Self, ChangelogError> {
        let condition = Self {
            enterprise,
            community,
        };
        condition.validate()?;
        Ok(condition)
    }

    pub fn enterprise() -> Self {
        Self {
            enterprise: Some(true),
            community: None,
        }
    }

    pub fn community() -> Self {
        Self {
            enterprise: None,
            community: Some(true),
        }
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        let enterprise = self.enterprise == Some(true);
        let community = self.community == Some(true);
        if enterprise == community {
            return Err(ChangelogError::ValidationError(
                "exactly one of 'enterprise' or 'community' must be set to true",
            ));
        }
        Ok(())
    }
}

impl Element for EditionPrecondition {
    fn tag(&self) -> &str {
        "neo4j:edition"
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("enterprise", self.enterprise),
            Field::new("community", self.community),
        ]
    }
}

/// The value a cypher check query must return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpectedResult {
    Int(i64),
    Float(f64),
}

impl From<i64> for ExpectedResult {
    fn from(i: i64) -> Self {
        ExpectedResult::Int(i)
    }
}

impl From<f64> for ExpectedResult {
    fn from(x: f64) -> Self {
        ExpectedResult::Float(x)
    }
}

impl From<ExpectedResult> for crate::element::AttrValue {
    fn from(r: ExpectedResult) -> Self {
        match r {
            ExpectedResult::Int(i) => i.into(),
            ExpectedResult::Float(x) => x.into(),
        }
    }
}

/// Runs a Cypher query returning a single value and compares it with
/// `expected_result`.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherCheckPrecondition {
    pub expected_result: ExpectedResult,
    pub query: String,
}

impl CypherCheckPrecondition {
    pub fn new(
        expected_result: impl Into<ExpectedResult>,
        query: impl Into<String>,
    ) -> Result<Self, ChangelogError> {
        let condition = Self {
            expected_result: expected_result.into(),
            query: query.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    pub fn validate(&self) -> Result<(), ChangelogError> {
        let valid = match self.expected_result {
            ExpectedResult::Int(i) => i >= 0,
            ExpectedResult::Float(x) => x.is_finite() && x >= 0.0,
        };
        if valid {
            Ok(())
        } else {
            Err(ChangelogError::InvalidAttributeFormat {
                element: "neo4j:cypherCheck",
                attribute: "expectedResult",
                expected: "a non-negative integer or finite float",
            })
        }
    }
}

impl Element for CypherCheckPrecondition {
    fn tag(&self) -> &str {
        "neo4j:cypherCheck"
    }

    fn text(&self) -> &str {
        &self.query
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("expected_result", Some(self.expected_result))]
    }
}

element_enum! {
    /// A leaf condition inside a precondition group.
    pub enum Condition {
        Dbms(DbmsPrecondition),
        Version(VersionPrecondition),
        Edition(EditionPrecondition),
        CypherCheck(CypherCheckPrecondition),
    }
}

impl Condition {
    pub fn validate(&self) -> Result<(), ChangelogError> {
        match self {
            Condition::Dbms(_) => Ok(()),
            Condition::Version(c) => c.validate(),
            Condition::Edition(c) => c.validate(),
            Condition::CypherCheck(c) => c.validate(),
        }
    }
}

// --- Groups ---

/// A child of a precondition group: a nested group or a leaf condition.
#[derive(Debug, Clone, PartialEq)]
pub enum PreconditionChild {
    Group(Preconditions),
    Condition(Condition),
}

impl From<Preconditions> for PreconditionChild {
    fn from(group: Preconditions) -> Self {
        PreconditionChild::Group(group)
    }
}

impl From<Condition> for PreconditionChild {
    fn from(condition: Condition) -> Self {
        PreconditionChild::Condition(condition)
    }
}

macro_rules! condition_child {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for PreconditionChild {
                fn from(c: $ty) -> Self {
                    PreconditionChild::Condition(c.into())
                }
            }
        )+
    };
}

condition_child!(
    DbmsPrecondition,
    VersionPrecondition,
    EditionPrecondition,
    CypherCheckPrecondition
);

/// `<preConditions>`: groups conditions and nested groups under one boolean
/// operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preconditions {
    pub on_error: Option<Action>,
    pub on_error_message: Option<String>,
    pub on_fail: Option<Action>,
    pub on_fail_message: Option<String>,
    pub on_sql_output: Option<SqlAction>,
    pub on_update_sql: Option<SqlAction>,
    pub conditional_logic: Logic,
    pub text: String,
    pub subelements: Vec<PreconditionChild>,
}

impl Preconditions {
    const EXCLUDED: Exclusions = Exclusions::extend(&["conditional_logic"]);

    pub fn new() -> Self {
        Self::default()
    }

    /// An empty group combining its children with `logic`.
    pub fn with_logic(logic: Logic) -> Self {
        Self {
            conditional_logic: logic,
            ..Default::default()
        }
    }

    /// Appends a condition or nested group.
    pub fn add(&mut self, child: impl Into<PreconditionChild>) -> &mut Self {
        self.subelements.push(child.into());
        self
    }

    /// Validates every condition in this group and its nested groups.
    pub fn validate(&self) -> Result<(), ChangelogError> {
        self.subelements.iter().try_for_each(|child| match child {
            PreconditionChild::Group(group) => group.validate(),
            PreconditionChild::Condition(condition) => condition.validate(),
        })
    }

    /// Builds the operator element for this group, nesting one operator
    /// element per child group.
    fn logic_element(&self) -> XmlElement {
        let mut logic = XmlElement::new(self.conditional_logic.value());
        for child in &self.subelements {
            match child {
                PreconditionChild::Group(group) => logic.push(group.logic_element()),
                PreconditionChild::Condition(condition) => logic.push(condition.to_xml(false)),
            }
        }
        logic
    }
}

impl Element for Preconditions {
    fn tag(&self) -> &str {
        "preConditions"
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn children(&self) -> Vec<&dyn Element> {
        self.subelements
            .iter()
            .map(|child| match child {
                PreconditionChild::Group(group) => group as &dyn Element,
                PreconditionChild::Condition(condition) => condition as &dyn Element,
            })
            .collect()
    }

    fn excluded_attrs(&self) -> Exclusions {
        Self::EXCLUDED
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("on_error", self.on_error),
            Field::new("on_error_message", self.on_error_message.as_deref()),
            Field::new("on_fail", self.on_fail),
            Field::new("on_fail_message", self.on_fail_message.as_deref()),
            Field::new("on_sql_output", self.on_sql_output),
            Field::new("on_update_sql", self.on_update_sql),
            Field::new("conditional_logic", Some(self.conditional_logic)),
        ]
    }

    /// The group's own element holding a single operator element. The root
    /// namespace block never applies to a group.
    fn to_xml(&self, _is_document_root: bool) -> XmlElement {
        trace!(
            "serializing <preConditions> with {} children under <{}>",
            self.subelements.len(),
            self.conditional_logic
        );
        let mut element = element_shell(self, false);
        element.push(self.logic_element());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::extract_attributes;

    #[test]
    fn test_to_xml_nested_conditions() {
        let mut preconditions = Preconditions {
            on_fail: Some(Action::Warn),
            on_fail_message: Some("Epic Fail".into()),
            ..Default::default()
        };
        preconditions
            .add(EditionPrecondition::community())
            .add(VersionPrecondition::new("1.2.3").unwrap());

        let xml = preconditions.to_xml(false).to_xml_string().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<preConditions onFail="WARN" onFailMessage="Epic Fail"><and>"#,
                r#"<neo4j:edition community="true"/>"#,
                r#"<neo4j:version matches="1.2.3"/>"#,
                "</and></preConditions>"
            )
        );
    }

    #[test]
    fn test_to_xml_nested_preconditions() {
        let mut parent = Preconditions {
            on_fail: Some(Action::Continue),
            ..Default::default()
        };
        let mut child = Preconditions::with_logic(Logic::Or);
        child
            .add(EditionPrecondition::enterprise())
            .add(VersionPrecondition::new("4.4.0").unwrap());
        let check = CypherCheckPrecondition::new(
            0_i64,
            "MATCH (n) WHERE NONE(label IN LABELS(n) WHERE label STARTS WITH '__Liquibase') RETURN COUNT(n)",
        )
        .unwrap();
        parent.add(child).add(check);

        let xml = parent.to_xml(false).to_xml_string().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<preConditions onFail="CONTINUE">"#,
                "<and>",
                "<or>",
                r#"<neo4j:edition enterprise="true"/>"#,
                r#"<neo4j:version matches="4.4.0"/>"#,
                "</or>",
                r#"<neo4j:cypherCheck expectedResult="0">"#,
                "MATCH (n) WHERE NONE(label IN LABELS(n) WHERE label STARTS WITH '__Liquibase') RETURN COUNT(n)",
                "</neo4j:cypherCheck>",
                "</and>",
                "</preConditions>"
            )
        );
    }

    #[test]
    fn test_deeply_nested_groups_recurse() {
        let mut inner = Preconditions::with_logic(Logic::Not);
        inner.add(DbmsPrecondition::new(DbmsType::Neo4j));
        let mut middle = Preconditions::with_logic(Logic::Or);
        middle.add(inner).add(EditionPrecondition::community());
        let mut outer = Preconditions::new();
        outer.add(middle);

        let xml = outer.to_xml(false).to_xml_string().unwrap();
        assert_eq!(
            xml,
            concat!(
                "<preConditions><and><or><not>",
                r#"<dbms type="neo4j"/>"#,
                "</not>",
                r#"<neo4j:edition community="true"/>"#,
                "</or></and></preConditions>"
            )
        );
    }

    #[test]
    fn test_empty_group_has_empty_wrapper() {
        let xml = Preconditions::with_logic(Logic::Or).to_xml(false);
        assert_eq!(xml.children.len(), 1);
        assert_eq!(xml.children[0].tag, "or");
        assert!(xml.children[0].children.is_empty());
        assert_eq!(xml.to_xml_string().unwrap(), "<preConditions><or/></preConditions>");
    }

    #[test]
    fn test_group_ignores_document_root_flag() {
        let xml = Preconditions::new().to_xml(true);
        assert!(xml.attributes.is_empty());
    }

    #[test]
    fn test_conditional_logic_is_not_an_attribute() {
        let group = Preconditions {
            on_sql_output: Some(SqlAction::Test),
            conditional_logic: Logic::Or,
            ..Default::default()
        };
        let attrs = extract_attributes(&group);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("onSqlOutput").map(String::as_str), Some("TEST"));
        assert!(!attrs.contains_key("conditionalLogic"));
    }

    #[test]
    fn test_version_format() {
        assert!(VersionPrecondition::new("5.26.0").is_ok());
        for bad in ["1.2", "1.2.3.4", "a.b.c", "1..3", "", "1.2.3 ", "v1.2.3"] {
            assert!(
                matches!(
                    VersionPrecondition::new(bad),
                    Err(ChangelogError::InvalidAttributeFormat { attribute: "matches", .. })
                ),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_edition_requires_exactly_one_flag() {
        assert!(EditionPrecondition::new(Some(true), None).is_ok());
        assert!(EditionPrecondition::new(Some(false), Some(true)).is_ok());
        assert!(EditionPrecondition::new(Some(true), Some(true)).is_err());
        assert!(EditionPrecondition::new(None, None).is_err());
        assert!(EditionPrecondition::new(Some(false), Some(false)).is_err());
    }

    #[test]
    fn test_edition_renders_explicit_false() {
        let condition = EditionPrecondition::new(Some(false), Some(true)).unwrap();
        let xml = condition.to_xml(false);
        assert_eq!(xml.attribute("enterprise"), Some("false"));
        assert_eq!(xml.attribute("community"), Some("true"));
    }

    #[test]
    fn test_cypher_check_expected_result() {
        let check = CypherCheckPrecondition::new(1.5, "RETURN 1.5").unwrap();
        assert_eq!(check.to_xml(false).attribute("expectedResult"), Some("1.5"));
        assert!(CypherCheckPrecondition::new(f64::NAN, "RETURN 0").is_err());
        assert!(CypherCheckPrecondition::new(f64::INFINITY, "RETURN 0").is_err());
        assert!(CypherCheckPrecondition::new(-3_i64, "RETURN -3").is_err());
        assert!(CypherCheckPrecondition::new(-0.5, "RETURN -0.5").is_err());
        assert!(CypherCheckPrecondition::new(0_i64, "RETURN 0").is_ok());
    }

    #[test]
    fn test_validate_reaches_nested_groups() {
        let mut inner = Preconditions::new();
        inner.add(EditionPrecondition::community());
        let mut outer = Preconditions::new();
        outer.add(inner);
        assert!(outer.validate().is_ok());

        if let Some(PreconditionChild::Group(group)) = outer.subelements.first_mut() {
            group.add(EditionPrecondition {
                enterprise: Some(true),
                community: Some(true),
            });
        }
        assert!(matches!(
            outer.validate(),
            Err(ChangelogError::ValidationError(_))
        ));
    }

    #[test]
    fn test_children_view_matches_subelements() {
        let mut group = Preconditions::new();
        group
            .add(DbmsPrecondition::new(DbmsType::Neo4j))
            .add(Preconditions::with_logic(Logic::Or));
        let tags: Vec<&str> = group.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["dbms", "preConditions"]);
    }
}
