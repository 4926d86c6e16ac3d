//! The element capability shared by every changelog record, and the generic
//! engine that turns records into attributes and XML element trees.
//!
//! Records do not rely on reflection: each one lists its attribute candidates
//! through [`Element::fields`], in declaration order, with `None` for unset
//! values. [`extract_attributes`] filters and formats that list, and the
//! default [`Element::to_xml`] walks the ownership tree depth-first.

use crate::xml::{ROOT_ATTRIBUTES, XmlElement};
use core::fmt;
use indexmap::IndexMap;
use log::trace;

// --- Attribute values ---

/// A typed attribute candidate before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Rendered as `true` / `false`.
    Bool(bool),
    /// An enumerated value, rendered as its declared string value.
    Enum(&'static str),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            AttrValue::Enum(v) => f.write_str(v),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i64::from(i))
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<u32> for AttrValue {
    fn from(i: u32) -> Self {
        AttrValue::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.into())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

/// One declared field of a record: its underscore-separated name and its value,
/// or `None` when unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: Option<AttrValue>,
}

impl Field {
    pub fn new<V: Into<AttrValue>>(name: &'static str, value: Option<V>) -> Self {
        Self {
            name,
            value: value.map(Into::into),
        }
    }
}

// --- Exclusion sets ---

/// Field names never extracted as attributes: a shared structural base plus
/// the names a record kind adds on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusions {
    extra: &'static [&'static str],
}

impl Exclusions {
    /// Structural names excluded for every record kind.
    pub const BASE_NAMES: &'static [&'static str] = &[
        "subelements",
        "tag",
        "text",
        "namespace",
        "xsi_namespace",
        "neo4j_namespace",
        "schema_location",
        "excluded_attrs",
    ];

    /// The base set alone.
    pub const BASE: Self = Self::extend(&[]);

    /// The base set extended with `extra`.
    pub const fn extend(extra: &'static [&'static str]) -> Self {
        Self { extra }
    }

    pub fn contains(&self, name: &str) -> bool {
        Self::BASE_NAMES.contains(&name) || self.extra.contains(&name)
    }

    /// Every excluded name, base first.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::BASE_NAMES.iter().chain(self.extra.iter()).copied()
    }
}

// --- The element capability ---

/// A changelog record that can be serialized to XML.
pub trait Element {
    /// The XML tag; fixed per record kind.
    fn tag(&self) -> &str;

    /// Free text content. Empty by default.
    fn text(&self) -> &str {
        ""
    }

    /// Child records, in output order.
    fn children(&self) -> Vec<&dyn Element> {
        Vec::new()
    }

    /// Field names kept out of the attribute map.
    fn excluded_attrs(&self) -> Exclusions {
        Exclusions::BASE
    }

    /// Attribute candidates in declaration order.
    fn fields(&self) -> Vec<Field>;

    /// Builds this record's XML element. Only the document root carries the
    /// reserved namespace attributes; children are always built as non-root.
    fn to_xml(&self, is_document_root: bool) -> XmlElement {
        build_element(self, is_document_root)
    }
}

/// Returns the record's attributes: camelCase name -> formatted value, skipping
/// unset and excluded fields.
pub fn extract_attributes<E: Element + ?Sized>(record: &E) -> IndexMap<String, String> {
    let excluded = record.excluded_attrs();
    record
        .fields()
        .into_iter()
        .filter(|field| !excluded.contains(field.name))
        .filter_map(|field| {
            field
                .value
                .map(|value| (snake_to_camel(field.name), value.to_string()))
        })
        .collect()
}

/// Builds the element for `record` alone: tag, text and attributes, with the
/// reserved namespace block first when it is the document root. No children.
pub fn element_shell<E: Element + ?Sized>(record: &E, is_document_root: bool) -> XmlElement {
    let mut element = XmlElement::new(record.tag());
    element.text = record.text().to_string();
    if is_document_root {
        element.attributes.extend(
            ROOT_ATTRIBUTES
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );
    }
    for (key, value) in extract_attributes(record) {
        // The reserved root attributes keep their values.
        element.attributes.entry(key).or_insert(value);
    }
    element
}

/// Generic tree serializer: the record's shell plus every child, in order.
pub fn build_element<E: Element + ?Sized>(record: &E, is_document_root: bool) -> XmlElement {
    trace!("serializing <{}>", record.tag());
    let mut element = element_shell(record, is_document_root);
    for child in record.children() {
        element.push(child.to_xml(false));
    }
    element
}

/// Converts an underscore-separated name to camelCase.
///
/// Empty segments are dropped, so leading, trailing and doubled underscores
/// vanish. Every segment after the first is title-cased: a letter is
/// upper-cased when it does not follow another letter, lower-cased otherwise
/// (`v2name` becomes `V2Name`).
pub fn snake_to_camel(name: &str) -> String {
    let mut segments = name.split('_').filter(|s| !s.is_empty());
    let mut out = String::with_capacity(name.len());
    if let Some(first) = segments.next() {
        out.push_str(first);
    }
    for segment in segments {
        let mut after_letter = false;
        for c in segment.chars() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = c.is_alphabetic();
        }
    }
    out
}

// --- Declaration helpers ---

/// Declares an enum whose variants render as fixed attribute strings.
macro_rules! attr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// The string written to XML.
            pub const fn value(self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.value())
            }
        }

        impl From<$name> for $crate::element::AttrValue {
            fn from(v: $name) -> Self {
                $crate::element::AttrValue::Enum(v.value())
            }
        }
    };
}
pub(crate) use attr_enum;

/// Declares a closed set of child record kinds. The enum delegates the whole
/// `Element` capability, `to_xml` included, to the wrapped record.
macro_rules! element_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident($ty:ty) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant($ty) ),+
        }

        impl $crate::element::Element for $name {
            fn tag(&self) -> &str {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::tag(e) ),+
                }
            }

            fn text(&self) -> &str {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::text(e) ),+
                }
            }

            fn children(&self) -> Vec<&dyn $crate::element::Element> {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::children(e) ),+
                }
            }

            fn excluded_attrs(&self) -> $crate::element::Exclusions {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::excluded_attrs(e) ),+
                }
            }

            fn fields(&self) -> Vec<$crate::element::Field> {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::fields(e) ),+
                }
            }

            fn to_xml(&self, is_document_root: bool) -> $crate::xml::XmlElement {
                match self {
                    $( $name::$variant(e) => $crate::element::Element::to_xml(e, is_document_root) ),+
                }
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(e: $ty) -> Self {
                    $name::$variant(e)
                }
            }
        )+
    };
}
pub(crate) use element_enum;
