// crates/liquichange/src/builder.rs

//! Writes a `Changelog` out as an XML document string or file.
//!
//! The changelog is validated as a whole first, so an invalid record aborts
//! the write before any output exists.

use crate::changelog::Changelog;
use crate::config::WriteOptions;
use crate::error::ChangelogError;
use crate::xml::write_element;
use log::debug;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};
use std::fs;
use std::path::Path;

/// Serializes a `Changelog` into a complete XML document.
///
/// # Errors
/// Returns a `ChangelogError` if any record fails validation or the writer fails.
pub fn save_changelog_to_string(
    changelog: &Changelog,
    options: &WriteOptions,
) -> Result<String, ChangelogError> {
    // 1. Validate the whole tree before producing any output
    changelog.validate()?;

    // 2. Build the element tree
    let document = changelog.to_document();

    // 3. Render
    let mut writer = match options.indent {
        Some(indent) => Writer::new_with_indent(Vec::new(), indent.char, indent.size),
        None => Writer::new(Vec::new()),
    };
    if options.xml_declaration {
        writer.write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some(options.encoding.label()),
            None,
        )))?;
    }
    write_element(&mut writer, &document)?;

    let rendered = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    debug!(
        "rendered changelog: {} changesets, {} elements, {} bytes",
        changelog.count_changesets(),
        document.node_count(),
        rendered.len()
    );

    // 4. Apply the output encoding
    Ok(options.encoding.apply(&rendered).into_owned())
}

/// Writes a `Changelog` document to `path`, replacing any existing file.
///
/// # Errors
/// Returns a `ChangelogError` on validation failure or I/O error. Nothing is
/// written when validation fails.
pub fn save_changelog_to_file(
    changelog: &Changelog,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<(), ChangelogError> {
    let xml = save_changelog_to_string(changelog, options)?;
    fs::write(path.as_ref(), xml)?;
    debug!("wrote changelog to {}", path.as_ref().display());
    Ok(())
}
