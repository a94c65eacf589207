//! Method fingerprinting: one revision's source text in, an ordered list of
//! [`MethodFingerprint`]s out.
//!
//! The parser is reached through the [`SourceParser`] trait so a front-end
//! for another language can be plugged into the scanner. [`JavaParser`] is
//! the built-in implementation.

mod java;

use std::collections::HashSet;

use diffcov_core::{DiffError, MethodFingerprint};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use java::JavaParser;

/// Failure to turn source text into declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error on line {line}")]
    Syntax { line: u32 },

    #[error("grammar could not be loaded: {message}")]
    Language { message: String },

    #[error("parse was cancelled")]
    Cancelled,
}

impl ParseError {
    /// Attaches the file path, producing the crate-wide error.
    pub fn into_diff_error(self, path: &str) -> DiffError {
        DiffError::parse(path, self.to_string())
    }
}

/// Parses source text into method fingerprints in declaration order.
pub trait SourceParser: Send + Sync {
    /// File extension (without dot) this parser understands.
    fn extension(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`ParseError`] on malformed input.
    fn fingerprints(&self, source: &str) -> Result<Vec<MethodFingerprint>, ParseError>;
}

/// Hex SHA-256 of a method's text with line endings normalized.
///
/// Any textual edit, whitespace and comments included, changes the hash.
pub fn content_hash(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let digest = Sha256::digest(normalized.trim().as_bytes());
    format!("{digest:x}")
}

/// Selects the methods of the new revision that did not exist, byte for byte,
/// in the old revision.
///
/// With no old fingerprints (a new file) every new method is changed.
pub fn changed_methods(
    old: &[MethodFingerprint],
    new: Vec<MethodFingerprint>,
) -> Vec<MethodFingerprint> {
    if old.is_empty() {
        return new;
    }
    let old_hashes: HashSet<&str> = old.iter().map(|m| m.content_hash.as_str()).collect();
    new.into_iter()
        .filter(|m| !old_hashes.contains(m.content_hash.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(name: &str, hash: &str) -> MethodFingerprint {
        MethodFingerprint {
            enclosing_class_path: "org.acme.Foo".to_owned(),
            method_name: name.to_owned(),
            parameter_signatures: Vec::new(),
            content_hash: hash.to_owned(),
            is_anonymous_class: false,
        }
    }

    fn names(methods: &[MethodFingerprint]) -> Vec<&str> {
        methods.iter().map(|m| m.method_name.as_str()).collect()
    }

    #[test]
    fn only_new_hashes_are_changed() {
        let old = vec![fp("A", "x"), fp("B", "y")];
        let new = vec![fp("A", "x"), fp("B", "z"), fp("C", "w")];
        assert_eq!(names(&changed_methods(&old, new)), ["B", "C"]);
    }

    #[test]
    fn new_file_changes_everything() {
        let new = vec![fp("A", "x"), fp("B", "y")];
        assert_eq!(changed_methods(&[], new.clone()), new);
    }

    #[test]
    fn moved_method_is_unchanged() {
        let old = vec![fp("A", "x"), fp("B", "y")];
        let new = vec![fp("B", "y"), fp("A", "x")];
        assert!(changed_methods(&old, new).is_empty());
    }

    #[test]
    fn hash_ignores_line_ending_style_only() {
        assert_eq!(content_hash("void a() {\r\n}\r\n"), content_hash("void a() {\n}"));
        assert_ne!(content_hash("void a() {\n}"), content_hash("void a() {  \n}"));
        assert_eq!(content_hash("x").len(), 64);
    }
}
