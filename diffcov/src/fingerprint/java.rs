//! Java front-end producing method fingerprints.
//!
//! Source is parsed with `tree-sitter-java` and the syntax tree is walked in
//! document order. The walk carries the enclosing type path down as a
//! [`Scope`]: top-level types start from the package, named nested and local
//! types append `$Name`, anonymous bodies (`new T(..) { .. }` and enum
//! constant bodies) append a file-wide `$N` assigned when the body is
//! reached. Constructor arguments are walked before the body they belong to.

use diffcov_core::MethodFingerprint;
use tracing::trace;
use tree_sitter::{Node, Parser};

use super::{content_hash, ParseError, SourceParser};

const LOG_TARGET: &str = "diffcov::fingerprint";

/// Built-in [`SourceParser`] for `.java` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaParser;

impl SourceParser for JavaParser {
    fn extension(&self) -> &str {
        "java"
    }

    fn fingerprints(&self, source: &str) -> Result<Vec<MethodFingerprint>, ParseError> {
        // tree_sitter::Parser is not Sync; one per call keeps the parser shareable.
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| ParseError::Language { message: e.to_string() })?;
        let tree = parser.parse(source, None).ok_or(ParseError::Cancelled)?;
        let root = tree.root_node();
        if let Some(bad) = first_error(root) {
            return Err(ParseError::Syntax { line: line_of(bad) });
        }

        let mut walker = Walker { source, package: None, next_anonymous: 1, methods: Vec::new() };
        walker.walk(root, None);
        Ok(walker.methods)
    }
}

/// The type whose members are being walked.
#[derive(Debug, Clone)]
struct Scope {
    path: String,
    anonymous: bool,
}

impl Scope {
    /// Named member or local type. Stays anonymous inside an anonymous body.
    fn nested(&self, name: &str) -> Scope {
        Scope { path: format!("{}${name}", self.path), anonymous: self.anonymous }
    }
}

struct Walker<'a> {
    source: &'a str,
    package: Option<String>,
    /// File-wide anonymous type counter, in encounter order.
    next_anonymous: u32,
    methods: Vec<MethodFingerprint>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn walk(&mut self, node: Node<'_>, scope: Option<&Scope>) {
        match node.kind() {
            "package_declaration" => {
                let name = named_children(node)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"));
                if let Some(name) = name {
                    let package: String = self.text(name).split_whitespace().collect();
                    self.package = Some(package);
                }
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => {
                let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
                    return;
                };
                let inner = match (scope, self.package.as_deref()) {
                    (Some(outer), _) => outer.nested(name),
                    (None, Some(pkg)) => Scope { path: format!("{pkg}.{name}"), anonymous: false },
                    (None, None) => Scope { path: name.to_owned(), anonymous: false },
                };
                trace!(target: LOG_TARGET, path = %inner.path, kind = node.kind(), "enter type");
                self.walk_children(node, Some(&inner));
            }
            "method_declaration"
            | "constructor_declaration"
            | "compact_constructor_declaration"
            | "annotation_type_element_declaration" => {
                if let Some(scope) = scope {
                    self.record_method(node, scope);
                }
                self.walk_children(node, scope);
            }
            "object_creation_expression" | "enum_constant" => self.anonymous_host(node, scope),
            _ => self.walk_children(node, scope),
        }
    }

    fn walk_children(&mut self, node: Node<'_>, scope: Option<&Scope>) {
        for child in named_children(node) {
            self.walk(child, scope);
        }
    }

    /// Walks an expression or enum constant that may carry an anonymous
    /// class body. Everything else in the node is walked first.
    fn anonymous_host(&mut self, node: Node<'_>, scope: Option<&Scope>) {
        let children = named_children(node);
        let (bodies, rest): (Vec<_>, Vec<_>) =
            children.into_iter().partition(|c| c.kind() == "class_body");
        for child in rest {
            self.walk(child, scope);
        }
        for body in bodies {
            let Some(outer) = scope else {
                self.walk(body, None);
                continue;
            };
            let anonymous = Scope {
                path: format!("{}${}", outer.path, self.next_anonymous),
                anonymous: true,
            };
            self.next_anonymous += 1;
            trace!(target: LOG_TARGET, path = %anonymous.path, "enter anonymous type");
            self.walk_children(body, Some(&anonymous));
        }
    }

    fn record_method(&mut self, node: Node<'_>, scope: &Scope) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let parameter_signatures = node
            .child_by_field_name("parameters")
            .map(|params| {
                named_children(params)
                    .into_iter()
                    .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
                    .map(|p| self.text(p).split_whitespace().collect::<Vec<_>>().join(" "))
                    .collect()
            })
            .unwrap_or_default();
        let method = MethodFingerprint {
            enclosing_class_path: scope.path.clone(),
            method_name: self.text(name).to_owned(),
            parameter_signatures,
            content_hash: content_hash(self.text(node)),
            is_anonymous_class: scope.anonymous,
        };
        self.methods.push(method);
    }
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Leftmost error or missing node, if the tree has any.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error).or(Some(node))
}

fn line_of(node: Node<'_>) -> u32 {
    u32::try_from(node.start_position().row + 1).unwrap_or(u32::MAX)
}
