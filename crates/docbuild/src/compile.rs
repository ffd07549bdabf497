/*
 * compile.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! YAML template compiler.
//!
//! A template file is a YAML list of directives, evaluated in order:
//!
//! ```yaml
//! - attributes: [id, {name: full_name}]
//! - attribute: email
//!   if: public_email
//! - node: avatar
//!   helper: avatar_url
//! - node: version
//!   value: 2
//! - merge: timestamps        # helper whose document merges at the root
//! - child: posts             # member of the object, or `@posts` from scope
//!   as: articles
//!   object_root: false
//!   template:
//!     - attribute: title
//! - glue: self
//!   template:
//!     - attribute: city
//! - extends: users/base
//!   object: self
//!   template:
//!     - attribute: nickname
//! ```
//!
//! Selector strings: `self` is the current object, `@name` a scope
//! variable, anything else a member of the current object. Conditions
//! (`if`/`unless`) are booleans or member names.

use crate::config::RootSetting;
use crate::directive::{
    Attribute, Child, Compute, Condition, Directive, Extends, Glue, Guard, Node, Selector,
};
use crate::error::{BuildError, BuildResult};
use crate::template::Template;
use docbuild_document::Value;
use indexmap::IndexMap;
use serde::Deserialize;

/// Compile template source text.
///
/// `name` is used for error messages and recorded on the template.
pub fn compile(name: &str, source: &str) -> BuildResult<Template> {
    // An empty file is an empty template, not a YAML error.
    let entries: Vec<RawDirective> = if source.trim().is_empty() {
        Vec::new()
    } else {
        serde_yaml::from_str(source).map_err(|err| BuildError::TemplateSyntax {
            name: name.to_string(),
            message: err.to_string(),
        })?
    };
    let directives = compile_list(name, entries)?;
    tracing::debug!(template = name, directives = directives.len(), "compiled template");
    Ok(Template::from_source(
        Some(name.to_string()),
        source,
        directives,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttributeEntry {
    Plain(String),
    Aliased(IndexMap<String, String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Literal(bool),
    Member(String),
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw {
            RawCondition::Literal(outcome) => Condition::Always(outcome),
            RawCondition::Member(name) => Condition::MemberName(name),
        }
    }
}

/// One YAML directive entry. Exactly one of the directive keys must be
/// set; the rest are options.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDirective {
    attribute: Option<String>,
    attributes: Option<Vec<AttributeEntry>>,
    node: Option<String>,
    merge: Option<String>,
    child: Option<String>,
    glue: Option<String>,
    extends: Option<String>,

    #[serde(rename = "as")]
    alias: Option<String>,
    #[serde(rename = "if")]
    when: Option<RawCondition>,
    unless: Option<RawCondition>,
    helper: Option<String>,
    value: Option<serde_json::Value>,
    object_root: Option<RootSetting>,
    object: Option<String>,
    template: Option<Vec<RawDirective>>,
}

impl RawDirective {
    fn kind(&self) -> Result<&'static str, String> {
        let kinds: Vec<&'static str> = [
            ("attribute", self.attribute.is_some()),
            ("attributes", self.attributes.is_some()),
            ("node", self.node.is_some()),
            ("merge", self.merge.is_some()),
            ("child", self.child.is_some()),
            ("glue", self.glue.is_some()),
            ("extends", self.extends.is_some()),
        ]
        .into_iter()
        .filter_map(|(kind, present)| present.then_some(kind))
        .collect();
        match kinds.as_slice() {
            [kind] => Ok(*kind),
            [] => Err("entry has no directive key".to_string()),
            many => Err(format!("entry mixes directives: {}", many.join(", "))),
        }
    }

    /// Reject options that do not apply to `kind`.
    fn check_options(&self, kind: &str) -> Result<(), String> {
        let allowed: &[&str] = match kind {
            "attribute" => &["as", "if", "unless"],
            "attributes" => &[],
            "node" => &["helper", "value", "if", "unless"],
            "merge" => &["if", "unless"],
            "child" => &["as", "if", "unless", "object_root", "template"],
            "glue" => &["if", "unless", "template"],
            _ => &["if", "unless", "object", "template"],
        };
        let present = [
            ("as", self.alias.is_some()),
            ("if", self.when.is_some()),
            ("unless", self.unless.is_some()),
            ("helper", self.helper.is_some()),
            ("value", self.value.is_some()),
            ("object_root", self.object_root.is_some()),
            ("object", self.object.is_some()),
            ("template", self.template.is_some()),
        ];
        match present
            .iter()
            .find(|(option, set)| *set && !allowed.contains(option))
        {
            Some((option, _)) => Err(format!("`{option}` is not valid on `{kind}`")),
            None => Ok(()),
        }
    }

    fn guard(&mut self) -> Guard {
        Guard {
            when: self.when.take().map(Condition::from),
            unless: self.unless.take().map(Condition::from),
        }
    }
}

fn compile_list(name: &str, entries: Vec<RawDirective>) -> BuildResult<Vec<Directive>> {
    let mut directives = Vec::with_capacity(entries.len());
    for (index, raw) in entries.into_iter().enumerate() {
        compile_entry(name, raw, &mut directives).map_err(|message| BuildError::TemplateSyntax {
            name: name.to_string(),
            message: format!("directive {}: {message}", index + 1),
        })?;
    }
    Ok(directives)
}

fn compile_body(name: &str, body: Option<Vec<RawDirective>>) -> Result<Template, String> {
    compile_list(name, body.unwrap_or_default())
        .map(Template::new)
        .map_err(|err| match err {
            BuildError::TemplateSyntax { message, .. } => message,
            other => other.to_string(),
        })
}

fn compile_entry(
    name: &str,
    mut raw: RawDirective,
    out: &mut Vec<Directive>,
) -> Result<(), String> {
    let kind = raw.kind()?;
    raw.check_options(kind)?;
    let guard = raw.guard();

    match kind {
        "attribute" => {
            let mut attribute = Attribute::new(raw.attribute.unwrap_or_default()).guard(guard);
            attribute.alias = raw.alias;
            out.push(Directive::Attribute(attribute));
        }
        "attributes" => {
            for entry in raw.attributes.unwrap_or_default() {
                match entry {
                    AttributeEntry::Plain(member) => {
                        out.push(Directive::Attribute(Attribute::new(member)));
                    }
                    AttributeEntry::Aliased(map) => {
                        out.extend(map.into_iter().map(|(member, alias)| {
                            Directive::Attribute(Attribute::new(member).alias(alias))
                        }));
                    }
                }
            }
        }
        "node" => {
            let compute = match (raw.helper, raw.value) {
                (Some(helper), None) => Compute::Helper(helper),
                (None, Some(value)) => Compute::Value(Value::from(value)),
                (Some(_), Some(_)) => return Err("`node` takes `helper` or `value`, not both".to_string()),
                // A bare node is computed by the helper of the same name.
                (None, None) => Compute::Helper(raw.node.clone().unwrap_or_default()),
            };
            out.push(Directive::Node(Node {
                name: raw.node,
                guard,
                compute,
            }));
        }
        "merge" => {
            out.push(Directive::Node(Node {
                name: None,
                guard,
                compute: Compute::Helper(raw.merge.unwrap_or_default()),
            }));
        }
        "child" => {
            let selector = named(parse_selector(&raw.child.unwrap_or_default()), raw.alias);
            out.push(Directive::Child(Child {
                selector,
                object_root: raw.object_root,
                guard,
                template: compile_body(name, raw.template)?,
            }));
        }
        "glue" => {
            let selector = parse_selector(&raw.glue.unwrap_or_default());
            out.push(Directive::Glue(Glue {
                selector,
                guard,
                template: compile_body(name, raw.template)?,
            }));
        }
        _ => {
            out.push(Directive::Extends(Extends {
                template: raw.extends.unwrap_or_default(),
                object: raw.object.as_deref().map(parse_selector),
                guard,
                extra: compile_body(name, raw.template)?,
            }));
        }
    }
    Ok(())
}

/// Parse a selector string: `self`, `@variable` or a member name.
pub fn parse_selector(text: &str) -> Selector {
    match text {
        "self" => Selector::Current,
        _ => match text.strip_prefix('@') {
            Some(variable) => Selector::variable(variable),
            None => Selector::member(text),
        },
    }
}

fn named(selector: Selector, alias: Option<String>) -> Selector {
    match alias {
        Some(alias) => selector.named(alias),
        None => selector,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(template: &Template) -> Vec<&'static str> {
        template.directives().iter().map(Directive::kind).collect()
    }

    #[test]
    fn test_compile_all_directive_kinds() {
        let template = compile(
            "users/show",
            r#"
- attributes: [id, {name: full_name}]
- attribute: email
  if: public_email
- node: avatar
  helper: avatar_url
- merge: timestamps
- child: posts
  as: articles
  template:
    - attribute: title
- glue: self
  template:
    - attribute: city
- extends: users/base
"#,
        )
        .unwrap();

        assert_eq!(
            kinds(&template),
            vec!["attribute", "attribute", "attribute", "node", "node", "child", "glue", "extends"]
        );
        assert_eq!(template.name(), Some("users/show"));

        let Directive::Attribute(aliased) = &template.directives()[1] else {
            panic!("expected attribute");
        };
        assert_eq!(aliased.key(), "full_name");

        let Directive::Child(child) = &template.directives()[5] else {
            panic!("expected child");
        };
        assert_eq!(child.selector.override_name(), Some("articles"));
        assert_eq!(child.selector.token(), Some("posts"));
        assert_eq!(child.template.directives().len(), 1);
    }

    #[test]
    fn test_selector_strings() {
        assert_eq!(parse_selector("self"), Selector::Current);
        assert_eq!(parse_selector("@posts"), Selector::variable("posts"));
        assert_eq!(parse_selector("posts"), Selector::member("posts"));
    }

    #[test]
    fn test_empty_source_is_empty_template() {
        assert!(compile("empty", "").unwrap().is_empty());
        assert!(compile("empty", "[]").unwrap().is_empty());
    }

    #[test]
    fn test_digest_follows_source() {
        let a = compile("a", "- attribute: name\n").unwrap();
        let b = compile("b", "- attribute: name\n").unwrap();
        let c = compile("c", "- attribute: city\n").unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    fn child_digest(source: &str) -> String {
        let template = compile("posts", source).unwrap();
        match &template.directives()[0] {
            Directive::Child(child) => child.template.digest().to_string(),
            other => panic!("expected child, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_node_digest_is_stable() {
        let source = "- child: meta\n  template:\n    - node: version\n      value: 2\n";
        assert_eq!(child_digest(source), child_digest(source));
        assert_ne!(
            child_digest(source),
            child_digest("- child: meta\n  template:\n    - node: version\n      value: 3\n")
        );
    }

    #[test]
    fn test_literal_node_value() {
        let template = compile("t", "- node: version\n  value: 2\n").unwrap();
        match &template.directives()[0] {
            Directive::Node(node) => {
                assert!(matches!(&node.compute, Compute::Value(Value::Integer(2))));
            }
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_directive_rejected() {
        let err = compile("bad", "- attribute: name\n  child: posts\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid template bad: directive 1: entry mixes directives: attribute, child"
        );
    }

    #[test]
    fn test_option_on_wrong_directive_rejected() {
        let err = compile("bad", "- attribute: name\n  template: []\n").unwrap_err();
        assert!(err.to_string().contains("`template` is not valid on `attribute`"));
    }

    #[test]
    fn test_glue_rejects_alias() {
        let err = compile("bad", "- glue: self\n  as: extra\n  template: []\n").unwrap_err();
        assert!(err.to_string().contains("`as` is not valid on `glue`"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = compile("bad", "- atribute: name\n").unwrap_err();
        assert!(matches!(err, BuildError::TemplateSyntax { .. }));
    }

    #[test]
    fn test_nested_errors_report_position() {
        let err = compile(
            "bad",
            "- attribute: id\n- child: posts\n  template:\n    - {}\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("directive 2: directive 1: entry has no directive key"));
    }

    #[test]
    fn test_object_root_forms() {
        let template = compile(
            "roots",
            "- child: posts\n  object_root: post\n- child: tags\n  object_root: false\n",
        )
        .unwrap();
        let roots: Vec<Option<RootSetting>> = template
            .directives()
            .iter()
            .map(|directive| match directive {
                Directive::Child(child) => child.object_root.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            roots,
            vec![Some(RootSetting::Named("post".to_string())), Some(RootSetting::Enabled(false))]
        );
    }
}
