//! Extract benchmark fields from a validated XCCDF document

use super::error::DocumentError;
use super::types::{BenchmarkDocument, BenchmarkMetadata, RawRule, RuleGroup, Severity};
use crate::schema::line_of;
use regex::Regex;
use roxmltree::Node;
use std::sync::OnceLock;

static VULN_DISCUSSION: OnceLock<Regex> = OnceLock::new();

fn vuln_discussion() -> &'static Regex {
    VULN_DISCUSSION.get_or_init(|| {
        Regex::new(r"(?s)<VulnDiscussion>(.*?)</VulnDiscussion>")
            .expect("discussion pattern is valid")
    })
}

/// Read metadata and rule groups from a parsed benchmark.
///
/// Groups are XCCDF `Group` elements, at any depth, that own a `Rule`.
pub fn parse_benchmark(document: &roxmltree::Document) -> Result<BenchmarkDocument, DocumentError> {
    let root = document.root_element();
    if root.tag_name().name() != "Benchmark" {
        return Err(DocumentError::NotABenchmark {
            root: root.tag_name().name().to_string(),
        });
    }

    let metadata = BenchmarkMetadata {
        identifier: root.attribute("id").unwrap_or_default().to_string(),
        title: child_text(root, "title").unwrap_or_default(),
        release_label: root
            .children()
            .find(|n| {
                n.is_element()
                    && n.tag_name().name() == "plain-text"
                    && n.attribute("id") == Some("release-info")
            })
            .map(element_text)
            .unwrap_or_default(),
        version: child_text(root, "version").unwrap_or_default(),
    };

    let groups = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Group")
        .filter_map(|group| child(group, "Rule").map(|rule| (group, rule)))
        .map(|(group, rule)| parse_group(group, rule))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BenchmarkDocument {
        path: None,
        metadata,
        groups,
    })
}

fn parse_group(group: Node, rule: Node) -> Result<RuleGroup, DocumentError> {
    let id = required_attribute(group, "id", "Group", "id")?;
    let context = format!("Group {}", id);

    let severity_text = required_attribute(rule, "severity", &context, "severity")?;
    let severity: Severity = severity_text
        .parse()
        .map_err(|value| DocumentError::InvalidSeverity {
            context: context.clone(),
            value,
            line: line_of(rule),
        })?;

    let rule_id = required_attribute(rule, "id", &context, "rule id")?;
    let title = child_text(rule, "title").ok_or_else(|| DocumentError::MissingField {
        context: context.clone(),
        field: "rule title",
        line: line_of(rule),
    })?;

    let raw = RawRule::new(rule_id, title, severity)
        .with_description(
            child_text(rule, "description")
                .map(|text| discussion_text(&text))
                .unwrap_or_default(),
        )
        .with_fix_text(child_text(rule, "fixtext").unwrap_or_default())
        .with_check_content(
            child(rule, "check")
                .and_then(|check| child_text(check, "check-content"))
                .unwrap_or_default(),
        );

    Ok(RuleGroup {
        title: child_text(group, "title").unwrap_or_default(),
        id,
        rule: raw,
        line: line_of(group),
    })
}

/// Rule descriptions embed escaped markup; keep the VulnDiscussion part when present
fn discussion_text(description: &str) -> String {
    match vuln_discussion().captures(description) {
        Some(captures) => captures[1].trim().to_string(),
        None => description.trim().to_string(),
    }
}

fn required_attribute(
    node: Node,
    name: &str,
    context: &str,
    field: &'static str,
) -> Result<String, DocumentError> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| DocumentError::MissingField {
            context: context.to_string(),
            field,
            line: line_of(node),
        })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name).map(element_text)
}

fn element_text(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
