//! Structural validation of a parsed document against a compiled schema

use super::error::SchemaError;
use super::handler::{SchemaViolation, ViolationHandler, ViolationKind};
use super::model::{
    line_of, ComplexType, Content, ElementDecl, ElementParticle, Group, Occurs, Particle,
    ResolvedType, Schema, TypeRef,
};
use roxmltree::Node;
use serde::Serialize;
use stig_core::config::compile_time::schema::MAX_ELEMENT_DEPTH;

/// Outcome of a validation run that was not aborted by its handler
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub root: String,
    pub elements_checked: usize,
    /// Violations retained by the handler (empty for a strict run that passed)
    pub violations: Vec<SchemaViolation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Walk `document` against `schema`, reporting each violation to `handler`
pub fn validate_document<H>(
    document: &roxmltree::Document,
    schema: &Schema,
    handler: &mut H,
) -> Result<ValidationResult, SchemaError>
where
    H: ViolationHandler + ?Sized,
{
    let root = document.root_element();
    let root_name = root.tag_name().name();
    let path = format!("/{}", root_name);

    let mut validator = Validator {
        schema,
        handler: &mut *handler,
        elements_checked: 0,
    };

    match schema.element(root_name) {
        Some(decl) => validator.validate_element(root, decl, &path, 1)?,
        None => validator.report(
            root,
            ViolationKind::RootMismatch,
            &path,
            root_name,
            format!(
                "root element is not declared; expected one of: {}",
                schema.global_element_names().join(", ")
            ),
        )?,
    }

    let elements_checked = validator.elements_checked;
    Ok(ValidationResult {
        root: root_name.to_string(),
        elements_checked,
        violations: handler.take_violations(),
    })
}

struct Validator<'s, 'h, H: ?Sized> {
    schema: &'s Schema,
    handler: &'h mut H,
    elements_checked: usize,
}

impl<'s, H: ViolationHandler + ?Sized> Validator<'s, '_, H> {
    fn report(
        &mut self,
        node: Node,
        kind: ViolationKind,
        path: &str,
        field: &str,
        message: String,
    ) -> Result<(), SchemaError> {
        self.handler.on_violation(SchemaViolation {
            kind,
            path: path.to_string(),
            field: field.to_string(),
            message,
            line: line_of(node),
        })
    }

    fn validate_element(
        &mut self,
        node: Node,
        decl: &'s ElementDecl,
        path: &str,
        depth: usize,
    ) -> Result<(), SchemaError> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(SchemaError::DepthExceeded {
                path: path.to_string(),
                max: MAX_ELEMENT_DEPTH,
            });
        }
        self.elements_checked += 1;

        match self.schema.resolve_type(&decl.type_ref)? {
            ResolvedType::Complex(complex) => self.validate_complex(node, complex, path, depth),
            ResolvedType::Simple(_) | ResolvedType::Builtin(_) => {
                self.reject_children(node, path)?;
                self.check_value(node, &decl.type_ref, &text_content(node), path, &decl.name)
            }
            ResolvedType::Any => Ok(()),
        }
    }

    fn validate_complex(
        &mut self,
        node: Node,
        complex: &'s ComplexType,
        path: &str,
        depth: usize,
    ) -> Result<(), SchemaError> {
        for attribute in &complex.attributes {
            let field = format!("@{}", attribute.name);
            match node.attributes().find(|a| a.name() == attribute.name) {
                Some(present) => {
                    self.check_value(node, &attribute.type_ref, present.value(), path, &field)?
                }
                None if attribute.required => self.report(
                    node,
                    ViolationKind::MissingAttribute,
                    path,
                    &field,
                    format!("required attribute '{}' is missing", attribute.name),
                )?,
                None => {}
            }
        }

        match &complex.content {
            Content::Empty => self.reject_children(node, path),
            Content::Simple(type_ref) => {
                self.reject_children(node, path)?;
                self.check_value(
                    node,
                    type_ref,
                    &text_content(node),
                    path,
                    node.tag_name().name(),
                )
            }
            Content::Elements(particle) => self.validate_children(node, particle, path, depth),
        }
    }

    fn validate_children(
        &mut self,
        node: Node,
        particle: &'s Particle,
        path: &str,
        depth: usize,
    ) -> Result<(), SchemaError> {
        let children: Vec<Node> = node.children().filter(Node::is_element).collect();
        let names: Vec<&str> = children.iter().map(|c| c.tag_name().name()).collect();

        let mut matcher = Matcher {
            schema: self.schema,
            names: &names,
            pos: 0,
            assigned: Vec::new(),
            findings: Vec::new(),
        };
        matcher.match_particle(particle)?;
        let Matcher {
            pos,
            assigned,
            findings,
            ..
        } = matcher;

        for finding in findings {
            match finding {
                Finding::Missing { at, expected } => {
                    let anchor = children.get(at).copied().unwrap_or(node);
                    let field = expected.join("|");
                    self.report(
                        anchor,
                        ViolationKind::MissingElement,
                        path,
                        &field,
                        format!("required element '{}' is missing", field),
                    )?;
                }
                Finding::TooMany { at, max } => {
                    let name = names[at];
                    self.report(
                        children[at],
                        ViolationKind::TooManyOccurrences,
                        &child_path(path, &names, at),
                        name,
                        format!("'{}' may appear at most {} time(s)", name, max),
                    )?;
                }
            }
        }

        for index in pos..children.len() {
            let name = names[index];
            let (kind, message) = if assigned.iter().any(|(_, decl)| decl.name == name) {
                (
                    ViolationKind::TooManyOccurrences,
                    format!("'{}' appears again after its allowed position", name),
                )
            } else if self.schema.declares(particle, name) {
                (
                    ViolationKind::OutOfOrder,
                    format!("'{}' is not allowed at this position", name),
                )
            } else {
                (
                    ViolationKind::UnexpectedElement,
                    format!("'{}' is not declared in '{}'", name, node.tag_name().name()),
                )
            };
            self.report(
                children[index],
                kind,
                &child_path(path, &names, index),
                name,
                message,
            )?;
        }

        for (index, decl) in assigned {
            self.validate_element(
                children[index],
                decl,
                &child_path(path, &names, index),
                depth + 1,
            )?;
        }

        Ok(())
    }

    fn reject_children(&mut self, node: Node, path: &str) -> Result<(), SchemaError> {
        let children: Vec<Node> = node.children().filter(Node::is_element).collect();
        let names: Vec<&str> = children.iter().map(|c| c.tag_name().name()).collect();

        for (index, child) in children.iter().enumerate() {
            self.report(
                *child,
                ViolationKind::UnexpectedElement,
                &child_path(path, &names, index),
                names[index],
                format!("'{}' does not allow child elements", node.tag_name().name()),
            )?;
        }
        Ok(())
    }

    fn check_value(
        &mut self,
        node: Node,
        type_ref: &TypeRef,
        value: &str,
        path: &str,
        field: &str,
    ) -> Result<(), SchemaError> {
        if self.schema.accepts_value(type_ref, value)? {
            return Ok(());
        }

        let allowed = self.schema.enumeration_of(type_ref);
        let message = if allowed.is_empty() {
            format!("value '{}' is not valid", value.trim())
        } else {
            format!(
                "value '{}' is not one of: {}",
                value.trim(),
                allowed.join(", ")
            )
        };
        self.report(node, ViolationKind::InvalidValue, path, field, message)
    }
}

fn text_content(node: Node) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// `parent/name`, with a 1-based index when the name repeats among siblings
fn child_path(parent: &str, names: &[&str], index: usize) -> String {
    let name = names[index];
    if names.iter().filter(|n| **n == name).count() > 1 {
        let ordinal = names[..=index].iter().filter(|n| **n == name).count();
        format!("{}/{}[{}]", parent, name, ordinal)
    } else {
        format!("{}/{}", parent, name)
    }
}

// ============================================================================
// CONTENT MODEL MATCHING
// ============================================================================

enum Finding {
    Missing { at: usize, expected: Vec<String> },
    TooMany { at: usize, max: u32 },
}

/// Greedy, non-backtracking match of child element names against a particle
struct Matcher<'s, 'n> {
    schema: &'s Schema,
    names: &'n [&'n str],
    pos: usize,
    assigned: Vec<(usize, &'s ElementDecl)>,
    findings: Vec<Finding>,
}

impl<'s, 'n> Matcher<'s, 'n> {
    fn current(&self) -> Option<&'n str> {
        self.names.get(self.pos).copied()
    }

    fn match_particle(&mut self, particle: &'s Particle) -> Result<(), SchemaError> {
        match particle {
            Particle::Element(element) => self.match_element(element),
            Particle::Sequence(group) => self.match_sequence(particle, group),
            Particle::Choice(group) => self.match_choice(group),
            Particle::All(group) => self.match_all(group),
            Particle::Any(occurs) => {
                self.match_any(*occurs);
                Ok(())
            }
        }
    }

    fn match_element(&mut self, element: &'s ElementParticle) -> Result<(), SchemaError> {
        let decl = self.schema.element_decl(element)?;
        let mut count = 0u32;

        while self.current() == Some(decl.name.as_str()) {
            if !element.occurs.allows_more_than(count) {
                self.findings.push(Finding::TooMany {
                    at: self.pos,
                    max: element.occurs.max.unwrap_or(0),
                });
            }
            self.assigned.push((self.pos, decl));
            self.pos += 1;
            count += 1;
        }

        if count < element.occurs.min {
            self.findings.push(Finding::Missing {
                at: self.pos,
                expected: vec![decl.name.clone()],
            });
        }
        Ok(())
    }

    fn match_sequence(&mut self, particle: &'s Particle, group: &'s Group) -> Result<(), SchemaError> {
        let mut repetitions = 0u32;

        while group.occurs.allows_more_than(repetitions) {
            if repetitions >= group.occurs.min {
                match self.current() {
                    Some(name) if self.schema.can_start_with(particle, name) => {}
                    _ => break,
                }
            }

            let before = self.pos;
            for child in &group.particles {
                self.match_particle(child)?;
            }
            repetitions += 1;

            if self.pos == before {
                break;
            }
        }
        Ok(())
    }

    fn match_choice(&mut self, group: &'s Group) -> Result<(), SchemaError> {
        let schema = self.schema;
        let mut repetitions = 0u32;

        while group.occurs.allows_more_than(repetitions) {
            let Some(name) = self.current() else {
                break;
            };
            let Some(alternative) = group
                .particles
                .iter()
                .find(|p| schema.can_start_with(p, name))
            else {
                break;
            };

            let before = self.pos;
            self.match_particle(alternative)?;
            repetitions += 1;

            if self.pos == before {
                break;
            }
        }

        if repetitions < group.occurs.min && !group.particles.iter().any(|p| schema.is_nullable(p))
        {
            self.findings.push(Finding::Missing {
                at: self.pos,
                expected: group
                    .particles
                    .iter()
                    .flat_map(|p| schema.expected_names(p))
                    .collect(),
            });
        }
        Ok(())
    }

    fn match_all(&mut self, group: &'s Group) -> Result<(), SchemaError> {
        let schema = self.schema;
        let mut seen = vec![false; group.particles.len()];

        while let Some(name) = self.current() {
            let mut slot = None;
            for (index, particle) in group.particles.iter().enumerate() {
                if let Particle::Element(element) = particle {
                    let decl = schema.element_decl(element)?;
                    if !seen[index] && decl.name == name {
                        slot = Some((index, decl));
                        break;
                    }
                }
            }

            let Some((index, decl)) = slot else {
                break;
            };
            seen[index] = true;
            self.assigned.push((self.pos, decl));
            self.pos += 1;
        }

        if group.occurs.min > 0 {
            for (index, particle) in group.particles.iter().enumerate() {
                if !seen[index] && !schema.is_nullable(particle) {
                    self.findings.push(Finding::Missing {
                        at: self.pos,
                        expected: schema.expected_names(particle),
                    });
                }
            }
        }
        Ok(())
    }

    fn match_any(&mut self, occurs: Occurs) {
        let mut count = 0u32;
        while self.current().is_some() && occurs.allows_more_than(count) {
            self.pos += 1;
            count += 1;
        }

        if count < occurs.min {
            self.findings.push(Finding::Missing {
                at: self.pos,
                expected: vec!["*".to_string()],
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::handler::{CollectingHandler, StrictHandler};
    use assert_matches::assert_matches;

    const XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="severityType">
    <xs:restriction base="xs:string">
      <xs:enumeration value="high"/>
      <xs:enumeration value="medium"/>
      <xs:enumeration value="low"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:complexType name="ruleType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="description" type="xs:string"/>
      <xs:choice>
        <xs:element name="fixtext" type="xs:string"/>
        <xs:element name="fix" type="xs:string"/>
      </xs:choice>
      <xs:element name="check" minOccurs="0">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="check-content" type="xs:string"/>
          </xs:sequence>
          <xs:attribute name="system" type="xs:anyURI" use="required"/>
        </xs:complexType>
      </xs:element>
    </xs:sequence>
    <xs:attribute name="id" type="xs:string" use="required"/>
    <xs:attribute name="severity" type="severityType" use="required"/>
  </xs:complexType>
  <xs:complexType name="groupType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="Rule" type="ruleType"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:string" use="required"/>
  </xs:complexType>
  <xs:element name="Benchmark">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="title" type="xs:string"/>
        <xs:element name="version">
          <xs:complexType>
            <xs:simpleContent>
              <xs:extension base="xs:string">
                <xs:attribute name="update" type="xs:anyURI"/>
              </xs:extension>
            </xs:simpleContent>
          </xs:complexType>
        </xs:element>
        <xs:element name="Group" type="groupType" maxOccurs="unbounded"/>
        <xs:any minOccurs="0" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="id" type="xs:string" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn group(id: &str, rule_body: &str) -> String {
        format!(
            r#"<Group id="{id}"><title>SRG-OS-000001</title><Rule id="SV-{id}r1_rule" severity="medium">{rule_body}</Rule></Group>"#
        )
    }

    const RULE: &str = "<title>Audit logon events</title><description>d</description><fixtext>Configure it.</fixtext><check system=\"C-1\"><check-content>Verify it.</check-content></check>";

    fn benchmark(groups: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<Benchmark id=\"Windows_Server_2019\">\n<title>Windows Server 2019</title>\n<version>1</version>\n{}\n</Benchmark>",
            groups.join("\n")
        )
    }

    fn collect(xml: &str) -> ValidationResult {
        let schema = Schema::parse(XSD).unwrap();
        let document = roxmltree::Document::parse(xml).unwrap();
        validate_document(&document, &schema, &mut CollectingHandler::new()).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let xml = benchmark(&[group("V-1000", RULE), group("V-1001", RULE)]);
        let result = collect(&xml);

        assert!(result.is_valid(), "{:?}", result.violations);
        assert_eq!(result.root, "Benchmark");
        assert!(result.elements_checked > 10);
    }

    #[test]
    fn test_missing_required_element_names_field() {
        let rule = "<title>t</title><fixtext>f</fixtext>";
        let xml = benchmark(&[group("V-1000", rule)]);
        let result = collect(&xml);

        let missing = result
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::MissingElement)
            .unwrap();
        assert_eq!(missing.field, "description");
        assert_eq!(missing.path, "/Benchmark/Group/Rule");
        assert_eq!(missing.line, 5);
    }

    #[test]
    fn test_choice_missing_lists_alternatives() {
        let rule = "<title>t</title><description>d</description>";
        let result = collect(&benchmark(&[group("V-1000", rule)]));

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].field, "fixtext|fix");
    }

    #[test]
    fn test_unexpected_and_out_of_order() {
        let rule = "<description>d</description><title>t</title><fixtext>f</fixtext><severity>x</severity>";
        let result = collect(&benchmark(&[group("V-1000", rule)]));
        let kinds: Vec<_> = result.violations.iter().map(|v| v.kind).collect();

        assert!(kinds.contains(&ViolationKind::MissingElement));
        assert!(kinds.contains(&ViolationKind::OutOfOrder) || kinds.contains(&ViolationKind::TooManyOccurrences));
    }

    #[test]
    fn test_unknown_element_is_unexpected() {
        let rule = format!("{}<extra/>", RULE);
        let result = collect(&benchmark(&[group("V-1000", &rule)]));

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::UnexpectedElement);
        assert_eq!(result.violations[0].path, "/Benchmark/Group/Rule/extra");
    }

    #[test]
    fn test_too_many_occurrences() {
        let rule = format!("<title>a</title>{}", RULE);
        let result = collect(&benchmark(&[group("V-1000", &rule)]));

        let too_many = result
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::TooManyOccurrences)
            .unwrap();
        assert_eq!(too_many.field, "title");
        assert_eq!(too_many.path, "/Benchmark/Group/Rule/title[2]");
    }

    #[test]
    fn test_attribute_checks() {
        let xml = benchmark(&[
            r#"<Group><title>t</title><Rule id="r" severity="critical"><title>t</title><description>d</description><fix>f</fix></Rule></Group>"#.to_string(),
        ]);
        let result = collect(&xml);

        assert_matches!(
            result.violations.as_slice(),
            [missing, invalid] if missing.kind == ViolationKind::MissingAttribute
                && missing.field == "@id"
                && invalid.kind == ViolationKind::InvalidValue
                && invalid.field == "@severity"
                && invalid.message.contains("high, medium, low")
        );
    }

    #[test]
    fn test_repeated_groups_are_indexed() {
        let bad = "<title>t</title>";
        let xml = benchmark(&[group("V-1000", RULE), group("V-1001", bad)]);
        let result = collect(&xml);

        assert_eq!(result.violations.len(), 2);
        assert!(result
            .violations
            .iter()
            .all(|v| v.path.starts_with("/Benchmark/Group[2]/Rule")));
    }

    #[test]
    fn test_root_mismatch() {
        let result = collect("<Checklist/>");
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::RootMismatch);
        assert_eq!(result.violations[0].field, "Checklist");
    }

    #[test]
    fn test_strict_stops_at_first() {
        let schema = Schema::parse(XSD).unwrap();
        let xml = benchmark(&[group("V-1000", "<title>t</title>")]);
        let document = roxmltree::Document::parse(&xml).unwrap();

        let result = validate_document(&document, &schema, &mut StrictHandler);
        assert_matches!(result, Err(SchemaError::Violation(v)) if v.field == "description");
    }

    #[test]
    fn test_trailing_any_accepts_extensions() {
        let xml = benchmark(&[group("V-1000", RULE)]).replace(
            "</Benchmark>",
            "<Profile id=\"MAC-1_Classified\"/></Benchmark>",
        );
        assert!(collect(&xml).is_valid());
    }

    #[test]
    fn test_child_path() {
        let names = ["title", "Group", "Group"];
        assert_eq!(child_path("/Benchmark", &names, 0), "/Benchmark/title");
        assert_eq!(child_path("/Benchmark", &names, 2), "/Benchmark/Group[2]");
    }
}
