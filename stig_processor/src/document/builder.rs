//! Test-data builder for XCCDF benchmark documents
//!
//! Produces documents shaped like DISA STIG releases, and a matching schema.

/// XSD covering the documents produced by [`BenchmarkBuilder`]
pub const SAMPLE_SCHEMA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns="http://checklists.nist.gov/xccdf/1.1"
           targetNamespace="http://checklists.nist.gov/xccdf/1.1"
           elementFormDefault="qualified">
  <xs:simpleType name="severityEnumType">
    <xs:restriction base="xs:NMTOKEN">
      <xs:enumeration value="unknown"/>
      <xs:enumeration value="info"/>
      <xs:enumeration value="low"/>
      <xs:enumeration value="medium"/>
      <xs:enumeration value="high"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:complexType name="statusType">
    <xs:simpleContent>
      <xs:extension base="xs:string">
        <xs:attribute name="date" type="xs:date"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="textWithIdType">
    <xs:simpleContent>
      <xs:extension base="xs:string">
        <xs:attribute name="id" type="xs:NCName" use="required"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="fixTextType">
    <xs:simpleContent>
      <xs:extension base="xs:string">
        <xs:attribute name="fixref" type="xs:NCName"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:complexType name="checkType">
    <xs:sequence>
      <xs:element name="check-content" type="xs:string"/>
    </xs:sequence>
    <xs:attribute name="system" type="xs:anyURI" use="required"/>
  </xs:complexType>
  <xs:complexType name="ruleType">
    <xs:sequence>
      <xs:element name="version" type="xs:string" minOccurs="0"/>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="description" type="xs:string"/>
      <xs:element name="fixtext" type="fixTextType"/>
      <xs:element name="check" type="checkType"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:NCName" use="required"/>
    <xs:attribute name="severity" type="severityEnumType" use="required"/>
    <xs:attribute name="weight" type="xs:decimal"/>
  </xs:complexType>
  <xs:complexType name="groupType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="description" type="xs:string" minOccurs="0"/>
      <xs:element name="Rule" type="ruleType"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:NCName" use="required"/>
  </xs:complexType>
  <xs:element name="Benchmark">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="status" type="statusType"/>
        <xs:element name="title" type="xs:string"/>
        <xs:element name="description" type="xs:string" minOccurs="0"/>
        <xs:element name="plain-text" type="textWithIdType" minOccurs="0" maxOccurs="unbounded"/>
        <xs:element name="version" type="xs:string"/>
        <xs:element name="Group" type="groupType" maxOccurs="unbounded"/>
        <xs:any minOccurs="0" maxOccurs="unbounded"/>
      </xs:sequence>
      <xs:attribute name="id" type="xs:NCName" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

/// Rule child elements a [`GroupBuilder`] can leave out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleElement {
    Title,
    Description,
    FixText,
    Check,
}

#[derive(Debug, Clone)]
pub struct GroupBuilder {
    id: String,
    group_title: String,
    rule_id: String,
    severity: String,
    rule_title: String,
    description: String,
    fix_text: String,
    check_content: String,
    omitted: Vec<RuleElement>,
}

impl GroupBuilder {
    /// Group `id` (e.g. `V-1000`) with rule id `SV-1000r1_rule`
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let number = id.trim_start_matches("V-").to_string();
        Self {
            group_title: format!("SRG-OS-{:0>6}-GPOS-00001", number),
            rule_id: format!("SV-{}r1_rule", number),
            severity: "medium".to_string(),
            rule_title: format!("Rule {}", id),
            description: String::new(),
            fix_text: String::new(),
            check_content: String::new(),
            omitted: Vec::new(),
            id,
        }
    }

    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = rule_id.into();
        self
    }

    pub fn rule_title(mut self, title: impl Into<String>) -> Self {
        self.rule_title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn fix_text(mut self, fix_text: impl Into<String>) -> Self {
        self.fix_text = fix_text.into();
        self
    }

    pub fn check_content(mut self, check_content: impl Into<String>) -> Self {
        self.check_content = check_content.into();
        self
    }

    pub fn without(mut self, element: RuleElement) -> Self {
        self.omitted.push(element);
        self
    }

    fn includes(&self, element: RuleElement) -> bool {
        !self.omitted.contains(&element)
    }

    fn render(&self, out: &mut String) {
        let number = self.id.trim_start_matches("V-");

        out.push_str(&format!("  <Group id=\"{}\">\n", escape(&self.id)));
        out.push_str(&format!("    <title>{}</title>\n", escape(&self.group_title)));
        out.push_str(
            "    <description>&lt;GroupDescription&gt;&lt;/GroupDescription&gt;</description>\n",
        );
        out.push_str(&format!(
            "    <Rule id=\"{}\" severity=\"{}\" weight=\"10.0\">\n",
            escape(&self.rule_id),
            escape(&self.severity)
        ));
        if self.includes(RuleElement::Title) {
            out.push_str(&format!("      <title>{}</title>\n", escape(&self.rule_title)));
        }
        if self.includes(RuleElement::Description) {
            let discussion = format!("<VulnDiscussion>{}</VulnDiscussion>", self.description);
            out.push_str(&format!(
                "      <description>{}</description>\n",
                escape(&discussion)
            ));
        }
        if self.includes(RuleElement::FixText) {
            out.push_str(&format!(
                "      <fixtext fixref=\"F-{}r1_fix\">{}</fixtext>\n",
                escape(number),
                escape(&self.fix_text)
            ));
        }
        if self.includes(RuleElement::Check) {
            out.push_str(&format!(
                "      <check system=\"C-{}r1_chk\">\n        <check-content>{}</check-content>\n      </check>\n",
                escape(number),
                escape(&self.check_content)
            ));
        }
        out.push_str("    </Rule>\n  </Group>\n");
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkBuilder {
    id: String,
    title: String,
    release: String,
    version: String,
    groups: Vec<GroupBuilder>,
}

impl BenchmarkBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: "Sample Security Technical Implementation Guide".to_string(),
            release: "Release: 1 Benchmark Date: 01 Jan 2024".to_string(),
            version: "1".to_string(),
            groups: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn group(mut self, group: GroupBuilder) -> Self {
        self.groups.push(group);
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        out.push_str(&format!(
            "<Benchmark xmlns=\"http://checklists.nist.gov/xccdf/1.1\" id=\"{}\" xml:lang=\"en\">\n",
            escape(&self.id)
        ));
        out.push_str("  <status date=\"2024-01-01\">accepted</status>\n");
        out.push_str(&format!("  <title>{}</title>\n", escape(&self.title)));
        out.push_str(&format!(
            "  <plain-text id=\"release-info\">{}</plain-text>\n",
            escape(&self.release)
        ));
        out.push_str(&format!("  <version>{}</version>\n", escape(&self.version)));
        for group in &self.groups {
            group.render(&mut out);
        }
        out.push_str("</Benchmark>\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, validate_collecting, Schema, ViolationKind};

    #[test]
    fn test_built_document_is_schema_valid() {
        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(GroupBuilder::new("V-1000").check_content("Value: 1 & <2>"))
            .group(GroupBuilder::new("V-1001").severity("high"))
            .build();

        assert!(validate(xml.as_str(), &schema).unwrap().is_valid());
    }

    #[test]
    fn test_omitted_element_is_reported() {
        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(GroupBuilder::new("V-1000").without(RuleElement::Check))
            .build();

        let result = validate_collecting(xml.as_str(), &schema).unwrap();
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::MissingElement);
        assert_eq!(result.violations[0].field, "check");
    }

    #[test]
    fn test_invalid_severity_is_reported() {
        let schema = Schema::parse(SAMPLE_SCHEMA).unwrap();
        let xml = BenchmarkBuilder::new("Sample_STIG")
            .group(GroupBuilder::new("V-1000").severity("urgent"))
            .build();

        let result = validate_collecting(xml.as_str(), &schema).unwrap();
        assert_eq!(result.violations[0].field, "@severity");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & \"b\" <c>"), "a &amp; &quot;b&quot; &lt;c&gt;");
    }
}
