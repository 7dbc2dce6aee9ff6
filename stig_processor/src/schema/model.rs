//! Compiled XSD model
//!
//! Understood: elements, complex and simple types, sequence/choice/all/any
//! particles, named model and attribute groups, `simpleContent` and
//! `complexContent` derivation, attributes and enumerations. Anything else that
//! shapes a content model is rejected when the schema compiles. Declarations from
//! imported namespaces are not available, so references into them accept any
//! content. Names are compared by local name.

use super::error::SchemaError;
use roxmltree::Node;
use std::collections::{BTreeMap, BTreeSet};
use stig_core::config::compile_time::schema::MAX_TYPE_RESOLUTION_DEPTH;

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

const BUILTIN_TYPES: &[&str] = &[
    "string", "normalizedString", "token", "language", "Name", "NCName", "NMTOKEN",
    "NMTOKENS", "ID", "IDREF", "IDREFS", "anyURI", "QName", "boolean", "decimal",
    "integer", "int", "long", "short", "byte", "nonNegativeInteger", "positiveInteger",
    "nonPositiveInteger", "negativeInteger", "unsignedLong", "unsignedInt",
    "unsignedShort", "unsignedByte", "float", "double", "date", "dateTime", "time",
    "duration", "gYear", "base64Binary", "hexBinary", "anySimpleType",
];

/// minOccurs / maxOccurs pair; `max == None` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: Option<u32>,
}

impl Occurs {
    pub fn allows_more_than(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count < max)
    }

    fn from_node(node: Node) -> Result<Self, SchemaError> {
        let min = match node.attribute("minOccurs") {
            Some(value) => parse_occurs(value, "minOccurs")?,
            None => 1,
        };
        let max = match node.attribute("maxOccurs") {
            Some("unbounded") => None,
            Some(value) => Some(parse_occurs(value, "maxOccurs")?),
            None => Some(1),
        };
        Ok(Self { min, max })
    }
}

fn parse_occurs(value: &str, attribute: &str) -> Result<u32, SchemaError> {
    value.trim().parse().map_err(|_| SchemaError::SchemaParse {
        message: format!("invalid {} value '{}'", attribute, value),
    })
}

/// Reference to the type of an element or attribute
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Named type declared in the schema
    Named(String),
    /// Built-in `xs:*` simple type, by local name
    Builtin(String),
    Complex(Box<ComplexType>),
    Simple(SimpleType),
    /// `xs:anyType` or an element with no type at all
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: String,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementSource {
    Local(ElementDecl),
    /// `ref=` to a global element
    Ref(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementParticle {
    pub source: ElementSource,
    pub occurs: Occurs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub particles: Vec<Particle>,
    pub occurs: Occurs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    Element(ElementParticle),
    Sequence(Group),
    Choice(Group),
    All(Group),
    Any(Occurs),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// No child elements (text allowed when the type is mixed)
    Empty,
    /// Text content of the given type
    Simple(TypeRef),
    Elements(Particle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    pub required: bool,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub content: Content,
    pub attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleType {
    pub base: Option<Box<TypeRef>>,
    pub enumeration: Vec<String>,
}

/// Type of an element after named references are followed
#[derive(Debug, Clone, Copy)]
pub enum ResolvedType<'s> {
    Complex(&'s ComplexType),
    Simple(&'s SimpleType),
    Builtin(&'s str),
    Any,
}

/// A compiled schema
#[derive(Debug, Clone, Default)]
pub struct Schema {
    elements: BTreeMap<String, ElementDecl>,
    complex_types: BTreeMap<String, ComplexType>,
    simple_types: BTreeMap<String, SimpleType>,
    /// Global element names in declaration order
    root_order: Vec<String>,
}

impl Schema {
    /// Compile XSD text
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let document = roxmltree::Document::parse(text).map_err(|e| SchemaError::SchemaParse {
            message: e.to_string(),
        })?;

        let root = document.root_element();
        if root.tag_name().name() != "schema" {
            return Err(SchemaError::SchemaParse {
                message: format!(
                    "expected a 'schema' root element, found '{}'",
                    root.tag_name().name()
                ),
            });
        }

        let definitions = Definitions::collect(root)?;
        let mut schema = Schema::default();
        for child in elements(root) {
            match child.tag_name().name() {
                "element" => {
                    let decl = definitions.element_decl(child, 0)?;
                    schema.root_order.push(decl.name.clone());
                    schema.elements.insert(decl.name.clone(), decl);
                }
                "complexType" => {
                    let name = required_name(child)?;
                    schema
                        .complex_types
                        .insert(name, definitions.complex_type(child, 0)?);
                }
                "simpleType" => {
                    let name = required_name(child)?;
                    schema
                        .simple_types
                        .insert(name, definitions.simple_type(child)?);
                }
                // groups and global attributes are expanded where they are referenced
                _ => {}
            }
        }

        schema.check_references()?;
        Ok(schema)
    }

    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub fn global_element_names(&self) -> &[String] {
        &self.root_order
    }

    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }

    pub fn simple_type(&self, name: &str) -> Option<&SimpleType> {
        self.simple_types.get(name)
    }

    /// Declaration an element particle stands for
    pub fn element_decl<'s>(&'s self, particle: &'s ElementParticle) -> Result<&'s ElementDecl, SchemaError> {
        match &particle.source {
            ElementSource::Local(decl) => Ok(decl),
            ElementSource::Ref(name) => {
                self.elements
                    .get(name)
                    .ok_or_else(|| SchemaError::UnresolvedReference {
                        kind: "element",
                        name: name.clone(),
                    })
            }
        }
    }

    pub fn resolve_type<'s>(&'s self, type_ref: &'s TypeRef) -> Result<ResolvedType<'s>, SchemaError> {
        match type_ref {
            TypeRef::Named(name) => {
                if let Some(complex) = self.complex_types.get(name) {
                    Ok(ResolvedType::Complex(complex))
                } else if let Some(simple) = self.simple_types.get(name) {
                    Ok(ResolvedType::Simple(simple))
                } else if BUILTIN_TYPES.contains(&name.as_str()) {
                    Ok(ResolvedType::Builtin(name))
                } else {
                    Err(SchemaError::UnresolvedReference {
                        kind: "type",
                        name: name.clone(),
                    })
                }
            }
            TypeRef::Builtin(name) => Ok(ResolvedType::Builtin(name)),
            TypeRef::Complex(complex) => Ok(ResolvedType::Complex(complex)),
            TypeRef::Simple(simple) => Ok(ResolvedType::Simple(simple)),
            TypeRef::Any => Ok(ResolvedType::Any),
        }
    }

    /// Whether `value` is acceptable for a simple type, following `base` chains
    pub fn accepts_value(&self, type_ref: &TypeRef, value: &str) -> Result<bool, SchemaError> {
        self.accepts_value_at(type_ref, value, 0)
    }

    fn accepts_value_at(
        &self,
        type_ref: &TypeRef,
        value: &str,
        depth: usize,
    ) -> Result<bool, SchemaError> {
        if depth > MAX_TYPE_RESOLUTION_DEPTH {
            return Err(SchemaError::SchemaParse {
                message: "simple type derivation chain is too deep".to_string(),
            });
        }

        match self.resolve_type(type_ref)? {
            ResolvedType::Simple(simple) => {
                if !simple.enumeration.is_empty()
                    && !simple.enumeration.iter().any(|v| v == value.trim())
                {
                    return Ok(false);
                }
                match &simple.base {
                    Some(base) => self.accepts_value_at(base, value, depth + 1),
                    None => Ok(true),
                }
            }
            ResolvedType::Builtin(name) => Ok(builtin_accepts(name, value)),
            ResolvedType::Complex(_) | ResolvedType::Any => Ok(true),
        }
    }

    /// Enumeration values of a simple type, for messages
    pub fn enumeration_of(&self, type_ref: &TypeRef) -> Vec<String> {
        match self.resolve_type(type_ref) {
            Ok(ResolvedType::Simple(simple)) => simple.enumeration.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether any element particle reachable from `particle` has `name`
    pub fn declares(&self, particle: &Particle, name: &str) -> bool {
        match particle {
            Particle::Element(element) => self
                .element_decl(element)
                .is_ok_and(|decl| decl.name == name),
            Particle::Sequence(group) | Particle::Choice(group) | Particle::All(group) => {
                group.particles.iter().any(|p| self.declares(p, name))
            }
            Particle::Any(_) => false,
        }
    }

    /// Whether `particle` can begin with an element called `name`
    pub fn can_start_with(&self, particle: &Particle, name: &str) -> bool {
        match particle {
            Particle::Element(element) => self
                .element_decl(element)
                .is_ok_and(|decl| decl.name == name),
            Particle::Sequence(group) => {
                for p in &group.particles {
                    if self.can_start_with(p, name) {
                        return true;
                    }
                    if !self.is_nullable(p) {
                        return false;
                    }
                }
                false
            }
            Particle::Choice(group) | Particle::All(group) => {
                group.particles.iter().any(|p| self.can_start_with(p, name))
            }
            Particle::Any(_) => true,
        }
    }

    /// Whether `particle` can match zero elements
    pub fn is_nullable(&self, particle: &Particle) -> bool {
        match particle {
            Particle::Element(element) => element.occurs.min == 0,
            Particle::Any(occurs) => occurs.min == 0,
            Particle::Sequence(group) | Particle::All(group) => {
                group.occurs.min == 0 || group.particles.iter().all(|p| self.is_nullable(p))
            }
            Particle::Choice(group) => {
                group.occurs.min == 0 || group.particles.iter().any(|p| self.is_nullable(p))
            }
        }
    }

    /// Names a particle expects, for "missing element" messages
    pub fn expected_names(&self, particle: &Particle) -> Vec<String> {
        match particle {
            Particle::Element(element) => self
                .element_decl(element)
                .map(|decl| vec![decl.name.clone()])
                .unwrap_or_default(),
            Particle::Sequence(group) => group
                .particles
                .iter()
                .find(|p| !self.is_nullable(p))
                .map(|p| self.expected_names(p))
                .unwrap_or_default(),
            Particle::Choice(group) | Particle::All(group) => group
                .particles
                .iter()
                .flat_map(|p| self.expected_names(p))
                .collect(),
            Particle::Any(_) => vec!["*".to_string()],
        }
    }

    fn check_references(&self) -> Result<(), SchemaError> {
        for decl in self.elements.values() {
            self.check_type_ref(&decl.type_ref)?;
        }
        for complex in self.complex_types.values() {
            self.check_complex(complex)?;
        }
        for simple in self.simple_types.values() {
            self.check_simple(simple)?;
        }
        Ok(())
    }

    fn check_type_ref(&self, type_ref: &TypeRef) -> Result<(), SchemaError> {
        match type_ref {
            TypeRef::Named(_) => self.resolve_type(type_ref).map(|_| ()),
            TypeRef::Complex(complex) => self.check_complex(complex),
            TypeRef::Simple(simple) => self.check_simple(simple),
            TypeRef::Builtin(_) | TypeRef::Any => Ok(()),
        }
    }

    fn check_complex(&self, complex: &ComplexType) -> Result<(), SchemaError> {
        for attribute in &complex.attributes {
            self.check_type_ref(&attribute.type_ref)?;
        }
        match &complex.content {
            Content::Empty => Ok(()),
            Content::Simple(type_ref) => self.check_type_ref(type_ref),
            Content::Elements(particle) => self.check_particle(particle),
        }
    }

    fn check_simple(&self, simple: &SimpleType) -> Result<(), SchemaError> {
        match &simple.base {
            Some(base) => self.check_type_ref(base),
            None => Ok(()),
        }
    }

    fn check_particle(&self, particle: &Particle) -> Result<(), SchemaError> {
        match particle {
            Particle::Element(element) => {
                let decl = self.element_decl(element)?;
                match element.source {
                    // globals are checked on their own
                    ElementSource::Ref(_) => Ok(()),
                    ElementSource::Local(_) => self.check_type_ref(&decl.type_ref),
                }
            }
            Particle::Sequence(group) | Particle::Choice(group) | Particle::All(group) => {
                group.particles.iter().try_for_each(|p| self.check_particle(p))
            }
            Particle::Any(_) => Ok(()),
        }
    }
}

fn builtin_accepts(name: &str, value: &str) -> bool {
    let value = value.trim();
    match name {
        "boolean" => matches!(value, "true" | "false" | "1" | "0"),
        "integer" | "int" | "long" | "short" | "byte" => value.parse::<i128>().is_ok(),
        "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" => value.parse::<u128>().is_ok(),
        "positiveInteger" => value.parse::<u128>().is_ok_and(|v| v > 0),
        "decimal" | "float" | "double" => value.parse::<f64>().is_ok(),
        _ => true,
    }
}

// ============================================================================
// XSD READING
// ============================================================================

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Restriction facets; only `enumeration` is enforced
const FACETS: &[&str] = &[
    "enumeration", "pattern", "length", "minLength", "maxLength", "whiteSpace",
    "minInclusive", "maxInclusive", "minExclusive", "maxExclusive", "totalDigits",
    "fractionDigits",
];

fn parse_error(message: String) -> SchemaError {
    SchemaError::SchemaParse { message }
}

fn unsupported(node: Node) -> SchemaError {
    parse_error(format!(
        "unsupported construct '{}' on line {}",
        node.tag_name().name(),
        line_of(node)
    ))
}

/// Element children, annotations skipped
fn elements<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() != "annotation")
}

fn name_of<'a>(node: Node<'a, '_>) -> Result<&'a str, SchemaError> {
    node.attribute("name").ok_or_else(|| {
        parse_error(format!(
            "'{}' on line {} has no name",
            node.tag_name().name(),
            line_of(node)
        ))
    })
}

fn required_name(node: Node) -> Result<String, SchemaError> {
    name_of(node).map(str::to_string)
}

fn required_ref<'a>(node: Node<'a, '_>) -> Result<&'a str, SchemaError> {
    node.attribute("ref").ok_or_else(|| {
        parse_error(format!(
            "'{}' on line {} has no ref",
            node.tag_name().name(),
            line_of(node)
        ))
    })
}

pub(crate) fn line_of(node: Node) -> u32 {
    node.document().text_pos_at(node.range().start).row
}

fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

enum QualifiedName<'q> {
    /// `xs:*` built-in
    Xsd(&'q str),
    /// Declared in this schema
    Local(&'q str),
    /// From an imported namespace; its declarations are not available
    Foreign(&'q str),
}

/// Attribute uses of one type, before anything is inherited
#[derive(Default)]
struct AttributeSet {
    declared: Vec<AttributeDecl>,
    prohibited: Vec<String>,
}

impl AttributeSet {
    /// Base attributes not redeclared or prohibited here, then this set's own
    fn inherit(self, base: Option<ComplexType>) -> Vec<AttributeDecl> {
        let mut attributes: Vec<AttributeDecl> = base
            .map(|base| base.attributes)
            .unwrap_or_default()
            .into_iter()
            .filter(|inherited| {
                !self.prohibited.contains(&inherited.name)
                    && !self.declared.iter().any(|own| own.name == inherited.name)
            })
            .collect();
        attributes.extend(self.declared);
        attributes
    }
}

/// Extension appends the derived content model to the base one
fn extend_content(base: Content, own: Content) -> Content {
    match (base, own) {
        (base, Content::Empty) => base,
        (Content::Elements(base), Content::Elements(own)) => Content::Elements(Particle::Sequence(Group {
            particles: vec![base, own],
            occurs: Occurs { min: 1, max: Some(1) },
        })),
        (_, own) => own,
    }
}

/// Top-level definitions that other declarations refer to by name
struct Definitions<'a, 'input> {
    target_namespace: Option<&'a str>,
    imports: BTreeSet<&'a str>,
    complex_types: BTreeMap<&'a str, Node<'a, 'input>>,
    groups: BTreeMap<&'a str, Node<'a, 'input>>,
    attribute_groups: BTreeMap<&'a str, Node<'a, 'input>>,
    attributes: BTreeMap<&'a str, Node<'a, 'input>>,
}

impl<'a, 'input: 'a> Definitions<'a, 'input> {
    fn collect(root: Node<'a, 'input>) -> Result<Self, SchemaError> {
        let mut definitions = Definitions {
            target_namespace: root.attribute("targetNamespace"),
            imports: BTreeSet::new(),
            complex_types: BTreeMap::new(),
            groups: BTreeMap::new(),
            attribute_groups: BTreeMap::new(),
            attributes: BTreeMap::new(),
        };

        for child in elements(root) {
            let table = match child.tag_name().name() {
                "complexType" => &mut definitions.complex_types,
                "group" => &mut definitions.groups,
                "attributeGroup" => &mut definitions.attribute_groups,
                "attribute" => &mut definitions.attributes,
                "import" => {
                    if let Some(namespace) = child.attribute("namespace") {
                        definitions.imports.insert(namespace);
                    }
                    continue;
                }
                "element" | "simpleType" | "notation" => continue,
                _ => return Err(unsupported(child)),
            };
            table.insert(name_of(child)?, child);
        }

        Ok(definitions)
    }

    fn qualify<'q>(&self, node: Node, qname: &'q str) -> Result<QualifiedName<'q>, SchemaError> {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname),
        };

        match node.lookup_namespace_uri(prefix) {
            None if prefix.is_none() => Ok(QualifiedName::Local(local)),
            Some(XSD_NAMESPACE) => Ok(QualifiedName::Xsd(local)),
            Some(uri) if Some(uri) == self.target_namespace => Ok(QualifiedName::Local(local)),
            Some(uri) if uri == XML_NAMESPACE || self.imports.contains(uri) => {
                Ok(QualifiedName::Foreign(local))
            }
            Some(_) if prefix.is_none() && self.target_namespace.is_none() => {
                Ok(QualifiedName::Local(local))
            }
            _ => Err(parse_error(format!(
                "'{}' on line {} is neither in the target namespace nor imported",
                qname,
                line_of(node)
            ))),
        }
    }

    /// Resolve a `type=`/`base=` QName into a type reference
    fn type_ref(&self, node: Node, qname: &str) -> Result<TypeRef, SchemaError> {
        Ok(match self.qualify(node, qname)? {
            QualifiedName::Xsd("anyType") | QualifiedName::Foreign(_) => TypeRef::Any,
            QualifiedName::Xsd(local) => TypeRef::Builtin(local.to_string()),
            QualifiedName::Local(local) => TypeRef::Named(local.to_string()),
        })
    }

    /// One more step along a chain of group, attribute group or base references
    fn follow(&self, node: Node, depth: usize) -> Result<usize, SchemaError> {
        if depth >= MAX_TYPE_RESOLUTION_DEPTH {
            return Err(parse_error(format!(
                "reference chain through line {} is too deep",
                line_of(node)
            )));
        }
        Ok(depth + 1)
    }

    fn element_decl(&self, node: Node<'a, 'input>, depth: usize) -> Result<ElementDecl, SchemaError> {
        if node.has_attribute("substitutionGroup") {
            return Err(parse_error(format!(
                "unsupported construct 'substitutionGroup' on line {}",
                line_of(node)
            )));
        }

        let name = required_name(node)?;
        let mut type_ref = match node.attribute("type") {
            Some(type_name) => self.type_ref(node, type_name)?,
            None => TypeRef::Any,
        };

        for child in elements(node) {
            match child.tag_name().name() {
                "complexType" => {
                    type_ref = TypeRef::Complex(Box::new(self.complex_type(child, depth)?))
                }
                "simpleType" => type_ref = TypeRef::Simple(self.simple_type(child)?),
                // identity constraints are not enforced
                "unique" | "key" | "keyref" => {}
                _ => return Err(unsupported(child)),
            }
        }

        Ok(ElementDecl { name, type_ref })
    }

    fn complex_type(&self, node: Node<'a, 'input>, depth: usize) -> Result<ComplexType, SchemaError> {
        for child in elements(node) {
            match child.tag_name().name() {
                "simpleContent" => return self.simple_content(child, depth),
                "complexContent" => return self.complex_content(child, depth),
                _ => {}
            }
        }

        let (content, attributes) = self.content_and_attributes(node, depth)?;
        Ok(ComplexType {
            content,
            attributes: attributes.declared,
        })
    }

    /// Content model and attribute uses declared directly under `node`
    fn content_and_attributes(
        &self,
        node: Node<'a, 'input>,
        depth: usize,
    ) -> Result<(Content, AttributeSet), SchemaError> {
        let mut content = Content::Empty;
        let mut attributes = AttributeSet::default();

        for child in elements(node) {
            match child.tag_name().name() {
                "sequence" | "choice" | "all" | "group" => {
                    content = Content::Elements(self.particle(child, depth)?)
                }
                "attribute" | "attributeGroup" | "anyAttribute" => {
                    self.attribute_use(child, &mut attributes, depth)?
                }
                _ => return Err(unsupported(child)),
            }
        }

        Ok((content, attributes))
    }

    /// The `extension` or `restriction` under a content node
    fn derivation(&self, node: Node<'a, 'input>) -> Result<(Node<'a, 'input>, TypeRef), SchemaError> {
        let derivation = elements(node).next().ok_or_else(|| {
            parse_error(format!(
                "'{}' on line {} has no extension or restriction",
                node.tag_name().name(),
                line_of(node)
            ))
        })?;
        if !matches!(derivation.tag_name().name(), "extension" | "restriction") {
            return Err(unsupported(derivation));
        }

        let base = derivation.attribute("base").ok_or_else(|| {
            parse_error(format!(
                "'{}' on line {} has no base",
                derivation.tag_name().name(),
                line_of(derivation)
            ))
        })?;
        Ok((derivation, self.type_ref(derivation, base)?))
    }

    /// Compiled named complex type a derivation starts from
    fn base_complex(
        &self,
        derivation: Node,
        base: &TypeRef,
        depth: usize,
    ) -> Result<Option<ComplexType>, SchemaError> {
        let TypeRef::Named(name) = base else {
            return Ok(None);
        };
        match self.complex_types.get(name.as_str()) {
            Some(node) => Ok(Some(self.complex_type(*node, self.follow(derivation, depth)?)?)),
            None => Ok(None),
        }
    }

    fn simple_content(&self, node: Node<'a, 'input>, depth: usize) -> Result<ComplexType, SchemaError> {
        let (derivation, base) = self.derivation(node)?;
        let inherited = self.base_complex(derivation, &base, depth)?;

        let mut value_type = match &inherited {
            Some(ComplexType {
                content: Content::Simple(value),
                ..
            }) => value.clone(),
            Some(_) => TypeRef::Any,
            None => base,
        };

        let mut attributes = AttributeSet::default();
        let mut enumeration = Vec::new();
        for child in elements(derivation) {
            match child.tag_name().name() {
                "attribute" | "attributeGroup" | "anyAttribute" => {
                    self.attribute_use(child, &mut attributes, depth)?
                }
                "enumeration" => enumeration.extend(child.attribute("value").map(str::to_string)),
                facet if FACETS.contains(&facet) => {}
                _ => return Err(unsupported(child)),
            }
        }

        if !enumeration.is_empty() {
            value_type = TypeRef::Simple(SimpleType {
                base: Some(Box::new(value_type)),
                enumeration,
            });
        }

        Ok(ComplexType {
            content: Content::Simple(value_type),
            attributes: attributes.inherit(inherited),
        })
    }

    fn complex_content(&self, node: Node<'a, 'input>, depth: usize) -> Result<ComplexType, SchemaError> {
        let (derivation, base) = self.derivation(node)?;
        let inherited = match &base {
            TypeRef::Any => None,
            TypeRef::Named(name) => Some(self.base_complex(derivation, &base, depth)?.ok_or_else(
                || SchemaError::UnresolvedReference {
                    kind: "type",
                    name: name.clone(),
                },
            )?),
            _ => {
                return Err(parse_error(format!(
                    "complexContent on line {} derives from a simple type",
                    line_of(derivation)
                )))
            }
        };

        let (own, attributes) = self.content_and_attributes(derivation, depth)?;
        let content = match (derivation.tag_name().name(), &inherited) {
            ("extension", Some(base)) => extend_content(base.content.clone(), own),
            _ => own,
        };

        Ok(ComplexType {
            content,
            attributes: attributes.inherit(inherited),
        })
    }

    fn particle(&self, node: Node<'a, 'input>, depth: usize) -> Result<Particle, SchemaError> {
        let occurs = Occurs::from_node(node)?;

        match node.tag_name().name() {
            "element" => {
                let source = match node.attribute("ref") {
                    Some(reference) => match self.qualify(node, reference)? {
                        QualifiedName::Foreign(local) => ElementSource::Local(ElementDecl {
                            name: local.to_string(),
                            type_ref: TypeRef::Any,
                        }),
                        QualifiedName::Local(local) | QualifiedName::Xsd(local) => {
                            ElementSource::Ref(local.to_string())
                        }
                    },
                    None => ElementSource::Local(self.element_decl(node, depth)?),
                };
                Ok(Particle::Element(ElementParticle { source, occurs }))
            }
            "any" => Ok(Particle::Any(occurs)),
            "group" => {
                let name = local_name(required_ref(node)?);
                let definition = self.groups.get(name).ok_or_else(|| {
                    SchemaError::UnresolvedReference {
                        kind: "group",
                        name: name.to_string(),
                    }
                })?;
                let model = elements(*definition)
                    .next()
                    .ok_or_else(|| parse_error(format!("group '{}' has no content", name)))?;
                if !matches!(model.tag_name().name(), "sequence" | "choice" | "all") {
                    return Err(unsupported(model));
                }

                // occurrence bounds live on the reference, not the definition
                Ok(match self.particle(model, self.follow(node, depth)?)? {
                    Particle::Sequence(group) => Particle::Sequence(Group { occurs, ..group }),
                    Particle::Choice(group) => Particle::Choice(Group { occurs, ..group }),
                    Particle::All(group) => Particle::All(Group { occurs, ..group }),
                    _ => return Err(unsupported(model)),
                })
            }
            kind @ ("sequence" | "choice" | "all") => {
                let particles = elements(node)
                    .map(|child| self.particle(child, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                let group = Group { particles, occurs };
                Ok(match kind {
                    "sequence" => Particle::Sequence(group),
                    "choice" => Particle::Choice(group),
                    _ => Particle::All(group),
                })
            }
            _ => Err(unsupported(node)),
        }
    }

    fn attribute_use(
        &self,
        node: Node<'a, 'input>,
        attributes: &mut AttributeSet,
        depth: usize,
    ) -> Result<(), SchemaError> {
        match node.tag_name().name() {
            "attribute" if node.attribute("use") == Some("prohibited") => {
                attributes.prohibited.push(self.attribute(node)?.name)
            }
            "attribute" => attributes.declared.push(self.attribute(node)?),
            "attributeGroup" => {
                let name = local_name(required_ref(node)?);
                let group = self.attribute_groups.get(name).ok_or_else(|| {
                    SchemaError::UnresolvedReference {
                        kind: "attribute group",
                        name: name.to_string(),
                    }
                })?;
                let depth = self.follow(node, depth)?;
                for child in elements(*group) {
                    self.attribute_use(child, attributes, depth)?;
                }
            }
            // undeclared attributes are never rejected
            "anyAttribute" => {}
            _ => return Err(unsupported(node)),
        }
        Ok(())
    }

    fn attribute(&self, node: Node<'a, 'input>) -> Result<AttributeDecl, SchemaError> {
        let required = node.attribute("use") == Some("required");

        if let Some(reference) = node.attribute("ref") {
            let type_ref = match self.qualify(node, reference)? {
                QualifiedName::Local(local) => {
                    let global = self.attributes.get(local).ok_or_else(|| {
                        SchemaError::UnresolvedReference {
                            kind: "attribute",
                            name: local.to_string(),
                        }
                    })?;
                    self.attribute_type(*global)?
                }
                QualifiedName::Xsd(_) | QualifiedName::Foreign(_) => TypeRef::Any,
            };
            return Ok(AttributeDecl {
                name: local_name(reference).to_string(),
                required,
                type_ref,
            });
        }

        Ok(AttributeDecl {
            name: required_name(node)?,
            required,
            type_ref: self.attribute_type(node)?,
        })
    }

    fn attribute_type(&self, node: Node<'a, 'input>) -> Result<TypeRef, SchemaError> {
        if let Some(type_name) = node.attribute("type") {
            return self.type_ref(node, type_name);
        }
        match elements(node).find(|n| n.tag_name().name() == "simpleType") {
            Some(inline) => Ok(TypeRef::Simple(self.simple_type(inline)?)),
            None => Ok(TypeRef::Any),
        }
    }

    fn simple_type(&self, node: Node<'a, 'input>) -> Result<SimpleType, SchemaError> {
        let mut simple = SimpleType::default();
        let derivation = elements(node).next().ok_or_else(|| {
            parse_error(format!("simpleType on line {} has no content", line_of(node)))
        })?;

        match derivation.tag_name().name() {
            // list and union types accept any text
            "list" | "union" => {}
            "restriction" => {
                if let Some(base) = derivation.attribute("base") {
                    simple.base = Some(Box::new(self.type_ref(derivation, base)?));
                }
                for child in elements(derivation) {
                    match child.tag_name().name() {
                        "simpleType" if simple.base.is_none() => {
                            simple.base = Some(Box::new(TypeRef::Simple(self.simple_type(child)?)))
                        }
                        "enumeration" => simple
                            .enumeration
                            .extend(child.attribute("value").map(str::to_string)),
                        facet if FACETS.contains(&facet) => {}
                        _ => return Err(unsupported(child)),
                    }
                }
            }
            _ => return Err(unsupported(derivation)),
        }

        Ok(simple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
      <xs:element name="fixtext" type="xs:string" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="severity" type="severityType" use="required"/>
  </xs:complexType>
  <xs:element name="Rule" type="ruleType"/>
  <xs:element name="Benchmark">
    <xs:complexType>
      <xs:sequence>
        <xs:element ref="Rule" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn test_compiles_named_and_anonymous_types() {
        let schema = Schema::parse(XSD).unwrap();

        assert_eq!(schema.global_element_names(), ["Rule", "Benchmark"]);
        let rule = schema.complex_type("ruleType").unwrap();
        assert_eq!(rule.attributes.len(), 1);
        assert!(rule.attributes[0].required);
        assert_matches!(rule.content, Content::Elements(Particle::Sequence(ref g)) if g.particles.len() == 2);

        let benchmark = schema.element("Benchmark").unwrap();
        assert_matches!(benchmark.type_ref, TypeRef::Complex(_));
    }

    #[test]
    fn test_builtin_detection_uses_namespace() {
        let schema = Schema::parse(XSD).unwrap();
        let rule = schema.complex_type("ruleType").unwrap();
        let Content::Elements(Particle::Sequence(group)) = &rule.content else {
            panic!("expected a sequence");
        };
        let Particle::Element(title) = &group.particles[0] else {
            panic!("expected an element");
        };
        assert_matches!(
            schema.element_decl(title).unwrap().type_ref,
            TypeRef::Builtin(ref name) if name == "string"
        );
    }

    #[test]
    fn test_enumeration_values() {
        let schema = Schema::parse(XSD).unwrap();
        let severity = TypeRef::Named("severityType".to_string());

        assert!(schema.accepts_value(&severity, "medium").unwrap());
        assert!(schema.accepts_value(&severity, " low ").unwrap());
        assert!(!schema.accepts_value(&severity, "critical").unwrap());
        assert_eq!(schema.enumeration_of(&severity).len(), 3);
    }

    #[test]
    fn test_builtin_values() {
        assert!(builtin_accepts("boolean", "true"));
        assert!(!builtin_accepts("boolean", "yes"));
        assert!(builtin_accepts("integer", "-4"));
        assert!(!builtin_accepts("positiveInteger", "0"));
        assert!(builtin_accepts("string", "anything"));
    }

    #[test]
    fn test_unresolved_type_is_rejected() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Benchmark" type="missingType"/>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(xsd),
            Err(SchemaError::UnresolvedReference { kind: "type", ref name }) if name == "missingType"
        );
    }

    #[test]
    fn test_unresolved_element_ref_is_rejected() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Benchmark">
    <xs:complexType><xs:sequence><xs:element ref="Group"/></xs:sequence></xs:complexType>
  </xs:element>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(xsd),
            Err(SchemaError::UnresolvedReference { kind: "element", .. })
        );
    }

    #[test]
    fn test_rejects_non_schema_root() {
        assert_matches!(
            Schema::parse("<Benchmark/>"),
            Err(SchemaError::SchemaParse { .. })
        );
        assert_matches!(
            Schema::parse("<xs:schema"),
            Err(SchemaError::SchemaParse { .. })
        );
    }

    #[test]
    fn test_particle_queries() {
        let schema = Schema::parse(XSD).unwrap();
        let rule = schema.complex_type("ruleType").unwrap();
        let Content::Elements(particle) = &rule.content else {
            panic!("expected element content");
        };

        assert!(schema.can_start_with(particle, "title"));
        assert!(!schema.can_start_with(particle, "fixtext"));
        assert!(schema.declares(particle, "fixtext"));
        assert!(!schema.is_nullable(particle));
        assert_eq!(schema.expected_names(particle), ["title"]);
    }

    const DERIVED_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:group name="metadata">
    <xs:sequence>
      <xs:element name="version" type="xs:string"/>
    </xs:sequence>
  </xs:group>
  <xs:attributeGroup name="identity">
    <xs:attribute name="id" type="xs:NCName" use="required"/>
  </xs:attributeGroup>
  <xs:complexType name="itemType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
    </xs:sequence>
    <xs:attributeGroup ref="identity"/>
    <xs:attribute name="hidden" type="xs:boolean"/>
  </xs:complexType>
  <xs:complexType name="groupType">
    <xs:complexContent>
      <xs:extension base="itemType">
        <xs:sequence>
          <xs:element name="Rule" type="xs:string" maxOccurs="unbounded"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="sealedGroupType">
    <xs:complexContent>
      <xs:restriction base="groupType">
        <xs:sequence>
          <xs:element name="title" type="xs:string"/>
          <xs:element name="Rule" type="xs:string" maxOccurs="unbounded"/>
        </xs:sequence>
        <xs:attribute name="hidden" use="prohibited"/>
      </xs:restriction>
    </xs:complexContent>
  </xs:complexType>
  <xs:element name="Benchmark">
    <xs:complexType>
      <xs:sequence>
        <xs:group ref="metadata"/>
        <xs:element name="Group" type="groupType" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn attribute_names(complex: &ComplexType) -> Vec<&str> {
        complex.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_extension_merges_base_content_and_attributes() {
        let schema = Schema::parse(DERIVED_XSD).unwrap();
        let group = schema.complex_type("groupType").unwrap();

        assert_eq!(attribute_names(group), ["id", "hidden"]);
        assert!(group.attributes[0].required);
        let Content::Elements(particle) = &group.content else {
            panic!("expected element content");
        };
        assert!(schema.can_start_with(particle, "title"));
        assert!(schema.declares(particle, "Rule"));
        assert_eq!(schema.expected_names(particle), ["title"]);
    }

    #[test]
    fn test_restriction_drops_prohibited_attributes() {
        let schema = Schema::parse(DERIVED_XSD).unwrap();
        let sealed = schema.complex_type("sealedGroupType").unwrap();

        assert_eq!(attribute_names(sealed), ["id"]);
        assert_matches!(sealed.content, Content::Elements(Particle::Sequence(ref g)) if g.particles.len() == 2);
    }

    #[test]
    fn test_group_reference_and_derived_type_validate() {
        let schema = Schema::parse(DERIVED_XSD).unwrap();

        let valid = r#"<Benchmark><version>1</version><Group id="V-1"><title>t</title><Rule>r</Rule></Group></Benchmark>"#;
        let result = crate::schema::validate_collecting(valid, &schema).unwrap();
        assert!(result.is_valid(), "{:?}", result.violations);

        let untitled = r#"<Benchmark><version>1</version><Group><Rule>r</Rule></Group></Benchmark>"#;
        let result = crate::schema::validate_collecting(untitled, &schema).unwrap();
        let fields: Vec<&str> = result.violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"title"), "{:?}", fields);
        assert!(fields.contains(&"@id"), "{:?}", fields);
    }

    #[test]
    fn test_unsupported_constructs_are_rejected() {
        let include = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="common.xsd"/>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(include),
            Err(SchemaError::SchemaParse { ref message }) if message.contains("'include' on line 2")
        );

        let substitution = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Item"/>
  <xs:element name="Rule" substitutionGroup="Item"/>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(substitution),
            Err(SchemaError::SchemaParse { ref message }) if message.contains("substitutionGroup")
        );

        let unknown_particle = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Benchmark">
    <xs:complexType><xs:sequence><xs:assert test="true()"/></xs:sequence></xs:complexType>
  </xs:element>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(unknown_particle),
            Err(SchemaError::SchemaParse { ref message }) if message.contains("'assert'")
        );
    }

    #[test]
    fn test_unresolved_group_references() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="itemType">
    <xs:sequence><xs:group ref="metadata"/></xs:sequence>
    <xs:attributeGroup ref="identity"/>
  </xs:complexType>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(xsd),
            Err(SchemaError::UnresolvedReference { kind: "group", ref name }) if name == "metadata"
        );

        let missing_base = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="groupType">
    <xs:complexContent><xs:extension base="itemType"/></xs:complexContent>
  </xs:complexType>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(missing_base),
            Err(SchemaError::UnresolvedReference { kind: "type", ref name }) if name == "itemType"
        );
    }

    #[test]
    fn test_recursive_group_is_bounded() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:group name="nested">
    <xs:sequence>
      <xs:element name="item">
        <xs:complexType><xs:sequence><xs:group ref="nested" minOccurs="0"/></xs:sequence></xs:complexType>
      </xs:element>
    </xs:sequence>
  </xs:group>
  <xs:element name="root"><xs:complexType><xs:group ref="nested"/></xs:complexType></xs:element>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(xsd),
            Err(SchemaError::SchemaParse { ref message }) if message.contains("too deep")
        );
    }

    #[test]
    fn test_imported_references_accept_any_content() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:dc="http://purl.org/dc/elements/1.1/">
  <xs:import namespace="http://purl.org/dc/elements/1.1/" schemaLocation="dc.xsd"/>
  <xs:element name="reference">
    <xs:complexType>
      <xs:sequence>
        <xs:element ref="dc:publisher" minOccurs="0"/>
      </xs:sequence>
      <xs:attribute ref="xml:lang"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;
        let schema = Schema::parse(xsd).unwrap();
        let document = r#"<reference xmlns:dc="http://purl.org/dc/elements/1.1/" xml:lang="en"><dc:publisher>DISA</dc:publisher></reference>"#;
        assert!(crate::schema::validate(document, &schema).unwrap().is_valid());

        let not_imported = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:cpe="http://cpe.mitre.org/language/2.0">
  <xs:element name="platform" type="cpe:platformType"/>
</xs:schema>"#;
        assert_matches!(
            Schema::parse(not_imported),
            Err(SchemaError::SchemaParse { ref message }) if message.contains("cpe:platformType")
        );
    }
}
