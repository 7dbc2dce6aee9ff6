//! AST for DSC resource scripts
//!
//! Only configuration and function definitions and parameter declarations get
//! full structure. Every other statement is kept as a flat list of elements so
//! that nested script blocks remain reachable.

use crate::utils::{Span, Spanned};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptBlockAst {
    pub attributes: Vec<AttributeAst>,
    pub param_block: Option<ParamBlockAst>,
    pub statements: Vec<StatementAst>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementAst {
    Configuration(ConfigurationAst),
    Function(FunctionAst),
    Pipeline(PipelineAst),
}

impl StatementAst {
    pub fn span(&self) -> Span {
        match self {
            StatementAst::Configuration(c) => c.span,
            StatementAst::Function(f) => f.span,
            StatementAst::Pipeline(p) => p.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationAst {
    pub name: Spanned<String>,
    pub body: ScriptBlockAst,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionAst {
    pub name: Spanned<String>,
    /// Parameters declared inline, as in `function Get-Value($Path) { }`
    pub parameters: Option<ParamBlockAst>,
    pub body: ScriptBlockAst,
    pub span: Span,
}

/// Any other statement, possibly a pipeline of several commands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineAst {
    pub elements: Vec<ExpressionAst>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamBlockAst {
    pub parameters: Vec<ParameterAst>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterAst {
    pub name: Spanned<String>,
    pub attributes: Vec<AttributeAst>,
    pub type_constraints: Vec<Spanned<String>>,
    pub default_value: Option<ExpressionAst>,
    pub span: Span,
}

impl ParameterAst {
    /// First attribute with the given name, ignoring case, namespace and the `Attribute` suffix
    pub fn attribute(&self, name: &str) -> Option<&AttributeAst> {
        self.attributes.iter().find(|a| a.is_named(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeAst {
    pub name: Spanned<String>,
    pub positional: Vec<ExpressionAst>,
    pub named: Vec<NamedArgumentAst>,
    pub span: Span,
}

impl AttributeAst {
    pub fn is_named(&self, name: &str) -> bool {
        let short = self
            .name
            .value
            .rsplit('.')
            .next()
            .unwrap_or(&self.name.value);
        let short = match short.len().checked_sub("attribute".len()) {
            Some(cut)
                if cut > 0
                    && short
                        .get(cut..)
                        .is_some_and(|suffix| suffix.eq_ignore_ascii_case("attribute")) =>
            {
                &short[..cut]
            }
            _ => short,
        };
        short.eq_ignore_ascii_case(name)
    }
}

/// `Name = value`, or a bare switch such as `Mandatory`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedArgumentAst {
    pub name: Spanned<String>,
    pub value: Option<ExpressionAst>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExpressionAst {
    StringConstant { value: String, expandable: bool, span: Span },
    Number { text: String, span: Span },
    Variable { name: String, span: Span },
    Bareword { text: String, span: Span },
    Parameter { name: String, span: Span },
    Operator { text: String, span: Span },
    TypeLiteral { name: String, span: Span },
    ScriptBlock(Box<ScriptBlockAst>),
    /// Attribute used in expression position, as in `[ValidateNotNull()][string]$x`
    Attribute(Box<AttributeAst>),
    /// `( )`, `$( )` or `@( )`
    SubExpression {
        kind: SubExpressionKind,
        statements: Vec<StatementAst>,
        span: Span,
    },
    Hashtable { entries: Vec<HashEntryAst>, span: Span },
    /// Several elements where one value was expected, such as `-not $x`
    Compound { elements: Vec<ExpressionAst>, span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubExpressionKind {
    Paren,
    Dollar,
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HashEntryAst {
    pub key: ExpressionAst,
    pub value: Vec<ExpressionAst>,
    pub span: Span,
}

impl ExpressionAst {
    pub fn span(&self) -> Span {
        match self {
            ExpressionAst::StringConstant { span, .. }
            | ExpressionAst::Number { span, .. }
            | ExpressionAst::Variable { span, .. }
            | ExpressionAst::Bareword { span, .. }
            | ExpressionAst::Parameter { span, .. }
            | ExpressionAst::Operator { span, .. }
            | ExpressionAst::TypeLiteral { span, .. }
            | ExpressionAst::SubExpression { span, .. }
            | ExpressionAst::Hashtable { span, .. }
            | ExpressionAst::Compound { span, .. } => *span,
            ExpressionAst::ScriptBlock(block) => block.span,
            ExpressionAst::Attribute(attribute) => attribute.span,
        }
    }

    /// Literal text of a constant: strings without expansion, numbers and barewords
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            ExpressionAst::StringConstant {
                value,
                expandable: false,
                ..
            } => Some(value),
            ExpressionAst::StringConstant { value, .. } if !value.contains('$') => Some(value),
            ExpressionAst::Number { text, .. } | ExpressionAst::Bareword { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }
}

// ============================================================================
// TRAVERSAL
// ============================================================================

impl ScriptBlockAst {
    /// Visit this block and every nested block depth-first, in source order
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ScriptBlockAst)) {
        visit(self);
        for statement in &self.statements {
            statement.walk_blocks(visit);
        }
    }

    /// Every configuration definition in the script, in source order
    pub fn configurations(&self) -> Vec<&ConfigurationAst> {
        let mut found = Vec::new();
        self.walk(&mut |block| {
            for statement in &block.statements {
                if let StatementAst::Configuration(configuration) = statement {
                    found.push(configuration);
                }
            }
        });
        found
    }

    /// Every parameter declaration, depth-first in declaration order
    pub fn parameters(&self) -> Vec<&ParameterAst> {
        let mut found = Vec::new();
        self.walk(&mut |block| {
            if let Some(param_block) = &block.param_block {
                found.extend(param_block.parameters.iter());
            }
            for statement in &block.statements {
                if let StatementAst::Function(function) = statement {
                    if let Some(inline) = &function.parameters {
                        found.extend(inline.parameters.iter());
                    }
                }
            }
        });
        found
    }
}

impl StatementAst {
    fn walk_blocks<'a>(&'a self, visit: &mut dyn FnMut(&'a ScriptBlockAst)) {
        match self {
            StatementAst::Configuration(configuration) => configuration.body.walk(visit),
            StatementAst::Function(function) => function.body.walk(visit),
            StatementAst::Pipeline(pipeline) => {
                for element in &pipeline.elements {
                    element.walk_blocks(visit);
                }
            }
        }
    }
}

impl ExpressionAst {
    fn walk_blocks<'a>(&'a self, visit: &mut dyn FnMut(&'a ScriptBlockAst)) {
        match self {
            ExpressionAst::ScriptBlock(block) => block.walk(visit),
            ExpressionAst::Attribute(attribute) => {
                for value in &attribute.positional {
                    value.walk_blocks(visit);
                }
                for value in attribute.named.iter().filter_map(|n| n.value.as_ref()) {
                    value.walk_blocks(visit);
                }
            }
            ExpressionAst::SubExpression { statements, .. } => {
                for statement in statements {
                    statement.walk_blocks(visit);
                }
            }
            ExpressionAst::Hashtable { entries, .. } => {
                for entry in entries {
                    entry.key.walk_blocks(visit);
                    for value in &entry.value {
                        value.walk_blocks(visit);
                    }
                }
            }
            ExpressionAst::Compound { elements, .. } => {
                for element in elements {
                    element.walk_blocks(visit);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(name: &str) -> AttributeAst {
        AttributeAst {
            name: Spanned::new(name.to_string(), Span::dummy()),
            positional: vec![],
            named: vec![],
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_attribute_name_matching() {
        assert!(attribute("ValidateSet").is_named("validateset"));
        assert!(attribute("ValidateSetAttribute").is_named("ValidateSet"));
        assert!(attribute("System.Management.Automation.ValidateSet").is_named("ValidateSet"));
        assert!(!attribute("ValidateScript").is_named("ValidateSet"));
        assert!(attribute("Attribute").is_named("Attribute"));
    }

    #[test]
    fn test_literal_text() {
        let span = Span::dummy();
        let single = ExpressionAst::StringConstant {
            value: "2019".into(),
            expandable: false,
            span,
        };
        let expanding = ExpressionAst::StringConstant {
            value: "$prefix-1".into(),
            expandable: true,
            span,
        };
        let variable = ExpressionAst::Variable {
            name: "v".into(),
            span,
        };

        assert_eq!(single.literal_text(), Some("2019"));
        assert_eq!(expanding.literal_text(), None);
        assert_eq!(variable.literal_text(), None);
    }
}
