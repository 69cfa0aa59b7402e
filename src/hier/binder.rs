//! Constant evaluation for elaboration: generate guards, loop bounds, and
//! parameter values. The elaborator consumes this through three operations
//! only (evaluate an expression, step a genvar, resolve overrides), which
//! keeps the hierarchy layer independent of expression semantics.

use log::trace;

use crate::names::Ident;
use crate::parse::cst::{Node, SyntaxNode, Token, TokenKind};
use crate::source::Span;

use super::elab::Elaborator;
use super::scope::LookupLocation;
use super::{DefinitionId, ParameterMetadata, SymbolData};

/// The result of evaluating a constant expression.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConstantValue {
    Int(i64),
}

impl ConstantValue {
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(value) => *value,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_int() != 0
    }
}

impl Elaborator<'_, '_, '_> {
    /// Evaluate `expr` as a constant against the given location, with an
    /// optional transient genvar binding that shadows everything else.
    ///
    /// Failures are diagnosed here and reported as `None`; callers abort
    /// the affected subtree without publishing partial symbols.
    pub(super) fn evaluate_constant(
        &mut self,
        location: LookupLocation,
        expr: &SyntaxNode<'_>,
        genvar: Option<(Ident, i64)>,
    ) -> Option<i64> {
        match &expr.node {
            // Already diagnosed by the parser; stay quiet.
            Node::Invalid(_) => None,

            Node::LiteralExpression(token) => {
                let text: String = token.text.chars().filter(|c| *c != '_').collect();
                match text.parse::<i64>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        self.errors.hier_error(token.span).not_constant();
                        None
                    }
                }
            }

            Node::IdentifierExpression(token) => {
                if token.missing {
                    return None;
                }

                if let Some((name, value)) = genvar {
                    if self.comp.names.get(token.text) == Some(name) {
                        return Some(value);
                    }
                }

                let Some(found) = self
                    .comp
                    .names
                    .get(token.text)
                    .and_then(|ident| self.comp.lookup_ident(ident, location))
                else {
                    self.errors.hier_error(token.span).unknown_name(token.text);
                    return None;
                };

                match &self.comp.symbol(found).data {
                    SymbolData::Parameter { value, .. } => value.map(|value| value.as_int()),
                    _ => {
                        self.errors.hier_error(token.span).not_a_parameter(token.text);
                        None
                    }
                }
            }

            Node::ParenthesizedExpression { inner, .. } => {
                self.evaluate_constant(location, inner, genvar)
            }

            Node::UnaryExpression { op, operand } => {
                let value = self.evaluate_constant(location, operand, genvar)?;
                match op.kind {
                    TokenKind::Plus => Some(value),
                    TokenKind::Minus => Some(value.wrapping_neg()),
                    TokenKind::Not => Some((value == 0) as i64),
                    _ => {
                        self.errors.hier_error(op.span).not_constant();
                        None
                    }
                }
            }

            Node::BinaryExpression { left, op, right } => {
                let lhs = self.evaluate_constant(location, left, genvar)?;
                let rhs = self.evaluate_constant(location, right, genvar)?;
                self.apply_binary(op.kind, lhs, rhs, op.span)
            }

            _ => {
                self.errors.hier_error(expr.span).not_constant();
                None
            }
        }
    }

    fn apply_binary(&mut self, op: TokenKind, lhs: i64, rhs: i64, at: Span) -> Option<i64> {
        Some(match op {
            TokenKind::Plus => lhs.wrapping_add(rhs),
            TokenKind::Minus => lhs.wrapping_sub(rhs),
            TokenKind::Star => lhs.wrapping_mul(rhs),
            TokenKind::Slash | TokenKind::Percent if rhs == 0 => {
                self.errors.hier_error(at).division_by_zero();
                return None;
            }
            TokenKind::Slash => lhs.wrapping_div(rhs),
            TokenKind::Percent => lhs.wrapping_rem(rhs),
            TokenKind::Lt => (lhs < rhs) as i64,
            TokenKind::Lte => (lhs <= rhs) as i64,
            TokenKind::Gt => (lhs > rhs) as i64,
            TokenKind::Gte => (lhs >= rhs) as i64,
            TokenKind::EqEq => (lhs == rhs) as i64,
            TokenKind::NotEq => (lhs != rhs) as i64,
            TokenKind::AndAnd => (lhs != 0 && rhs != 0) as i64,
            TokenKind::OrOr => (lhs != 0 || rhs != 0) as i64,
            _ => {
                self.errors.hier_error(at).not_constant();
                return None;
            }
        })
    }

    /// Advance a genvar across one loop-generate step expression. The step
    /// must assign or increment the loop variable itself.
    pub(super) fn evaluate_step(
        &mut self,
        location: LookupLocation,
        step: &SyntaxNode<'_>,
        genvar: Ident,
        current: i64,
    ) -> Option<i64> {
        let genvar_named =
            |elab: &Self, token: &Token| elab.comp.names.get(token.text) == Some(genvar);

        match &step.node {
            Node::Invalid(_) => None,

            Node::UnaryExpression { op, operand } | Node::PostfixExpression { operand, op } => {
                let Node::IdentifierExpression(token) = &operand.node else {
                    self.errors.hier_error(step.span).invalid_genvar_step();
                    return None;
                };

                if !genvar_named(self, token) {
                    self.errors.hier_error(step.span).invalid_genvar_step();
                    return None;
                }

                match op.kind {
                    TokenKind::PlusPlus => Some(current.wrapping_add(1)),
                    TokenKind::MinusMinus => Some(current.wrapping_sub(1)),
                    _ => {
                        self.errors.hier_error(step.span).invalid_genvar_step();
                        None
                    }
                }
            }

            Node::BinaryExpression { left, op, right }
                if matches!(
                    op.kind,
                    TokenKind::Equals | TokenKind::PlusEqual | TokenKind::MinusEqual
                ) =>
            {
                let Node::IdentifierExpression(token) = &left.node else {
                    self.errors.hier_error(step.span).invalid_genvar_step();
                    return None;
                };

                if !genvar_named(self, token) {
                    self.errors.hier_error(step.span).invalid_genvar_step();
                    return None;
                }

                let rhs = self.evaluate_constant(location, right, Some((genvar, current)))?;
                match op.kind {
                    TokenKind::Equals => Some(rhs),
                    TokenKind::PlusEqual => Some(current.wrapping_add(rhs)),
                    TokenKind::MinusEqual => Some(current.wrapping_sub(rhs)),
                    _ => unreachable!("guarded by the match arm"),
                }
            }

            _ => {
                self.errors.hier_error(step.span).invalid_genvar_step();
                None
            }
        }
    }

    /// Combine a definition's parameter declarations with the overrides on
    /// an instantiation. Ordered overrides match overridable header
    /// parameters in order; named overrides match any non-local parameter.
    /// Override expressions are evaluated in the *instantiating* scope.
    pub(super) fn resolve_parameter_overrides(
        &mut self,
        definition: DefinitionId,
        assignment: Option<&SyntaxNode<'_>>,
        location: LookupLocation,
    ) -> Vec<ParameterMetadata> {
        let def = self.comp.definition(definition);
        let def_name = self.comp.names.get_ident(&def.name).to_owned();

        let mut metadata: Vec<ParameterMetadata> = def
            .parameters
            .iter()
            .enumerate()
            .map(|(decl, _)| ParameterMetadata { decl, overridden: false, value: None })
            .collect();

        let ordered_slots: Vec<usize> = def
            .parameters
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.is_port && !decl.is_local)
            .map(|(index, _)| index)
            .collect();

        let Some(assignment) = assignment else { return metadata };
        let Node::ParameterValueAssignment { list, .. } = &assignment.node else {
            return metadata;
        };

        trace!("resolving parameter overrides for `{def_name}`");

        let mut ordered_seen = 0;
        let mut overflow_reported = false;

        for item in list.items() {
            match &item.node {
                Node::NamedArgument { name, expr, .. } => {
                    if name.missing {
                        continue;
                    }

                    let slot = self.comp.names.get(name.text).and_then(|ident| {
                        self.comp
                            .definition(definition)
                            .parameters
                            .iter()
                            .position(|decl| decl.name == ident)
                    });

                    let Some(slot) = slot else {
                        self.errors.hier_error(name.span).unknown_parameter(name.text, &def_name);
                        continue;
                    };

                    if self.comp.definition(definition).parameters[slot].is_local {
                        self.errors.hier_error(name.span).local_parameter_override(name.text);
                        continue;
                    }

                    metadata[slot].overridden = true;
                    metadata[slot].value = expr
                        .and_then(|expr| self.evaluate_constant(location, expr, None))
                        .map(ConstantValue::Int);
                }

                Node::Invalid(_) => {}

                _ => {
                    if ordered_seen >= ordered_slots.len() {
                        if !overflow_reported {
                            self.errors
                                .hier_error(item.span)
                                .too_many_parameter_overrides(&def_name, ordered_slots.len());
                            overflow_reported = true;
                        }
                        continue;
                    }

                    let slot = ordered_slots[ordered_seen];
                    ordered_seen += 1;

                    metadata[slot].overridden = true;
                    metadata[slot].value = self
                        .evaluate_constant(location, item, None)
                        .map(ConstantValue::Int);
                }
            }
        }

        metadata
    }
}
