//! Grammar productions.
//!
//! Each module extends `Parser` with the methods for one group of
//! productions:
//!
//! - [`expr`]: value expressions, typed as they are parsed
//! - [`condition`]: guard conditions lowered from boolean expressions
//! - [`command`]: component commands, `and` chains and `until` clauses
//! - [`value_change`]: variable declarations and assignments
//! - [`statement`]: statements and control constructs
//! - [`unit`]: programs, functions, bodies and unit-level recovery
//!
//! The shared fragment below covers types, argument lists and the implicit
//! conversions applied where a value lands in a typed slot.

mod command;
mod condition;
mod expr;
mod statement;
mod unit;
mod value_change;

pub(crate) use expr::SpannedExpr;

use crate::{ParseError, Parser};
use tact_diagnostic::ErrorCode;
use tact_ir::{ComponentPath, Name, Span, TokenKind, ValueExpr, ValueType};

impl Parser<'_> {
    /// `int | double | bool | string | IDENT`, the last naming a struct
    /// type of the component.
    pub(crate) fn parse_type(&mut self) -> Result<ValueType, ParseError> {
        let ty = match self.cursor.current_kind() {
            TokenKind::IntType => ValueType::Int,
            TokenKind::DoubleType => ValueType::Double,
            TokenKind::BoolType => ValueType::Bool,
            TokenKind::StringType => ValueType::String,
            TokenKind::Ident(name) => match self.context.struct_type(name) {
                Some(def) => ValueType::Struct(def),
                None => {
                    return Err(ParseError::unknown_name(
                        "type",
                        &self.spell(name),
                        self.cursor.current_span(),
                    ))
                }
            },
            other => {
                return Err(ParseError::new(
                    ErrorCode::E1004,
                    format!("expected type, found {}", other.display_name()),
                    self.cursor.current_span(),
                ))
            }
        };
        self.cursor.advance();
        Ok(ty)
    }

    /// `'(' [expr (',' expr)*] ')'`
    pub(crate) fn parse_call_args(&mut self) -> Result<Vec<SpannedExpr>, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    /// Check call arguments against parameter types, widening where needed.
    pub(crate) fn check_arguments(
        &self,
        callee: &str,
        params: &[ValueType],
        args: Vec<SpannedExpr>,
        span: Span,
    ) -> Result<Vec<ValueExpr>, ParseError> {
        if params.len() != args.len() {
            return Err(ParseError::argument_count(
                callee,
                params.len(),
                args.len(),
                span,
            ));
        }
        args.into_iter()
            .zip(params)
            .map(|(arg, ty)| self.coerce(arg, ty))
            .collect()
    }

    /// Convert an expression for storage into a slot of type `ty`.
    pub(crate) fn coerce(&self, value: SpannedExpr, ty: &ValueType) -> Result<ValueExpr, ParseError> {
        let found = value.expr.ty();
        value.expr.coerce_to(ty).ok_or_else(|| {
            ParseError::type_mismatch(
                &ty.display(self.interner()),
                &found.display(self.interner()),
                value.span,
            )
        })
    }

    /// `arm.gripper.open` style spelling of a member path.
    pub(crate) fn spell_path(&self, path: &ComponentPath, name: Name) -> String {
        let mut text = String::new();
        for peer in path.peers() {
            text.push_str(&self.interner().lookup(*peer));
            text.push('.');
        }
        text.push_str(&self.interner().lookup(name));
        text
    }
}
