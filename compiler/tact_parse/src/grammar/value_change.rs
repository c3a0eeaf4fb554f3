//! Variable declarations and assignments.

use crate::{ParseError, Parser};
use tact_diagnostic::ErrorCode;
use tact_ir::{Command, Condition, TokenKind, VariableKind};
use tracing::trace;

impl Parser<'_> {
    /// `('var' | 'const') TYPE IDENT ['=' expr]`
    ///
    /// The initializer is parsed before the name is declared, so it cannot
    /// refer to the variable it initializes. Without an initializer no node
    /// is created.
    pub(crate) fn parse_declaration(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.current_span();
        let kind = if self.cursor.eat(&TokenKind::Const) {
            VariableKind::Const
        } else {
            self.cursor.expect(&TokenKind::Var)?;
            VariableKind::Var
        };
        let ty = self.parse_type()?;
        let (name, name_span) = self.cursor.expect_ident()?;

        let init = if self.cursor.eat(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else if kind == VariableKind::Const {
            return Err(ParseError::unexpected(
                "`=`",
                &self.cursor.current_kind(),
                self.cursor.current_span(),
            )
            .with_note("constants must be initialized where they are declared"));
        } else {
            None
        };
        let value = init.map(|init| self.coerce(init, &ty)).transpose()?;

        let spelled = self.spell(name);
        let target = self.unit.declare(name, ty, kind, name_span, &spelled)?;
        trace!(name = %spelled, ?kind, "declared");

        if let Some(value) = value {
            let span = start.merge(self.cursor.previous_span());
            self.unit.issue(Command::Assign { target, value }, span);
            self.unit.proceed(Condition::always(), span);
        }
        Ok(())
    }

    /// `'set' IDENT '=' expr`
    pub(crate) fn parse_assignment(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::Set)?.span;
        let (name, name_span) = self.cursor.expect_ident()?;
        let Some(target) = self.unit.lookup(name) else {
            return Err(ParseError::unknown_name(
                "variable",
                &self.spell(name),
                name_span,
            ));
        };
        let variable = self.unit.variable(target);
        if variable.kind == VariableKind::Const {
            return Err(ParseError::new(
                ErrorCode::E2009,
                format!("cannot assign to constant `{}`", self.spell(name)),
                name_span,
            )
            .with_related(variable.span, "declared as a constant here"));
        }
        let ty = variable.ty.clone();

        self.cursor.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        let value = self.coerce(value, &ty)?;
        let span = start.merge(self.cursor.previous_span());
        self.unit.issue(Command::Assign { target, value }, span);
        self.unit.proceed(Condition::always(), span);
        Ok(())
    }
}
