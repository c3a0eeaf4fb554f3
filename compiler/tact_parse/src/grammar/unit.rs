//! Top-level units and unit-level recovery.

use crate::unit::{UnitKind, UnitState};
use crate::{EntryPoint, ParseError, Parser};
use rustc_hash::FxHashMap;
use std::mem;
use tact_diagnostic::ErrorCode;
use tact_ir::{Condition, Name, Span, TokenKind, VariableKind};
use tracing::debug;

impl Parser<'_> {
    /// Parse every unit of the input.
    ///
    /// A unit that fails is skipped and its error recorded; the units
    /// around it are unaffected.
    pub(crate) fn parse_units(&mut self, entry: EntryPoint) -> (Vec<UnitState>, Vec<ParseError>) {
        let mut units = Vec::new();
        let mut errors = Vec::new();
        let mut names = FxHashMap::default();

        while !self.cursor.is_at_end() {
            if self.at_unit_start() {
                let start = self.cursor.position();
                match self.parse_unit(entry, &mut names) {
                    Ok(unit) => units.push(unit),
                    Err(error) => {
                        debug!(code = %error.code, "unit discarded");
                        errors.push(error);
                        self.recover_unit(start);
                    }
                }
            } else {
                errors.push(ParseError::unexpected(
                    "`program` or `function`",
                    &self.cursor.current_kind(),
                    self.cursor.current_span(),
                ));
                while !self.cursor.is_at_end() && !self.at_unit_start() {
                    self.cursor.advance();
                }
            }
        }
        (units, errors)
    }

    fn at_unit_start(&self) -> bool {
        matches!(
            self.cursor.current_kind(),
            TokenKind::Program | TokenKind::Function | TokenKind::Export
        )
    }

    fn parse_unit(
        &mut self,
        entry: EntryPoint,
        names: &mut FxHashMap<Name, Span>,
    ) -> Result<UnitState, ParseError> {
        let start = self.cursor.current_span();
        let exported = self.cursor.eat(&TokenKind::Export);
        match self.cursor.current_kind() {
            TokenKind::Program if !exported => {
                self.cursor.advance();
                let (name, name_span) = self.cursor.expect_ident()?;
                if entry == EntryPoint::Functions {
                    return Err(ParseError::new(
                        ErrorCode::E2011,
                        "a function library cannot define programs",
                        start.merge(name_span),
                    ));
                }
                self.claim_name(names, name, name_span)?;
                self.open_unit(UnitKind::Program, name, start);
                self.cursor.expect(&TokenKind::LBrace)?;
                self.parse_block_body()?;
                self.cursor.expect(&TokenKind::RBrace)?;
                self.close_unit(start)
            }
            TokenKind::Function => {
                self.cursor.advance();
                let (name, name_span) = self.cursor.expect_ident()?;
                self.claim_name(names, name, name_span)?;
                self.open_unit(UnitKind::Function, name, start);
                self.unit.exported = exported;
                self.parse_params()?;
                self.cursor.expect(&TokenKind::LBrace)?;
                self.parse_block_body()?;
                self.cursor.expect(&TokenKind::RBrace)?;
                self.close_unit(start)
            }
            other => Err(ParseError::unexpected(
                if exported {
                    "`function`"
                } else {
                    "`program` or `function`"
                },
                &other,
                self.cursor.current_span(),
            )),
        }
    }

    /// `'(' [TYPE IDENT (',' TYPE IDENT)*] ')'`
    fn parse_params(&mut self) -> Result<(), ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        if !self.cursor.check(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (name, span) = self.cursor.expect_ident()?;
                let spelled = self.spell(name);
                let id = self
                    .unit
                    .declare(name, ty, VariableKind::Param, span, &spelled)?;
                self.unit.params.push(id);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(())
    }

    /// Parse the whole input as one statement block.
    pub(crate) fn parse_body_unit(&mut self, name: Name) -> Result<UnitState, ParseError> {
        let start = self.cursor.current_span();
        self.open_unit(UnitKind::Body, name, start);
        while !self.cursor.is_at_end() {
            self.parse_statement()?;
        }
        self.close_unit(start)
    }

    /// Programs and functions share one namespace per parse.
    fn claim_name(
        &self,
        names: &mut FxHashMap<Name, Span>,
        name: Name,
        span: Span,
    ) -> Result<(), ParseError> {
        if let Some(first) = names.get(&name) {
            return Err(ParseError::new(
                ErrorCode::E2004,
                format!("`{}` is defined more than once", self.spell(name)),
                span,
            )
            .with_related(*first, "first defined here"));
        }
        names.insert(name, span);
        Ok(())
    }

    fn open_unit(&mut self, kind: UnitKind, name: Name, start: Span) {
        debug!(kind = kind.describe(), name = %self.spell(name), "open unit");
        self.unit = UnitState::new(kind, name, start);
    }

    /// Resolve forward jumps and wire the default return, then hand the
    /// unit over for linking.
    fn close_unit(&mut self, start: Span) -> Result<UnitState, ParseError> {
        for goto in mem::take(&mut self.unit.gotos) {
            match self.unit.builder.label(goto.label) {
                Some(target) => {
                    self.unit.builder.resolve_pending(goto.node, target);
                }
                None => {
                    return Err(ParseError::new(
                        ErrorCode::E2008,
                        format!(
                            "no label `{}` in this {}",
                            self.spell(goto.label),
                            self.unit.kind.describe()
                        ),
                        goto.span,
                    ))
                }
            }
        }

        if self.unit.kind.returns() {
            let build = self.unit.build;
            let exit = self.unit.exits[0].node;
            self.unit
                .builder
                .push_edge(build, Condition::always(), exit);
        }

        let span = start.merge(self.cursor.previous_span());
        self.unit.span = span;
        debug!(
            kind = self.unit.kind.describe(),
            name = %self.spell(self.unit.name),
            nodes = self.unit.builder.node_count(),
            "close unit"
        );
        Ok(mem::replace(
            &mut self.unit,
            UnitState::new(UnitKind::Program, Name::EMPTY, Span::DUMMY),
        ))
    }

    /// Skip the rest of a unit that failed to parse.
    ///
    /// Restarts from the unit's first token and skips its header and its
    /// brace-balanced body, stopping early at the next unit keyword when
    /// the header never reached a `{`.
    fn recover_unit(&mut self, start: usize) {
        self.cursor.set_position(start);
        while self.at_unit_start() {
            self.cursor.advance();
        }
        while !self.cursor.is_at_end() && !self.at_unit_start() {
            if self.cursor.check(&TokenKind::LBrace) {
                self.cursor.skip_balanced_braces();
                return;
            }
            self.cursor.advance();
        }
    }
}
