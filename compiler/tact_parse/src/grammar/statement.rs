//! Statements and control constructs.
//!
//! Every statement starts on the unit's build node, which is blank at that
//! point. Simple statements fill it and proceed to a fresh node; constructs
//! open a frame, wire their branch and loop edges around the nested blocks,
//! and leave the build node on their join or exit node.

use crate::unit::{FrameKind, PendingCall, UnitKind};
use crate::{ParseError, Parser};
use std::sync::Arc;
use tact_diagnostic::ErrorCode;
use tact_ir::{Command, Condition, DispatchMode, FunctionId, NodeId, Span, TokenKind};
use tracing::debug;

impl Parser<'_> {
    /// Statements up to (not including) the closing `}`.
    pub(crate) fn parse_block_body(&mut self) -> Result<(), ParseError> {
        while !self.cursor.check(&TokenKind::RBrace) {
            if self.cursor.is_at_end() {
                return Err(ParseError::unexpected(
                    "`}`",
                    &TokenKind::Eof,
                    self.cursor.current_span(),
                ));
            }
            self.parse_statement()?;
        }
        Ok(())
    }

    /// `'{' block '}'` in its own variable scope.
    pub(crate) fn parse_braced_block(&mut self) -> Result<(), ParseError> {
        self.cursor.expect(&TokenKind::LBrace)?;
        self.unit.push_scope();
        self.parse_block_body()?;
        self.unit.pop_scope();
        self.cursor.expect(&TokenKind::RBrace)?;
        Ok(())
    }

    /// `[IDENT ':'] core [';']`
    pub(crate) fn parse_statement(&mut self) -> Result<(), ParseError> {
        while self.cursor.at_label() {
            let (label, span) = self.cursor.expect_ident()?;
            self.cursor.advance();
            let spelled = self.spell(label);
            self.unit.bind_label(label, span, &spelled)?;
        }

        match self.cursor.current_kind() {
            TokenKind::Var | TokenKind::Const => self.parse_declaration()?,
            TokenKind::Set => self.parse_assignment()?,
            TokenKind::Do => self.parse_do()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Break => self.parse_break()?,
            TokenKind::Continue => self.parse_continue()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Call => self.parse_call()?,
            TokenKind::Goto => self.parse_goto()?,
            other => {
                return Err(ParseError::unexpected(
                    "statement",
                    &other,
                    self.cursor.current_span(),
                ))
            }
        }
        self.cursor.eat(&TokenKind::Semicolon);
        Ok(())
    }

    /// `'do' callpart [until]`
    fn parse_do(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::Do)?.span;
        self.parse_dispatch(start)
    }

    /// Issue a callpart on the build node, with its termination clauses.
    fn parse_dispatch(&mut self, start: Span) -> Result<(), ParseError> {
        let part = self.parse_callpart()?;
        let clauses = if self.cursor.check(&TokenKind::Until) {
            self.parse_until()?
        } else {
            Vec::new()
        };
        let node = self.unit.issue(part.command, start.merge(part.span));
        self.wire_step(node, clauses, part.done);
        Ok(())
    }

    /// `'try' ('{' block '}' | callpart [until]) ['catch' '{' block '}']`
    ///
    /// Commands issued inside get a failure edge in front of their other
    /// edges: to the catch block, or past the try when there is none.
    fn parse_try(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::Try)?.span;
        self.unit.push_frame(
            FrameKind::Try { issued: Vec::new() },
            Some(DispatchMode::Try),
            self.options.max_nesting,
            start,
        )?;
        debug!(depth = self.unit.frames.len(), "open try");

        if self.cursor.check(&TokenKind::LBrace) {
            self.parse_braced_block()?;
        } else {
            self.parse_dispatch(start)?;
        }

        let issued = match self.unit.pop_frame() {
            Some(frame) => match frame.kind {
                FrameKind::Try { issued } => issued,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };
        let after = self.unit.build;

        if self.cursor.eat(&TokenKind::Catch) {
            let catch_entry = self.unit.builder.add_node(self.cursor.current_span());
            self.route_failures(&issued, catch_entry);
            self.unit.build = catch_entry;
            self.parse_braced_block()?;
            let catch_end = self.unit.build;
            self.unit
                .builder
                .push_edge(catch_end, Condition::always(), after);
            self.unit.build = after;
        } else {
            self.route_failures(&issued, after);
        }
        debug!(routed = issued.len(), "close try");
        Ok(())
    }

    fn route_failures(&mut self, issued: &[NodeId], target: NodeId) {
        for &node in issued {
            if let Some(failed) = self
                .unit
                .builder
                .command(node)
                .and_then(Command::failure_condition)
            {
                self.unit.builder.insert_edge_front(node, failed, target);
            }
        }
    }

    /// `'if' condition 'then' ifblock ['else' ifblock]`
    fn parse_if(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::If)?.span;
        let condition = self.parse_condition()?;
        self.cursor.expect(&TokenKind::Then)?;
        self.unit
            .push_frame(FrameKind::Branch, None, self.options.max_nesting, start)?;
        debug!(depth = self.unit.frames.len(), "open if");

        let branch = self.unit.build;
        let then_entry = self.unit.builder.add_node(self.cursor.current_span());
        self.unit
            .builder
            .push_edge(branch, Arc::clone(&condition), then_entry);
        self.unit.build = then_entry;
        self.parse_if_block()?;
        let then_end = self.unit.build;

        let join = if self.cursor.eat(&TokenKind::Else) {
            let else_entry = self.unit.builder.add_node(self.cursor.current_span());
            self.unit
                .builder
                .push_edge(branch, Condition::negate(&condition), else_entry);
            self.unit.build = else_entry;
            self.parse_if_block()?;
            let else_end = self.unit.build;
            let join = self.unit.builder.add_node(self.cursor.current_span());
            self.unit
                .builder
                .push_edge(else_end, Condition::always(), join);
            join
        } else {
            let join = self.unit.builder.add_node(self.cursor.current_span());
            self.unit
                .builder
                .push_edge(branch, Condition::negate(&condition), join);
            join
        };
        self.unit
            .builder
            .push_edge(then_end, Condition::always(), join);
        self.unit.build = join;

        self.unit.pop_frame();
        debug!(depth = self.unit.frames.len(), "close if");
        Ok(())
    }

    /// `'{' block '}' | statement`
    fn parse_if_block(&mut self) -> Result<(), ParseError> {
        if self.cursor.check(&TokenKind::LBrace) {
            self.parse_braced_block()
        } else {
            self.unit.push_scope();
            self.parse_statement()?;
            self.unit.pop_scope();
            Ok(())
        }
    }

    /// `'while' condition '{' block '}'`
    fn parse_while(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::While)?.span;
        let condition = self.parse_condition()?;

        let head = self.unit.build;
        let body = self.unit.builder.add_node(self.cursor.current_span());
        let exit = self.unit.builder.add_node(start);
        self.unit
            .builder
            .push_edge(head, Arc::clone(&condition), body);
        self.unit
            .builder
            .push_edge(head, Condition::negate(&condition), exit);

        self.unit.push_frame(
            FrameKind::Loop { resume: head, exit },
            None,
            self.options.max_nesting,
            start,
        )?;
        debug!(depth = self.unit.frames.len(), "open while");
        self.unit.build = body;
        self.parse_braced_block()?;
        let body_end = self.unit.build;
        self.unit
            .builder
            .push_edge(body_end, Condition::always(), head);
        self.unit.build = exit;
        self.unit.pop_frame();
        debug!(depth = self.unit.frames.len(), "close while");
        Ok(())
    }

    /// `'for' '(' [simple] ';' condition ';' [simple] ')' '{' block '}'`
    ///
    /// The initializer runs once before the head. The increment gets its
    /// own node, which the body end and `continue` lead to before the
    /// condition is checked again.
    fn parse_for(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::For)?.span;
        self.cursor.expect(&TokenKind::LParen)?;
        self.unit.push_scope();

        if !self.cursor.check(&TokenKind::Semicolon) {
            self.parse_simple()?;
        }
        self.cursor.expect(&TokenKind::Semicolon)?;
        let condition = self.parse_condition()?;
        self.cursor.expect(&TokenKind::Semicolon)?;

        let head = self.unit.build;
        let body = self.unit.builder.add_node(start);
        let step = self.unit.builder.add_node(self.cursor.current_span());
        let exit = self.unit.builder.add_node(start);
        self.unit
            .builder
            .push_edge(head, Arc::clone(&condition), body);
        self.unit
            .builder
            .push_edge(head, Condition::negate(&condition), exit);

        self.unit.build = step;
        if !self.cursor.check(&TokenKind::RParen) {
            self.parse_simple()?;
        }
        let step_end = self.unit.build;
        self.unit
            .builder
            .push_edge(step_end, Condition::always(), head);
        self.cursor.expect(&TokenKind::RParen)?;

        self.unit.push_frame(
            FrameKind::Loop { resume: step, exit },
            None,
            self.options.max_nesting,
            start,
        )?;
        debug!(depth = self.unit.frames.len(), "open for");
        self.unit.build = body;
        self.parse_braced_block()?;
        let body_end = self.unit.build;
        self.unit
            .builder
            .push_edge(body_end, Condition::always(), step);
        self.unit.build = exit;
        self.unit.pop_frame();
        self.unit.pop_scope();
        debug!(depth = self.unit.frames.len(), "close for");
        Ok(())
    }

    /// `decl | set | ['do'] command` inside a `for` header.
    fn parse_simple(&mut self) -> Result<(), ParseError> {
        match self.cursor.current_kind() {
            TokenKind::Var | TokenKind::Const => self.parse_declaration(),
            TokenKind::Set => self.parse_assignment(),
            _ => {
                let start = self.cursor.current_span();
                self.cursor.eat(&TokenKind::Do);
                let (command, id, span) = self.parse_command()?;
                self.unit.issue(command, start.merge(span));
                self.unit
                    .proceed(Arc::new(Condition::CommandDone(id)), span);
                Ok(())
            }
        }
    }

    fn parse_break(&mut self) -> Result<(), ParseError> {
        let span = self.cursor.expect(&TokenKind::Break)?.span;
        let Some((_, exit)) = self.unit.innermost_loop() else {
            return Err(make_outside_error("break", "a loop", span));
        };
        self.unit.jump(exit, span);
        Ok(())
    }

    fn parse_continue(&mut self) -> Result<(), ParseError> {
        let span = self.cursor.expect(&TokenKind::Continue)?.span;
        let Some((resume, _)) = self.unit.innermost_loop() else {
            return Err(make_outside_error("continue", "a loop", span));
        };
        self.unit.jump(resume, span);
        Ok(())
    }

    /// `'return' [IDENT]`
    ///
    /// An identifier directly after `return` is a return label, unless it
    /// labels the next statement.
    fn parse_return(&mut self) -> Result<(), ParseError> {
        let span = self.cursor.expect(&TokenKind::Return)?.span;
        if self.unit.kind == UnitKind::Program {
            return Err(make_outside_error("return", "a function", span));
        }
        let label = if self.cursor.check_ident() && !self.cursor.at_label() {
            Some(self.cursor.expect_ident()?.0)
        } else {
            None
        };
        let exit = self.unit.exit(label, span);
        self.unit.jump(exit, span);
        Ok(())
    }

    /// `'goto' IDENT`
    fn parse_goto(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::Goto)?.span;
        let (label, span) = self.cursor.expect_ident()?;
        let from = self.unit.build;
        self.unit.goto(from, Condition::always(), label, span);
        self.unit.build = self.unit.builder.add_node(start);
        Ok(())
    }

    /// `'call' IDENT '(' [expr (',' expr)*] ')' ('on' IDENT jump)*`
    ///
    /// The callee is looked up when the whole input has been read, so it may
    /// be defined further down.
    fn parse_call(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.expect(&TokenKind::Call)?.span;
        let (callee, callee_span) = self.cursor.expect_ident()?;
        let args = self.parse_call_args()?;
        let args_end = self.cursor.previous_span();

        let mut labels = Vec::new();
        let mut clauses = Vec::new();
        while self.cursor.eat(&TokenKind::On) {
            let (label, label_span) = self.cursor.expect_ident()?;
            let jump = self.parse_jump()?;
            labels.push((label, label_span));
            clauses.push((Arc::new(Condition::CallReturned(Some(label))), jump));
        }

        let arg_types = args.iter().map(|arg| arg.expr.ty()).collect();
        let arg_spans = args.iter().map(|arg| arg.span).collect();
        let command = Command::Call {
            callee,
            function: FunctionId::UNRESOLVED,
            args: args.into_iter().map(|arg| arg.expr).collect(),
        };
        let node = self.unit.issue(command, start.merge(args_end));
        self.unit.calls.push(PendingCall {
            node,
            callee,
            arg_types,
            arg_spans,
            labels,
            span: callee_span,
        });
        debug!(callee = %self.spell(callee), "recorded call");
        self.wire_step(node, clauses, Arc::new(Condition::CallReturned(None)));
        Ok(())
    }
}

#[cold]
#[inline(never)]
fn make_outside_error(keyword: &str, construct: &str, span: Span) -> ParseError {
    ParseError::new(
        ErrorCode::E2005,
        format!("`{keyword}` outside of {construct}"),
        span,
    )
}
