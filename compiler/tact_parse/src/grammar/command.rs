//! Component commands.
//!
//! A command is a method-style call on the root component or a peer. Each
//! one gets a fresh [`CommandId`] so its implicit done condition can be
//! referenced by guards without owning the command.

use crate::context::{Member, MemberKind};
use crate::{ParseError, Parser};
use std::sync::Arc;
use tact_diagnostic::ErrorCode;
use tact_ir::{Command, CommandId, ComponentPath, Condition, Name, NodeId, Span, TokenKind};

/// Where a termination clause or an `on` clause sends control.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Jump {
    /// `continue`: the statement after the current one.
    Next,
    Goto(Name, Span),
}

/// A `do`/`try` payload: the commands and the condition that completes them.
pub(crate) struct CallPart {
    pub command: Command,
    pub done: Arc<Condition>,
    pub span: Span,
}

impl Parser<'_> {
    /// `IDENT ('.' IDENT)* '(' [expr (',' expr)*] ')'`
    pub(crate) fn parse_command(&mut self) -> Result<(Command, CommandId, Span), ParseError> {
        let (mut name, start) = self.cursor.expect_ident()?;
        let mut name_span = start;
        let mut peers = Vec::new();
        while self.cursor.eat(&TokenKind::Dot) {
            let path = ComponentPath::from_peers(peers.iter().copied());
            if self.context.lookup(&path, name, MemberKind::Peer).is_none() {
                return Err(ParseError::unknown_name(
                    "peer",
                    &self.spell_path(&path, name),
                    name_span,
                ));
            }
            peers.push(name);
            (name, name_span) = self.cursor.expect_ident()?;
        }
        let path = ComponentPath::from_peers(peers);
        let Some(Member::Command(signature)) =
            self.context.lookup(&path, name, MemberKind::Command)
        else {
            return Err(ParseError::unknown_name(
                "command",
                &self.spell_path(&path, name),
                name_span,
            ));
        };
        let args = self.parse_call_args()?;
        let span = start.merge(self.cursor.previous_span());
        let callee = self.spell_path(&path, name);
        let args = self.check_arguments(&callee, &signature.params, args, span)?;
        let id = self.unit.builder.next_command_id();
        Ok((
            Command::Invoke {
                id,
                path,
                name,
                args,
            },
            id,
            span,
        ))
    }

    /// `command ('and' command)*`
    ///
    /// Commands chained with `and` are dispatched together; the chain is
    /// done once every command is.
    pub(crate) fn parse_callpart(&mut self) -> Result<CallPart, ParseError> {
        let (first, first_id, mut span) = self.parse_command()?;
        let mut commands = vec![first];
        let mut done = vec![Arc::new(Condition::CommandDone(first_id))];
        while self.cursor.eat(&TokenKind::And) {
            let (command, id, command_span) = self.parse_command()?;
            commands.push(command);
            done.push(Arc::new(Condition::CommandDone(id)));
            span = span.merge(command_span);
        }
        let command = if commands.len() == 1 {
            commands.remove(0)
        } else {
            Command::Composite(commands)
        };
        Ok(CallPart {
            command,
            done: Condition::all(done),
            span,
        })
    }

    /// `'until' '{' ('if' condition 'then' jump)+ '}'`
    pub(crate) fn parse_until(&mut self) -> Result<Vec<(Arc<Condition>, Jump)>, ParseError> {
        self.cursor.expect(&TokenKind::Until)?;
        self.cursor.expect(&TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        loop {
            self.cursor.expect(&TokenKind::If)?;
            let condition = self.parse_condition()?;
            self.cursor.expect(&TokenKind::Then)?;
            clauses.push((condition, self.parse_jump()?));
            self.cursor.eat(&TokenKind::Semicolon);
            if self.cursor.eat(&TokenKind::RBrace) {
                return Ok(clauses);
            }
        }
    }

    /// `'continue' | 'goto' IDENT`
    pub(crate) fn parse_jump(&mut self) -> Result<Jump, ParseError> {
        match self.cursor.current_kind() {
            TokenKind::Continue => {
                self.cursor.advance();
                Ok(Jump::Next)
            }
            TokenKind::Goto => {
                self.cursor.advance();
                let (label, span) = self.cursor.expect_ident()?;
                Ok(Jump::Goto(label, span))
            }
            other => Err(ParseError::new(
                ErrorCode::E1001,
                format!("expected `continue` or `goto`, found {}", other.display_name()),
                self.cursor.current_span(),
            )),
        }
    }

    /// Wire the edges out of a filled node: the clause edges in the order
    /// written, then `done` to the next statement.
    pub(crate) fn wire_step(
        &mut self,
        node: NodeId,
        clauses: Vec<(Arc<Condition>, Jump)>,
        done: Arc<Condition>,
    ) {
        let next = self.unit.builder.add_node(self.cursor.current_span());
        for (guard, jump) in clauses {
            match jump {
                Jump::Next => {
                    self.unit.builder.push_edge(node, guard, next);
                }
                Jump::Goto(label, span) => self.unit.goto(node, guard, label, span),
            }
        }
        self.unit.builder.push_edge(node, done, next);
        self.unit.build = next;
    }
}
