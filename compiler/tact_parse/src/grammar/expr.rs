//! Value expressions.
//!
//! Precedence, lowest first: `||`, `&&`, comparisons, `+ -`, `* / %`,
//! unary `- !`, then member access and primaries. Every expression is typed
//! as it is built; operands of mixed `int`/`double` arithmetic are widened.

use crate::context::{Member, MemberKind};
use crate::stack::ensure_sufficient_stack;
use crate::{ParseError, Parser};
use tact_diagnostic::ErrorCode;
use tact_ir::{
    BinaryOp, ComponentPath, Literal, Name, Span, TokenKind, UnaryOp, ValueExpr, ValueType,
};

/// A typed expression and the source range it was parsed from.
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct SpannedExpr {
    pub expr: ValueExpr,
    pub span: Span,
}

impl SpannedExpr {
    fn new(expr: ValueExpr, span: Span) -> Self {
        SpannedExpr { expr, span }
    }
}

impl Parser<'_> {
    /// Parse an expression.
    ///
    /// Uses `ensure_sufficient_stack` so deeply parenthesized input cannot
    /// overflow the stack.
    pub(crate) fn parse_expr(&mut self) -> Result<SpannedExpr, ParseError> {
        ensure_sufficient_stack(|| self.parse_binary_or())
    }

    fn parse_binary_or(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_binary_and()?;
        while self.cursor.check(&TokenKind::PipePipe) {
            let op_span = self.cursor.advance().span;
            let right = self.parse_binary_and()?;
            left = self.make_binary(BinaryOp::Or, left, right, op_span)?;
        }
        Ok(left)
    }

    fn parse_binary_and(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.cursor.check(&TokenKind::AmpAmp) {
            let op_span = self.cursor.advance().span;
            let right = self.parse_comparison()?;
            left = self.make_binary(BinaryOp::And, left, right, op_span)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.match_comparison_op() {
            let op_span = self.cursor.advance().span;
            let right = self.parse_additive()?;
            left = self.make_binary(op, left, right, op_span)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let op_span = self.cursor.advance().span;
            let right = self.parse_multiplicative()?;
            left = self.make_binary(op, left, right, op_span)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cursor.current_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            let op_span = self.cursor.advance().span;
            let right = self.parse_unary()?;
            left = self.make_binary(op, left, right, op_span)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<SpannedExpr, ParseError> {
        let op = match self.cursor.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let op_span = self.cursor.advance().span;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        let ty = operand.expr.ty();
        let accepted = match op {
            UnaryOp::Neg => ty.is_numeric(),
            UnaryOp::Not => ty == ValueType::Bool,
        };
        if !accepted {
            let symbol = if op == UnaryOp::Neg { "-" } else { "!" };
            return Err(ParseError::new(
                ErrorCode::E2006,
                format!(
                    "cannot apply unary `{symbol}` to `{}`",
                    ty.display(self.interner())
                ),
                operand.span,
            ));
        }
        let span = op_span.merge(operand.span);
        Ok(SpannedExpr::new(
            ValueExpr::Unary {
                op,
                operand: Box::new(operand.expr),
            },
            span,
        ))
    }

    /// Field access on struct values: `pose.x`.
    fn parse_postfix(&mut self) -> Result<SpannedExpr, ParseError> {
        let mut value = self.parse_primary()?;
        while self.cursor.check(&TokenKind::Dot) {
            self.cursor.advance();
            let (field, field_span) = self.cursor.expect_ident()?;
            let ValueType::Struct(def) = value.expr.ty() else {
                return Err(ParseError::new(
                    ErrorCode::E2006,
                    format!(
                        "`{}` has no fields",
                        value.expr.ty().display(self.interner())
                    ),
                    field_span,
                ));
            };
            let Some((index, ty)) = def.field(field) else {
                return Err(ParseError::unknown_name(
                    "field",
                    &format!(
                        "{}.{}",
                        self.interner().lookup(def.name),
                        self.interner().lookup(field)
                    ),
                    field_span,
                ));
            };
            let ty = ty.clone();
            value = SpannedExpr::new(
                ValueExpr::Field {
                    base: Box::new(value.expr),
                    index,
                    ty,
                },
                value.span.merge(field_span),
            );
        }
        Ok(value)
    }

    fn parse_primary(&mut self) -> Result<SpannedExpr, ParseError> {
        let span = self.cursor.current_span();
        let literal = match self.cursor.current_kind() {
            TokenKind::Int(value) => Literal::Int(value),
            TokenKind::Float(bits) => Literal::Double(f64::from_bits(bits)),
            TokenKind::Str(text) => Literal::String(self.interner().lookup(text)),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                let close = self.cursor.expect(&TokenKind::RParen)?.span;
                return Ok(SpannedExpr::new(inner.expr, span.merge(close)));
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                return self.parse_name_expr(name, span);
            }
            other => return Err(make_expected_expr_error(other, span)),
        };
        self.cursor.advance();
        Ok(SpannedExpr::new(ValueExpr::Literal(literal), span))
    }

    /// Resolve an identifier in expression position.
    ///
    /// In order: a root query (`name(...)`), a variable in scope, a peer
    /// followed by `.`, a root attribute.
    fn parse_name_expr(&mut self, name: Name, span: Span) -> Result<SpannedExpr, ParseError> {
        let root = ComponentPath::root();
        if self.cursor.check(&TokenKind::LParen) {
            return self.parse_query(root, name, span);
        }
        if let Some(id) = self.unit.lookup(name) {
            let ty = self.unit.variable(id).ty.clone();
            return Ok(SpannedExpr::new(ValueExpr::Var { id, ty }, span));
        }
        if self.cursor.check(&TokenKind::Dot)
            && self.context.lookup(&root, name, MemberKind::Peer).is_some()
        {
            return self.parse_member_path(name, span);
        }
        if let Some(Member::Attribute(ty)) = self.context.lookup(&root, name, MemberKind::Attribute)
        {
            return Ok(SpannedExpr::new(
                ValueExpr::Attribute {
                    path: root,
                    name,
                    ty,
                },
                span,
            ));
        }
        Err(ParseError::unknown_name("name", &self.spell(name), span))
    }

    /// `peer(.peer)*.member`, where the member is an attribute or a query.
    fn parse_member_path(&mut self, first: Name, start: Span) -> Result<SpannedExpr, ParseError> {
        let mut peers = vec![first];
        loop {
            self.cursor.expect(&TokenKind::Dot)?;
            let (member, member_span) = self.cursor.expect_ident()?;
            let path = ComponentPath::from_peers(peers.iter().copied());
            if self.cursor.check(&TokenKind::LParen) {
                return self.parse_query(path, member, start);
            }
            if self.cursor.check(&TokenKind::Dot)
                && self.context.lookup(&path, member, MemberKind::Peer).is_some()
            {
                peers.push(member);
                continue;
            }
            let span = start.merge(member_span);
            return match self.context.lookup(&path, member, MemberKind::Attribute) {
                Some(Member::Attribute(ty)) => Ok(SpannedExpr::new(
                    ValueExpr::Attribute {
                        path,
                        name: member,
                        ty,
                    },
                    span,
                )),
                _ => Err(ParseError::unknown_name(
                    "attribute",
                    &self.spell_path(&path, member),
                    member_span,
                )),
            };
        }
    }

    /// Arguments and signature check of a synchronous query.
    fn parse_query(
        &mut self,
        path: ComponentPath,
        name: Name,
        start: Span,
    ) -> Result<SpannedExpr, ParseError> {
        let name_span = self.cursor.previous_span();
        let Some(Member::Query(signature)) = self.context.lookup(&path, name, MemberKind::Query)
        else {
            return Err(ParseError::unknown_name(
                "query",
                &self.spell_path(&path, name),
                name_span,
            ));
        };
        let Some(ty) = signature.returns.clone() else {
            return Err(ParseError::unknown_name(
                "query",
                &self.spell_path(&path, name),
                name_span,
            ));
        };
        let args = self.parse_call_args()?;
        let span = start.merge(self.cursor.previous_span());
        let callee = self.spell_path(&path, name);
        let args = self.check_arguments(&callee, &signature.params, args, span)?;
        Ok(SpannedExpr::new(
            ValueExpr::Query {
                path,
                name,
                args,
                ty,
            },
            span,
        ))
    }

    fn match_comparison_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        }
    }

    /// Type-check a binary operation and widen its operands.
    fn make_binary(
        &self,
        op: BinaryOp,
        lhs: SpannedExpr,
        rhs: SpannedExpr,
        op_span: Span,
    ) -> Result<SpannedExpr, ParseError> {
        let (left_ty, right_ty) = (lhs.expr.ty(), rhs.expr.ty());
        let operand_ty = match op {
            BinaryOp::And | BinaryOp::Or => {
                (left_ty == ValueType::Bool && right_ty == ValueType::Bool)
                    .then_some(ValueType::Bool)
            }
            BinaryOp::Add | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
                if left_ty == ValueType::String && right_ty == ValueType::String =>
            {
                Some(ValueType::String)
            }
            BinaryOp::Eq | BinaryOp::NotEq => numeric_join(&left_ty, &right_ty).or_else(|| {
                (left_ty == right_ty && !matches!(left_ty, ValueType::Struct(_)))
                    .then(|| left_ty.clone())
            }),
            _ => numeric_join(&left_ty, &right_ty),
        };
        let Some(operand_ty) = operand_ty else {
            return Err(ParseError::new(
                ErrorCode::E2006,
                format!(
                    "cannot apply `{op}` to `{}` and `{}`",
                    left_ty.display(self.interner()),
                    right_ty.display(self.interner())
                ),
                op_span,
            ));
        };
        let span = lhs.span.merge(rhs.span);
        let lhs = self.coerce(lhs, &operand_ty)?;
        let rhs = self.coerce(rhs, &operand_ty)?;
        let ty = if op.is_comparison() || op.is_logical() {
            ValueType::Bool
        } else {
            operand_ty
        };
        Ok(SpannedExpr::new(
            ValueExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                ty,
            },
            span,
        ))
    }
}

/// Common type of two numeric operands.
fn numeric_join(left: &ValueType, right: &ValueType) -> Option<ValueType> {
    match (left, right) {
        (ValueType::Int, ValueType::Int) => Some(ValueType::Int),
        _ if left.is_numeric() && right.is_numeric() => Some(ValueType::Double),
        _ => None,
    }
}

#[cold]
#[inline(never)]
fn make_expected_expr_error(found: TokenKind, span: Span) -> ParseError {
    ParseError::new(
        ErrorCode::E1002,
        format!("expected expression, found {}", found.display_name()),
        span,
    )
}

