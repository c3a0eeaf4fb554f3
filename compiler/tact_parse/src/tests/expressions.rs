//! Typing and evaluation of parsed expressions and conditions.

use super::TestCtx;
use pretty_assertions::assert_eq;
use tact_diagnostic::ErrorCode;
use tact_ir::{
    BinaryOp, Command, ComponentPath, Condition, Graph, StateSnapshot, Value, ValueExpr,
    ValueType,
};

/// Value stored by the first assignment of `var TYPE v = <expr>`.
fn initializer(ctx: &TestCtx, ty: &str, expr: &str) -> (Graph, ValueExpr) {
    let program = ctx.program_of(&format!("var {ty} v = {expr}"));
    let graph = program.graph;
    let Some(Command::Assign { value, .. }) = graph.node(graph.entry()).command() else {
        panic!("expected an assignment for {expr:?}");
    };
    let value = value.clone();
    (graph, value)
}

fn eval(ctx: &TestCtx, ty: &str, expr: &str) -> Value {
    let (_, value) = initializer(ctx, ty, expr);
    value.evaluate(&StateSnapshot::new()).unwrap()
}

fn error_code(ctx: &TestCtx, statements: &str) -> ErrorCode {
    ctx.errors(&format!("program p {{ {statements} }}"))[0].code
}

#[test]
fn test_precedence() {
    let ctx = TestCtx::new();
    let (_, value) = initializer(&ctx, "int", "1 + 2 * 3");
    let ValueExpr::Binary { op, rhs, .. } = &value else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        **rhs,
        ValueExpr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
    assert_eq!(eval(&ctx, "int", "1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval(&ctx, "int", "(1 + 2) * 3"), Value::Int(9));
    assert_eq!(eval(&ctx, "int", "10 - 4 - 3"), Value::Int(3));
    assert_eq!(eval(&ctx, "int", "-2 * 3 % 4"), Value::Int(-2));
}

#[test]
fn test_mixed_arithmetic_widens() {
    let ctx = TestCtx::new();
    let (_, value) = initializer(&ctx, "double", "1 + 0.5");
    assert_eq!(value.ty(), ValueType::Double);
    assert_eq!(eval(&ctx, "double", "1 + 0.5"), Value::Double(1.5));
    assert_eq!(eval(&ctx, "double", "3"), Value::Double(3.0));
}

#[test]
fn test_boolean_operators() {
    let ctx = TestCtx::new();
    assert_eq!(eval(&ctx, "bool", "1 < 2 && !(2 < 1)"), Value::Bool(true));
    assert_eq!(eval(&ctx, "bool", "false || 1.5 >= 2"), Value::Bool(false));
    assert_eq!(eval(&ctx, "bool", "1 == 1.0"), Value::Bool(true));
    assert_eq!(eval(&ctx, "bool", "\"a\" != \"b\""), Value::Bool(true));
}

#[test]
fn test_string_concatenation() {
    let ctx = TestCtx::new();
    assert_eq!(
        eval(&ctx, "string", "\"arm \" + \"ready\""),
        Value::String("arm ready".into())
    );
}

#[test]
fn test_attribute_and_peer_paths() {
    let ctx = TestCtx::new();
    let (_, value) = initializer(&ctx, "double", "arm.gripper.force + speed");
    let ValueExpr::Binary { lhs, rhs, .. } = value else {
        panic!("expected a binary expression");
    };
    let ValueExpr::Attribute { path, name, .. } = *lhs else {
        panic!("expected an attribute");
    };
    assert_eq!(
        path,
        ComponentPath::from_peers([ctx.name("arm"), ctx.name("gripper")])
    );
    assert_eq!(name, ctx.name("force"));
    assert!(matches!(
        *rhs,
        ValueExpr::Attribute { ref path, .. } if path.is_root()
    ));
}

#[test]
fn test_query_arguments_are_widened() {
    let ctx = TestCtx::new();
    let (_, value) = initializer(&ctx, "double", "distance(2) + arm.reach()");
    let ValueExpr::Binary { lhs, .. } = value else {
        panic!("expected a binary expression");
    };
    let ValueExpr::Query { args, ty, .. } = *lhs else {
        panic!("expected a query");
    };
    assert_eq!(ty, ValueType::Double);
    assert!(matches!(args[0], ValueExpr::Widen(_)));
}

#[test]
fn test_struct_field_access() {
    let ctx = TestCtx::new();
    let (_, value) = initializer(&ctx, "double", "target.y");
    let ValueExpr::Field { index, ty, .. } = value else {
        panic!("expected a field access");
    };
    assert_eq!(index, 1);
    assert_eq!(ty, ValueType::Double);

    let mut state = StateSnapshot::new();
    state.set_member(
        ComponentPath::root(),
        ctx.name("target"),
        Value::Struct(vec![Value::Double(1.0), Value::Double(2.5)].into()),
    );
    let (_, value) = initializer(&ctx, "double", "target.y");
    assert_eq!(value.evaluate(&state).unwrap(), Value::Double(2.5));
}

#[test]
fn test_struct_variables() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("var pose goal = target; var double gx = goal.x");
    assert_eq!(program.graph.variables().len(), 2);
}

#[test]
fn test_variables_resolve_before_attributes() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("var int speed = 1; var int n = speed");
    let graph = &program.graph;
    let second = graph.edges(graph.entry())[0].target;
    let Some(Command::Assign { value, .. }) = graph.node(second).command() else {
        panic!("expected an assignment");
    };
    assert!(matches!(value, ValueExpr::Var { .. }));
}

#[test]
fn test_condition_connectives_are_lowered() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("if ready && !arm.busy || ok() then do a()");
    let graph = &program.graph;
    let guard = &graph.edges(graph.entry())[0].guard;
    let Condition::Or(items) = &**guard else {
        panic!("expected a disjunction, found {guard:?}");
    };
    let Condition::And(left) = &*items[0] else {
        panic!("expected a conjunction");
    };
    assert!(matches!(*left[0], Condition::Expr(_)));
    assert!(matches!(*left[1], Condition::Not(_)));
    assert!(matches!(*items[1], Condition::Expr(ValueExpr::Query { .. })));
}

#[test]
fn test_literal_true_condition_is_unconditional() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("if true then do a() else do b()");
    let graph = &program.graph;
    let edges = graph.edges(graph.entry());
    // The else edge would follow an always-true edge and is never built.
    assert_eq!(edges.len(), 1);
    assert!(edges[0].guard.is_always_true());
}

#[test]
fn test_expression_errors() {
    let ctx = TestCtx::new();
    assert_eq!(error_code(&ctx, "var int x = \"text\""), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var int x = 1.5"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var int x = \"a\" - \"b\""), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var bool x = !1"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var bool x = ready && 1"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var double x = speed.x"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var double x = target.z"), ErrorCode::E2001);
    assert_eq!(error_code(&ctx, "var int x = nothing"), ErrorCode::E2001);
    assert_eq!(error_code(&ctx, "var double x = arm.nothing"), ErrorCode::E2001);
    assert_eq!(error_code(&ctx, "var double x = nothing()"), ErrorCode::E2001);
    assert_eq!(error_code(&ctx, "var double x = distance()"), ErrorCode::E2007);
    assert_eq!(error_code(&ctx, "var double x = distance(\"far\")"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var int x = ;"), ErrorCode::E1002);
    assert_eq!(error_code(&ctx, "var int x = (1 + 2"), ErrorCode::E1001);
    assert_eq!(error_code(&ctx, "if 1 then do a()"), ErrorCode::E2006);
    assert_eq!(error_code(&ctx, "var gadget g"), ErrorCode::E2001);
    assert_eq!(error_code(&ctx, "var 1 g"), ErrorCode::E1004);
}

#[test]
fn test_type_error_points_at_operand() {
    let ctx = TestCtx::new();
    let source = "program p { var int x = \"text\" }";
    let errors = ctx.errors(source);
    assert_eq!(&source[errors[0].span.to_range()], "\"text\"");
    assert_eq!(errors[0].message, "type mismatch: expected `int`, found `string`");
}

#[test]
fn test_deep_parentheses_do_not_overflow() {
    let ctx = TestCtx::new();
    let depth = 2_000;
    let expr = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(eval(&ctx, "int", &expr), Value::Int(1));
}
