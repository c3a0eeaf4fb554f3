//! Graph shapes produced by statements and constructs.

use super::{node, targets, TestCtx};
use crate::ParseOptions;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tact_ir::{
    Command, CommandId, CommandStatus, ComponentPath, Condition, DispatchMode, StateSnapshot,
    Value,
};

fn done(id: u32) -> Arc<Condition> {
    Arc::new(Condition::CommandDone(CommandId::new(id)))
}

fn failed(id: u32) -> Arc<Condition> {
    Arc::new(Condition::CommandFailed(CommandId::new(id)))
}

#[test]
fn test_single_command_program() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do a()");
    let graph = &program.graph;

    assert_eq!(graph.node_count(), 2);
    assert_eq!(ctx.invoked(graph, graph.entry()).as_deref(), Some("a"));
    assert_eq!(graph.edges(graph.entry()).len(), 1);
    assert_eq!(graph.edges(graph.entry())[0].guard, done(0));
    assert_eq!(program.exit.unwrap(), node(1));
    assert!(graph.node(program.exit.unwrap()).is_terminal());
    assert_eq!(graph.terminals(), vec![program.exit.unwrap()]);
}

#[test]
fn test_empty_program_is_its_own_exit() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("");
    assert_eq!(program.graph.node_count(), 1);
    assert_eq!(program.exit.unwrap(), program.graph.entry());
}

#[test]
fn test_sequence_gated_by_done() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do a(); do b()");
    let graph = &program.graph;

    let a = graph.entry();
    let b = graph.edges(a)[0].target;
    assert_eq!(ctx.invoked(graph, a).as_deref(), Some("a"));
    assert_eq!(ctx.invoked(graph, b).as_deref(), Some("b"));
    assert_eq!(graph.edges(a)[0].guard, done(0));
    assert_eq!(graph.edges(b)[0].guard, done(1));
    assert_eq!(graph.edges(b)[0].target, program.exit.unwrap());
}

#[test]
fn test_and_chain_waits_for_every_command() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do a() and arm.open() and b()");
    let graph = &program.graph;

    let Some(Command::Composite(parts)) = graph.node(graph.entry()).command() else {
        panic!("expected a composite command");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(
        graph.edges(graph.entry())[0].guard,
        Arc::new(Condition::And(vec![done(0), done(1), done(2)]))
    );
}

#[test]
fn test_peer_command_path() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do arm.gripper.grip(3)");
    let graph = &program.graph;
    assert_eq!(
        ctx.invoked(graph, graph.entry()).as_deref(),
        Some("arm.gripper.grip")
    );
}

#[test]
fn test_if_else_two_edges_to_one_join() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("if ready then do a() else do b()");
    let graph = &program.graph;

    let branch = graph.entry();
    let edges = graph.edges(branch);
    assert_eq!(edges.len(), 2);
    assert!(matches!(*edges[0].guard, Condition::Expr(_)));
    assert_eq!(edges[1].guard, Condition::negate(&edges[0].guard));

    let then_node = edges[0].target;
    let else_node = edges[1].target;
    assert_eq!(ctx.invoked(graph, then_node).as_deref(), Some("a"));
    assert_eq!(ctx.invoked(graph, else_node).as_deref(), Some("b"));
    assert_eq!(targets(graph, then_node), vec![program.exit.unwrap()]);
    assert_eq!(targets(graph, else_node), vec![program.exit.unwrap()]);
}

#[test]
fn test_if_condition_selects_branch() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("if ready then { do a() } else { do b() }");
    let graph = &program.graph;
    let ready = ctx.name("ready");

    let mut state = StateSnapshot::new();
    state.set_member(ComponentPath::root(), ready, Value::Bool(true));
    let taken = graph.select_edge(graph.entry(), &state).unwrap().unwrap();
    assert_eq!(ctx.invoked(graph, taken.target).as_deref(), Some("a"));

    state.set_member(ComponentPath::root(), ready, Value::Bool(false));
    let taken = graph.select_edge(graph.entry(), &state).unwrap().unwrap();
    assert_eq!(ctx.invoked(graph, taken.target).as_deref(), Some("b"));
}

#[test]
fn test_if_without_else_falls_through_to_join() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("if ready then do a(); do b()");
    let graph = &program.graph;

    let edges = graph.edges(graph.entry());
    assert_eq!(edges.len(), 2);
    let join = edges[1].target;
    assert_eq!(ctx.invoked(graph, join).as_deref(), Some("b"));
    assert_eq!(targets(graph, edges[0].target), vec![join]);
}

#[test]
fn test_if_keeps_join_node_without_collapse() {
    let ctx = TestCtx::new();
    let options = ParseOptions {
        collapse_pass_through: false,
        ..ParseOptions::default()
    };
    let output = ctx.parse_with("program p { if ready then do a() else do b() }", &options);
    assert!(output.errors.is_empty());
    let program = &output.programs[0];
    let graph = &program.graph;

    // branch, then, then-done, else, else-done, join
    assert_eq!(graph.node_count(), 6);
    assert_eq!(graph.edges(graph.entry()).len(), 2);
    let then_done = targets(graph, graph.edges(graph.entry())[0].target)[0];
    let else_done = targets(graph, graph.edges(graph.entry())[1].target)[0];
    assert_eq!(targets(graph, then_done), vec![program.exit.unwrap()]);
    assert_eq!(targets(graph, else_done), vec![program.exit.unwrap()]);
}

#[test]
fn test_while_loop_shape() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("while ready { do a() }");
    let graph = &program.graph;

    let head = graph.entry();
    let edges = graph.edges(head);
    assert_eq!(edges.len(), 2);
    let body = edges[0].target;
    assert_eq!(edges[1].target, program.exit.unwrap());
    assert_eq!(edges[1].guard, Condition::negate(&edges[0].guard));
    assert_eq!(ctx.invoked(graph, body).as_deref(), Some("a"));
    // The body's done edge leads back to the head.
    assert_eq!(targets(graph, body), vec![head]);
    assert!(!graph.has_unconditional_cycle());
}

#[test]
fn test_break_goes_to_loop_exit() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("while ready { do a(); break; do b() } do c()");
    let graph = &program.graph;

    let head = graph.entry();
    let body = graph.edges(head)[0].target;
    let exit = graph.edges(head)[1].target;
    assert_eq!(targets(graph, body), vec![exit]);
    assert_eq!(ctx.invoked(graph, exit).as_deref(), Some("c"));
    // `do b()` after the break is unreachable and pruned.
    assert!(graph
        .nodes()
        .all(|(id, _)| ctx.invoked(graph, id).as_deref() != Some("b")));
}

#[test]
fn test_unreachable_kept_without_pruning() {
    let ctx = TestCtx::new();
    let options = ParseOptions {
        prune_unreachable: false,
        ..ParseOptions::default()
    };
    let output = ctx.parse_with("program p { while ready { break; do b() } }", &options);
    assert!(output.errors.is_empty());
    let graph = &output.programs[0].graph;
    assert!(graph
        .nodes()
        .any(|(id, _)| ctx.invoked(graph, id).as_deref() == Some("b")));
}

#[test]
fn test_continue_goes_to_loop_head() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("while ready { do a(); continue }");
    let graph = &program.graph;
    let head = graph.entry();
    let body = graph.edges(head)[0].target;
    assert_eq!(targets(graph, body), vec![head]);
}

#[test]
fn test_nested_break_leaves_inner_loop_only() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("while ready { while arm.busy { break } do a() }");
    let graph = &program.graph;

    let outer = graph.entry();
    let inner = graph.edges(outer)[0].target;
    let inner_exit = graph.edges(inner)[1].target;
    assert_eq!(graph.edges(inner).len(), 2);
    // The inner body is only a break, so the inner condition leads to its exit.
    assert_eq!(graph.edges(inner)[0].target, inner_exit);
    assert_eq!(ctx.invoked(graph, inner_exit).as_deref(), Some("a"));
    assert_eq!(targets(graph, inner_exit), vec![outer]);
}

#[test]
fn test_for_loop_shape() {
    let ctx = TestCtx::new();
    let program =
        ctx.program_of("for (var int i = 0; i < 3; set i = i + 1) { do a() } do b()");
    let graph = &program.graph;

    let init = graph.entry();
    assert!(matches!(
        graph.node(init).command(),
        Some(Command::Assign { .. })
    ));
    let head = targets(graph, init)[0];
    let head_edges = graph.edges(head);
    assert_eq!(head_edges.len(), 2);
    let body = head_edges[0].target;
    let exit = head_edges[1].target;
    assert_eq!(ctx.invoked(graph, body).as_deref(), Some("a"));
    assert_eq!(ctx.invoked(graph, exit).as_deref(), Some("b"));

    let step = targets(graph, body)[0];
    assert!(matches!(
        graph.node(step).command(),
        Some(Command::Assign { .. })
    ));
    assert_eq!(targets(graph, step), vec![head]);
    assert_eq!(graph.variables().len(), 1);
}

#[test]
fn test_for_continue_runs_increment() {
    let ctx = TestCtx::new();
    let program =
        ctx.program_of("for (var int i = 0; i < 3; set i = i + 1) { if ready then continue; do a() }");
    let graph = &program.graph;

    let head = targets(graph, graph.entry())[0];
    let body = graph.edges(head)[0].target;
    let continue_target = graph.edges(body)[0].target;
    assert!(matches!(
        graph.node(continue_target).command(),
        Some(Command::Assign { .. })
    ));
    assert_eq!(targets(graph, continue_target), vec![head]);
}

#[test]
fn test_for_with_command_increment() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("for (; arm.busy; do arm.close()) { do a() }");
    let graph = &program.graph;

    let head = graph.entry();
    let body = graph.edges(head)[0].target;
    let step = targets(graph, body)[0];
    assert_eq!(ctx.invoked(graph, step).as_deref(), Some("arm.close"));
    assert_eq!(targets(graph, step), vec![head]);
}

#[test]
fn test_try_block_routes_failures_to_catch() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("try { do a(); do b() } catch { do c() }");
    let graph = &program.graph;

    let a = graph.entry();
    let a_edges = graph.edges(a);
    assert_eq!(a_edges.len(), 2);
    assert_eq!(a_edges[0].guard, failed(0));
    assert_eq!(a_edges[1].guard, done(0));
    let catch = a_edges[0].target;
    let b = a_edges[1].target;

    let b_edges = graph.edges(b);
    assert_eq!(b_edges[0].guard, failed(1));
    assert_eq!(b_edges[0].target, catch);
    assert_eq!(b_edges[1].target, program.exit.unwrap());

    assert_eq!(ctx.invoked(graph, catch).as_deref(), Some("c"));
    assert_eq!(targets(graph, catch), vec![program.exit.unwrap()]);

    assert_eq!(graph.node(a).mode(), DispatchMode::Try);
    assert_eq!(graph.node(b).mode(), DispatchMode::Try);
    assert_eq!(graph.node(catch).mode(), DispatchMode::Do);
}

#[test]
fn test_try_failure_takes_priority() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("try a() and b() catch { do c() }");
    let graph = &program.graph;

    let mut state = StateSnapshot::new();
    state
        .set_status(CommandId::new(0), CommandStatus::Done)
        .set_status(CommandId::new(1), CommandStatus::Failed);
    let taken = graph.select_edge(graph.entry(), &state).unwrap().unwrap();
    assert_eq!(ctx.invoked(graph, taken.target).as_deref(), Some("c"));

    state.set_status(CommandId::new(1), CommandStatus::Done);
    let taken = graph.select_edge(graph.entry(), &state).unwrap().unwrap();
    assert_eq!(taken.target, program.exit.unwrap());
}

#[test]
fn test_try_without_catch_swallows_failure() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("try a(); do b()");
    let graph = &program.graph;

    let edges = graph.edges(graph.entry());
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].guard, failed(0));
    assert_eq!(edges[0].target, edges[1].target);
    assert_eq!(ctx.invoked(graph, edges[1].target).as_deref(), Some("b"));
}

#[test]
fn test_do_mode_has_no_failure_edge() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do a() and b()");
    let graph = &program.graph;
    assert_eq!(graph.edges(graph.entry()).len(), 1);
    assert_eq!(graph.node(graph.entry()).mode(), DispatchMode::Do);
}

#[test]
fn test_nested_try_routes_to_innermost_catch() {
    let ctx = TestCtx::new();
    let program =
        ctx.program_of("try { try { do a() } catch { do b() } do c() } catch { do say(\"outer\") }");
    let graph = &program.graph;

    let a = graph.entry();
    let inner_catch = graph.edges(a)[0].target;
    assert_eq!(ctx.invoked(graph, inner_catch).as_deref(), Some("b"));
    // The inner catch is still inside the outer try.
    let outer_catch = graph.edges(inner_catch)[0].target;
    assert_eq!(ctx.invoked(graph, outer_catch).as_deref(), Some("say"));
    assert_eq!(graph.node(inner_catch).mode(), DispatchMode::Try);
}

#[test]
fn test_assignments_do_not_get_failure_edges() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("var int n = 0; try { set n = 1 } catch { do a() }");
    let graph = &program.graph;
    for (id, _) in graph.nodes() {
        assert!(graph
            .edges(id)
            .iter()
            .all(|edge| !matches!(*edge.guard, Condition::CommandFailed(_))));
    }
}

#[test]
fn test_until_clauses_come_before_done() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("top: do a() until { if ready then continue if arm.busy then goto top } do b()");
    let graph = &program.graph;

    let a = graph.entry();
    let edges = graph.edges(a);
    assert_eq!(edges.len(), 3);
    let next = edges[2].target;
    assert_eq!(edges[0].target, next);
    assert_eq!(edges[1].target, a);
    assert_eq!(edges[2].guard, done(0));
    assert_eq!(ctx.invoked(graph, next).as_deref(), Some("b"));
    assert_eq!(graph.label(ctx.name("top")), Some(a));
}

#[test]
fn test_forward_goto_resolves() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("goto finish; do a(); finish: do b()");
    let graph = &program.graph;

    let entry = graph.entry();
    let finish = graph.label(ctx.name("finish")).unwrap();
    assert_eq!(targets(graph, entry), vec![finish]);
    assert_eq!(ctx.invoked(graph, finish).as_deref(), Some("b"));
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn test_backward_goto_forms_guarded_loop() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("again: do a(); if ready then goto again");
    let graph = &program.graph;

    let a = graph.entry();
    let branch = targets(graph, a)[0];
    assert_eq!(graph.edges(branch)[0].target, a);
    assert!(!graph.has_unconditional_cycle());
}

#[test]
fn test_endless_loop_has_no_exit() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("while true { do a() }");
    let graph = &program.graph;

    assert_eq!(program.exit, None);
    assert_eq!(graph.node_count(), 2);
    let body = targets(graph, graph.entry())[0];
    assert_eq!(ctx.invoked(graph, body).as_deref(), Some("a"));
    assert_eq!(targets(graph, body), vec![graph.entry()]);
}

#[test]
fn test_trailing_goto_leaves_no_orphan_exit() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("again: do a(); goto again");
    let graph = &program.graph;

    assert_eq!(program.exit, None);
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.label(ctx.name("again")), Some(graph.entry()));
    assert_eq!(targets(graph, graph.entry()), vec![graph.entry()]);
}

#[test]
fn test_labelled_jump_node_is_not_collapsed() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("do a(); skip: goto finish; finish: do b()");
    let graph = &program.graph;

    let skip = graph.label(ctx.name("skip")).unwrap();
    let finish = graph.label(ctx.name("finish")).unwrap();
    assert_eq!(targets(graph, graph.entry()), vec![skip]);
    assert!(graph.node(skip).command().is_none());
    assert_eq!(targets(graph, skip), vec![finish]);
    assert_eq!(ctx.invoked(graph, finish).as_deref(), Some("b"));
}

#[test]
fn test_declaration_without_initializer_creates_no_node() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("var int n; do a()");
    let graph = &program.graph;
    assert_eq!(ctx.invoked(graph, graph.entry()).as_deref(), Some("a"));
    assert_eq!(graph.variables().len(), 1);
}

#[test]
fn test_assignment_node() {
    let ctx = TestCtx::new();
    let program = ctx.program_of("var double d = 1; set d = d * 2");
    let graph = &program.graph;

    let first = graph.entry();
    let Some(Command::Assign { target, value }) = graph.node(first).command() else {
        panic!("expected an assignment");
    };
    assert_eq!(graph.variable(*target).name, ctx.name("d"));
    // `1` is widened to the declared type.
    assert!(matches!(value, tact_ir::ValueExpr::Widen(_)));
    assert!(graph.edges(first)[0].guard.is_always_true());

    let second = graph.edges(first)[0].target;
    assert!(matches!(
        graph.node(second).command(),
        Some(Command::Assign { .. })
    ));
}

#[test]
fn test_sibling_scopes_may_reuse_names() {
    let ctx = TestCtx::new();
    let program = ctx.program_of(
        "if ready then { var int n = 1 } else { var int n = 2 } while ready { var int n = 3 }",
    );
    assert_eq!(program.graph.variables().len(), 3);
}

#[test]
fn test_labels_and_spans_survive() {
    let ctx = TestCtx::new();
    let source = "program p {\n  start: do a()\n}";
    let program = ctx.program(source);
    assert_eq!(program.graph.label(ctx.name("start")), Some(program.graph.entry()));
    assert_eq!(program.span.start, 0);
    assert_eq!(program.span.end as usize, source.len());
    let a_span = program.graph.node(program.graph.entry()).span();
    assert_eq!(&source[a_span.to_range()], "do a()");
}

#[test]
fn test_semicolons_are_optional() {
    let ctx = TestCtx::new();
    let with = ctx.program_of("do a(); do b();");
    let without = ctx.program_of("do a() do b()");
    assert_eq!(with.graph.node_count(), without.graph.node_count());
    for (id, node) in with.graph.nodes() {
        assert_eq!(node.command(), without.graph.node(id).command());
        assert_eq!(node.edges(), without.graph.edges(id));
    }
}
