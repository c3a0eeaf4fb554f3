//! Function linking.
//!
//! Units are parsed independently; calls only record the callee's name.
//! Once every unit is known, each call is checked against the callee's
//! parameters and return labels. A unit with a bad call is dropped, which
//! may in turn break its callers, so checking repeats until nothing more
//! drops. The survivors get dense [`FunctionId`]s, their call nodes are
//! patched, and every graph is frozen.

use crate::unit::{PendingCall, UnitKind, UnitState};
use crate::{ParseError, ParseOptions};
use rustc_hash::{FxHashMap, FxHashSet};
use tact_diagnostic::ErrorCode;
use tact_ir::{
    Command, FunctionGraph, FunctionId, Name, NodeId, ProgramGraph, ReturnExit, StringInterner,
    ValueType,
};
use tracing::debug;

pub(crate) struct Linked {
    pub programs: Vec<ProgramGraph>,
    pub functions: Vec<FunctionGraph>,
    pub errors: Vec<ParseError>,
}

/// Link and freeze the parsed units.
///
/// With `exported_only`, functions neither exported nor called from an
/// exported function are left out, unless nothing is exported at all.
pub(crate) fn link(
    mut units: Vec<UnitState>,
    interner: &StringInterner,
    options: &ParseOptions,
    exported_only: bool,
) -> Linked {
    let registry: FxHashMap<Name, usize> = units
        .iter()
        .enumerate()
        .filter(|(_, unit)| unit.kind == UnitKind::Function)
        .map(|(index, unit)| (unit.name, index))
        .collect();

    let mut alive = vec![true; units.len()];
    let mut errors = Vec::new();
    loop {
        let mut dropped = false;
        for index in 0..units.len() {
            if !alive[index] {
                continue;
            }
            if let Err(error) = check_calls(&units, index, &registry, &alive, interner) {
                debug!(
                    unit = %interner.lookup(units[index].name),
                    code = %error.code,
                    "unit dropped during linking"
                );
                alive[index] = false;
                errors.push(error);
                dropped = true;
            }
        }
        if !dropped {
            break;
        }
    }

    let kept = kept_functions(&units, &alive, &registry, exported_only);
    let ids: FxHashMap<Name, FunctionId> = units
        .iter()
        .enumerate()
        .filter(|(index, _)| kept.contains(index))
        .enumerate()
        .map(|(id, (_, unit))| (unit.name, function_id(id)))
        .collect();

    for index in 0..units.len() {
        if alive[index] {
            patch_calls(&mut units, index, &registry, &ids);
        }
    }

    let mut programs = Vec::new();
    let mut functions = Vec::new();
    let mut bodies = Vec::new();
    for (index, unit) in units.into_iter().enumerate() {
        if !alive[index] {
            continue;
        }
        match unit.kind {
            UnitKind::Program => programs.push(freeze_program(unit, options)),
            UnitKind::Function if kept.contains(&index) => {
                functions.push(freeze_function(unit, options));
            }
            UnitKind::Function => {}
            UnitKind::Body => bodies.push(freeze_function(unit, options)),
        }
    }
    functions.extend(bodies);

    Linked {
        programs,
        functions,
        errors,
    }
}

/// First bad call of a unit, if any.
fn check_calls(
    units: &[UnitState],
    index: usize,
    registry: &FxHashMap<Name, usize>,
    alive: &[bool],
    interner: &StringInterner,
) -> Result<(), ParseError> {
    for call in &units[index].calls {
        let callee_name = interner.lookup(call.callee);
        let Some(&callee_index) = registry.get(&call.callee) else {
            return Err(ParseError::new(
                ErrorCode::E2002,
                format!("cannot find function `{callee_name}`"),
                call.span,
            ));
        };
        if !alive[callee_index] {
            return Err(ParseError::new(
                ErrorCode::E2002,
                format!("function `{callee_name}` failed to build"),
                call.span,
            )
            .with_note("see the error reported for that function"));
        }
        let callee = &units[callee_index];
        check_call(call, callee, &callee_name, interner)?;
    }
    Ok(())
}

fn check_call(
    call: &PendingCall,
    callee: &UnitState,
    callee_name: &str,
    interner: &StringInterner,
) -> Result<(), ParseError> {
    let params = param_types(callee);
    if params.len() != call.arg_types.len() {
        return Err(ParseError::argument_count(
            callee_name,
            params.len(),
            call.arg_types.len(),
            call.span,
        ));
    }
    for ((param, arg), span) in params.iter().zip(&call.arg_types).zip(&call.arg_spans) {
        if !param.accepts(arg) {
            return Err(ParseError::type_mismatch(
                &param.display(interner),
                &arg.display(interner),
                *span,
            ));
        }
    }
    for (label, span) in &call.labels {
        if !callee.exits.iter().any(|exit| exit.label == Some(*label)) {
            return Err(ParseError::new(
                ErrorCode::E2010,
                format!(
                    "function `{callee_name}` never returns through `{}`",
                    interner.lookup(*label)
                ),
                *span,
            )
            .with_related(callee.span, "function defined here"));
        }
    }
    Ok(())
}

fn param_types(unit: &UnitState) -> Vec<ValueType> {
    unit.params
        .iter()
        .map(|param| unit.variable(*param).ty.clone())
        .collect()
}

/// Indices of the function units that make it into the output.
fn kept_functions(
    units: &[UnitState],
    alive: &[bool],
    registry: &FxHashMap<Name, usize>,
    exported_only: bool,
) -> FxHashSet<usize> {
    let live_functions = units
        .iter()
        .enumerate()
        .filter(|(index, unit)| alive[*index] && unit.kind == UnitKind::Function);

    let roots: Vec<usize> = live_functions
        .clone()
        .filter(|(_, unit)| unit.exported)
        .map(|(index, _)| index)
        .collect();
    if !exported_only || roots.is_empty() {
        return live_functions.map(|(index, _)| index).collect();
    }

    let mut kept = FxHashSet::default();
    let mut work = roots;
    while let Some(index) = work.pop() {
        if !kept.insert(index) {
            continue;
        }
        work.extend(
            units[index]
                .calls
                .iter()
                .filter_map(|call| registry.get(&call.callee).copied()),
        );
    }
    kept
}

/// Bind call nodes to their callee's id and widen arguments to the
/// parameter types.
fn patch_calls(
    units: &mut [UnitState],
    index: usize,
    registry: &FxHashMap<Name, usize>,
    ids: &FxHashMap<Name, FunctionId>,
) {
    let calls = units[index].calls.clone();
    for call in calls {
        let (Some(&callee_index), Some(&id)) = (registry.get(&call.callee), ids.get(&call.callee))
        else {
            continue;
        };
        let params = param_types(&units[callee_index]);
        if let Some(Command::Call { function, args, .. }) =
            units[index].builder.command_mut(call.node)
        {
            *function = id;
            for (arg, ty) in args.iter_mut().zip(&params) {
                if let Some(widened) = arg.clone().coerce_to(ty) {
                    *arg = widened;
                }
            }
        }
    }
}

fn freeze_program(unit: UnitState, options: &ParseOptions) -> ProgramGraph {
    let exit = unit.build;
    let (graph, map) = unit.builder.finish(
        &[exit],
        options.prune_unreachable,
        options.collapse_pass_through,
    );
    let exit = map.get(exit);
    if exit.is_none() {
        debug!(program = ?unit.name, "program end is unreachable");
    }
    ProgramGraph {
        name: unit.name,
        span: unit.span,
        graph,
        exit,
    }
}

fn freeze_function(unit: UnitState, options: &ParseOptions) -> FunctionGraph {
    let keep: Vec<NodeId> = unit.exits.iter().map(|exit| exit.node).collect();
    let (graph, map) = unit.builder.finish(
        &keep,
        options.prune_unreachable,
        options.collapse_pass_through,
    );
    let exits = unit
        .exits
        .iter()
        .filter_map(|exit| {
            map.get(exit.node).map(|node| ReturnExit {
                label: exit.label,
                node,
            })
        })
        .collect();
    FunctionGraph {
        name: unit.name,
        span: unit.span,
        graph,
        params: unit.params,
        exits,
        exported: unit.exported,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "function count is bounded by source length"
)]
fn function_id(index: usize) -> FunctionId {
    FunctionId::new(index as u32)
}
