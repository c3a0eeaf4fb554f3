//! A concrete, in-memory component tree.

use super::{ComponentContext, Member, MemberKind, Signature};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tact_ir::{ComponentPath, Name, StringInterner, StructType, ValueType};

/// A component with attributes, queries, commands and nested peers.
///
/// Struct types live on the root and are visible from every peer.
#[derive(Clone, Debug, Default)]
pub struct Component {
    attributes: FxHashMap<Name, ValueType>,
    queries: FxHashMap<Name, Signature>,
    commands: FxHashMap<Name, Signature>,
    peers: FxHashMap<Name, Component>,
    structs: FxHashMap<Name, Arc<StructType>>,
}

impl Component {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, name: Name, ty: ValueType) -> Self {
        self.attributes.insert(name, ty);
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: Name, params: Vec<ValueType>, returns: ValueType) -> Self {
        self.queries.insert(name, Signature::query(params, returns));
        self
    }

    #[must_use]
    pub fn with_command(mut self, name: Name, params: Vec<ValueType>) -> Self {
        self.commands.insert(name, Signature::command(params));
        self
    }

    #[must_use]
    pub fn with_peer(mut self, name: Name, peer: Component) -> Self {
        self.peers.insert(name, peer);
        self
    }

    #[must_use]
    pub fn with_struct(mut self, def: StructType) -> Self {
        self.structs.insert(def.name, Arc::new(def));
        self
    }

    fn descend(&self, path: &ComponentPath) -> Option<&Component> {
        path.peers()
            .iter()
            .try_fold(self, |component, peer| component.peers.get(peer))
    }
}

impl ComponentContext for Component {
    fn lookup(&self, path: &ComponentPath, name: Name, kind: MemberKind) -> Option<Member> {
        let component = self.descend(path)?;
        match kind {
            MemberKind::Peer => component.peers.get(&name).map(|_| Member::Peer),
            MemberKind::Attribute => component
                .attributes
                .get(&name)
                .cloned()
                .map(Member::Attribute),
            MemberKind::Query => component.queries.get(&name).cloned().map(Member::Query),
            MemberKind::Command => component.commands.get(&name).cloned().map(Member::Command),
        }
    }

    fn struct_type(&self, name: Name) -> Option<Arc<StructType>> {
        self.structs.get(&name).cloned()
    }
}

/// Errors raised while turning a [`ComponentSpec`] into a [`Component`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("unknown type `{ty}` in {owner}")]
    UnknownType { ty: String, owner: String },
    #[error("struct `{0}` is declared twice")]
    DuplicateStruct(String),
    #[error("query `{0}` has no result type")]
    MissingResult(String),
}

/// Serialized form of a component description.
///
/// ```json
/// {
///   "structs": [{ "name": "pose", "fields": [["x", "double"], ["y", "double"]] }],
///   "attributes": { "ready": "bool" },
///   "queries": { "distance": { "params": ["double"], "returns": "double" } },
///   "commands": { "home": {} },
///   "peers": { "arm": { "commands": { "move_to": { "params": ["pose"] } } } }
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentSpec {
    pub structs: Vec<StructSpec>,
    pub attributes: BTreeMap<String, String>,
    pub queries: BTreeMap<String, SignatureSpec>,
    pub commands: BTreeMap<String, SignatureSpec>,
    pub peers: BTreeMap<String, ComponentSpec>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructSpec {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignatureSpec {
    pub params: Vec<String>,
    pub returns: Option<String>,
}

impl ComponentSpec {
    /// Resolve type names and intern every member name.
    ///
    /// Struct fields may only refer to structs declared before them.
    pub fn build(&self, interner: &StringInterner) -> Result<Component, ContextError> {
        let mut structs: FxHashMap<Name, Arc<StructType>> = FxHashMap::default();
        for spec in &self.structs {
            let name = interner.intern(&spec.name);
            if structs.contains_key(&name) {
                return Err(ContextError::DuplicateStruct(spec.name.clone()));
            }
            let fields = spec
                .fields
                .iter()
                .map(|(field, ty)| {
                    let owner = format!("struct `{}`", spec.name);
                    Ok((interner.intern(field), resolve_type(ty, &structs, interner, &owner)?))
                })
                .collect::<Result<Vec<_>, ContextError>>()?;
            structs.insert(name, Arc::new(StructType { name, fields }));
        }

        let mut root = self.build_members(&structs, interner, "root component")?;
        root.structs = structs;
        Ok(root)
    }

    fn build_members(
        &self,
        structs: &FxHashMap<Name, Arc<StructType>>,
        interner: &StringInterner,
        owner: &str,
    ) -> Result<Component, ContextError> {
        let mut component = Component::new();
        for (name, ty) in &self.attributes {
            let ty = resolve_type(ty, structs, interner, &format!("attribute `{name}`"))?;
            component = component.with_attribute(interner.intern(name), ty);
        }
        for (name, sig) in &self.queries {
            let owner = format!("query `{name}`");
            let params = resolve_types(&sig.params, structs, interner, &owner)?;
            let Some(returns) = &sig.returns else {
                return Err(ContextError::MissingResult(name.clone()));
            };
            let returns = resolve_type(returns, structs, interner, &owner)?;
            component = component.with_query(interner.intern(name), params, returns);
        }
        for (name, sig) in &self.commands {
            let params = resolve_types(&sig.params, structs, interner, &format!("command `{name}`"))?;
            component = component.with_command(interner.intern(name), params);
        }
        for (name, peer) in &self.peers {
            let nested = peer.build_members(structs, interner, &format!("peer `{name}` of {owner}"))?;
            component = component.with_peer(interner.intern(name), nested);
        }
        Ok(component)
    }
}

fn resolve_types(
    names: &[String],
    structs: &FxHashMap<Name, Arc<StructType>>,
    interner: &StringInterner,
    owner: &str,
) -> Result<Vec<ValueType>, ContextError> {
    names
        .iter()
        .map(|ty| resolve_type(ty, structs, interner, owner))
        .collect()
}

fn resolve_type(
    ty: &str,
    structs: &FxHashMap<Name, Arc<StructType>>,
    interner: &StringInterner,
    owner: &str,
) -> Result<ValueType, ContextError> {
    match ty {
        "int" => Ok(ValueType::Int),
        "double" => Ok(ValueType::Double),
        "bool" => Ok(ValueType::Bool),
        "string" => Ok(ValueType::String),
        other => interner
            .get(other)
            .and_then(|name| structs.get(&name))
            .map(|def| ValueType::Struct(Arc::clone(def)))
            .ok_or_else(|| ContextError::UnknownType {
                ty: other.to_string(),
                owner: owner.to_string(),
            }),
    }
}
