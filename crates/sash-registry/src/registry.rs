//! Predicate → strategy table.
//!
//! Resolution is a linear walk over explicitly registered entries. The
//! table is built once per declaration (built-ins plus the declaration's
//! own `marshal(..)` bindings) and only read afterwards.
//!
//! # Thread Safety
//!
//! Lookups take `&self` and never mutate; a built registry can be shared
//! freely.

use rustc_hash::FxHashSet;
use sash_core::{GenerationError, GenerationResult, MarshallerBinding, TypeRef};

use crate::strategy::MarshallerStrategy;

/// Selects the host types a strategy applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypePredicate {
    IsBool,
    IsText,
    /// A specific type, by path. Stored normalized (no whitespace, no
    /// leading `::`).
    IsNamed(String),
}

impl TypePredicate {
    pub fn named(path: &str) -> Self {
        let normalized: String = path.split_whitespace().collect();
        TypePredicate::IsNamed(normalized.trim_start_matches("::").to_string())
    }

    pub fn matches(&self, ty: &TypeRef) -> bool {
        match self {
            TypePredicate::IsBool => matches!(ty, TypeRef::Bool),
            TypePredicate::IsText => matches!(ty, TypeRef::Text),
            TypePredicate::IsNamed(path) => match (TypeRef::from_path(path), ty) {
                (TypeRef::Named(_), TypeRef::Named(other)) => {
                    let other = match TypePredicate::named(other) {
                        TypePredicate::IsNamed(other) => other,
                        _ => return false,
                    };
                    if &other == path {
                        return true;
                    }
                    // A single-segment binding matches by simple name.
                    !path.contains("::") && ty.simple_name() == Some(path.as_str())
                }
                (target, ty) => target == *ty,
            },
        }
    }

    pub fn name(&self) -> String {
        match self {
            TypePredicate::IsBool => "bool".into(),
            TypePredicate::IsText => "text".into(),
            TypePredicate::IsNamed(path) => format!("named({path})"),
        }
    }
}

/// The marshaller strategy table.
#[derive(Debug, Clone, Default)]
pub struct MarshallerRegistry {
    entries: Vec<(TypePredicate, MarshallerStrategy)>,
    predicates: FxHashSet<TypePredicate>,
}

impl MarshallerRegistry {
    /// An empty registry: every type passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in strategies: `bool` and text.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.push(TypePredicate::IsBool, MarshallerStrategy::BooleanNormalize);
        registry.push(TypePredicate::IsText, MarshallerStrategy::TextView);
        registry
    }

    /// Built-ins plus a declaration's own bindings.
    pub fn with_bindings(bindings: &[MarshallerBinding]) -> GenerationResult<Self> {
        let mut registry = Self::builtin();
        for binding in bindings {
            registry.register(
                TypePredicate::named(&binding.ty),
                MarshallerStrategy::custom(&binding.marshaller)?,
            )?;
        }
        Ok(registry)
    }

    fn push(&mut self, predicate: TypePredicate, strategy: MarshallerStrategy) {
        self.predicates.insert(predicate.clone());
        self.entries.push((predicate, strategy));
    }

    /// Add an entry. The same predicate cannot be registered twice.
    pub fn register(
        &mut self,
        predicate: TypePredicate,
        strategy: MarshallerStrategy,
    ) -> GenerationResult<()> {
        if self.predicates.contains(&predicate) {
            return Err(GenerationError::DuplicateMarshaller {
                predicate: predicate.name(),
            });
        }
        self.push(predicate, strategy);
        Ok(())
    }

    /// Strategy for `ty`.
    ///
    /// `Ok(None)` means the type is already native-compatible. More than one
    /// matching predicate is an error, never a silent pick.
    pub fn resolve(&self, ty: &TypeRef) -> GenerationResult<Option<&MarshallerStrategy>> {
        if ty.is_unit() {
            return Ok(None);
        }

        let mut matched = self
            .entries
            .iter()
            .filter(|(predicate, _)| predicate.matches(ty));

        let Some((_, first)) = matched.next() else {
            return Ok(None);
        };

        let rest: Vec<_> = matched.collect();
        if !rest.is_empty() {
            let candidates = self
                .entries
                .iter()
                .filter(|(predicate, _)| predicate.matches(ty))
                .map(|(predicate, _)| predicate.name())
                .collect();
            return Err(GenerationError::AmbiguousStrategy {
                ty: ty.to_string(),
                candidates,
            });
        }

        Ok(Some(first))
    }

    /// Like [`resolve`](Self::resolve), with pass-through folded into `None`.
    pub fn resolve_marshalled(&self, ty: &TypeRef) -> GenerationResult<Option<&MarshallerStrategy>> {
        Ok(self.resolve(ty)?.filter(|strategy| !strategy.is_pass_through()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
