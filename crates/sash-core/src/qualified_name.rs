use std::fmt;

/// Qualified name identifying a declaration.
///
/// The simple name is what native symbols are derived from; the namespace is
/// the Rust module path the declaration lives in.
///
/// # Examples
///
/// ```
/// use sash_core::QualifiedName;
///
/// let actor = QualifiedName::global("IActor");
/// assert_eq!(actor.to_string(), "IActor");
///
/// let vehicle = QualifiedName::new("IVehicle", vec!["components".into(), "vehicles".into()]);
/// assert_eq!(vehicle.to_string(), "components::vehicles::IVehicle");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Simple name (e.g. "IActor")
    pub name: String,
    /// Module path, empty at the crate root.
    pub namespace: Vec<String>,
}

impl QualifiedName {
    /// Create a new qualified name with namespace.
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a qualified name without a namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a path string (e.g. "components::IEntity").
    ///
    /// Leading "::" is dropped, so "::a::B" == "a::B".
    pub fn from_qualified_string(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split("::")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        match parts.pop() {
            Some(name) => Self {
                name,
                namespace: parts,
            },
            None => Self::global(""),
        }
    }

    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Sibling item in the same namespace.
    ///
    /// Used to locate items generated next to a declaration, e.g. the
    /// capability trait `a::IEntityCapability` next to `a::IEntity`.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: self.namespace.clone(),
        }
    }

    /// Same name with a suffix appended to the simple name.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        self.sibling(format!("{}{}", self.name, suffix))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.namespace.join("::"), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_qualified_string(&s)
    }
}
