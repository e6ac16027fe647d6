//! API and event-interface declarations.
//!
//! These are the generator's input. A front-end (the attribute macros, or a
//! test building declarations by hand) produces them; the compiler consumes
//! them without ever looking at source syntax again.

use rustc_hash::FxHashSet;

use crate::{GenerationError, GenerationResult, PassModifier, QualifiedName, ReturnModifier, TypeRef};

/// One parameter of a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub modifier: PassModifier,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef, modifier: PassModifier) -> Self {
        Self {
            name: name.into(),
            ty,
            modifier,
        }
    }

    pub fn by_value(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, PassModifier::ByValue)
    }
}

/// A method to project across the native boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: TypeRef,
    pub return_modifier: ReturnModifier,
    /// Replaces the derived method part of the native symbol.
    pub native_name: Option<String>,
    /// Suffix distinguishing overloads that share a native base name.
    pub overload: Option<String>,
}

impl MethodSignature {
    /// A `fn name(&self)` with no parameters returning `()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::Unit,
            return_modifier: ReturnModifier::Value,
            native_name: None,
            overload: None,
        }
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    pub fn returns_by_ref(mut self, ty: TypeRef, modifier: ReturnModifier) -> Self {
        self.return_type = ty;
        self.return_modifier = modifier;
        self
    }

    pub fn native_name(mut self, name: impl Into<String>) -> Self {
        self.native_name = Some(name.into());
        self
    }

    pub fn overload(mut self, discriminator: impl Into<String>) -> Self {
        self.overload = Some(discriminator.into());
        self
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_unit()
    }

    fn validate(&self, owner: &str) -> GenerationResult<()> {
        if self.name.is_empty() {
            return Err(GenerationError::InvalidDeclaration(format!(
                "'{owner}' contains a method without a name"
            )));
        }

        if self.return_type.is_unit() && self.return_modifier.is_by_ref() {
            return Err(GenerationError::InvalidDeclaration(format!(
                "'{owner}::{}' returns a reference to ()",
                self.name
            )));
        }

        let mut seen = FxHashSet::default();
        for param in &self.params {
            if param.ty.is_unit() {
                return Err(GenerationError::InvalidDeclaration(format!(
                    "parameter '{}' of '{owner}::{}' has type ()",
                    param.name, self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(GenerationError::InvalidDeclaration(format!(
                    "parameter '{}' of '{owner}::{}' is declared twice",
                    param.name, self.name
                )));
            }
        }

        Ok(())
    }
}

/// Another declaration whose operations are forwarded through this one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComposedCapability {
    pub name: QualifiedName,
}

impl ComposedCapability {
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self { name: name.into() }
    }
}

/// A declaration-supplied marshaller: values of `ty` cross the boundary
/// through the marshaller type at `marshaller`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarshallerBinding {
    /// Host type path the binding applies to.
    pub ty: String,
    /// Path of the type implementing the runtime marshaller traits.
    pub marshaller: String,
}

impl MarshallerBinding {
    pub fn new(ty: impl Into<String>, marshaller: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            marshaller: marshaller.into(),
        }
    }
}

/// Inherent accessors every generated handle type defines.
const RESERVED_METHOD_NAMES: [&str; 2] = ["handle", "from_handle"];

/// A host-exposed native type and the methods it projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDeclaration {
    pub name: QualifiedName,
    pub methods: Vec<MethodSignature>,
    pub capabilities: Vec<ComposedCapability>,
    pub is_component: bool,
    pub is_extension: bool,
    /// Component or extension UID; present exactly when one of the flags is set.
    pub uid: Option<u64>,
    pub marshallers: Vec<MarshallerBinding>,
    /// Overrides the simple name as the native symbol prefix.
    pub native_name: Option<String>,
}

impl ApiDeclaration {
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            capabilities: Vec::new(),
            is_component: false,
            is_extension: false,
            uid: None,
            marshallers: Vec::new(),
            native_name: None,
        }
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<QualifiedName>) -> Self {
        self.capabilities.push(ComposedCapability::new(capability));
        self
    }

    pub fn component(mut self, uid: u64) -> Self {
        self.is_component = true;
        self.uid = Some(uid);
        self
    }

    pub fn extension(mut self, uid: u64) -> Self {
        self.is_extension = true;
        self.uid = Some(uid);
        self
    }

    pub fn with_marshaller(mut self, binding: MarshallerBinding) -> Self {
        self.marshallers.push(binding);
        self
    }

    pub fn with_native_name(mut self, name: impl Into<String>) -> Self {
        self.native_name = Some(name.into());
        self
    }

    /// Prefix of every native symbol: the native name when set, otherwise
    /// the simple name.
    pub fn native_prefix(&self) -> &str {
        self.native_name.as_deref().unwrap_or(self.name.simple_name())
    }

    /// Check the structural invariants of the declaration.
    ///
    /// Strategy-dependent checks (such as by-ref returns of marshalled types)
    /// happen in the compiler once strategies are resolved.
    pub fn validate(&self) -> GenerationResult<()> {
        let owner = self.name.to_string();

        if self.name.name.is_empty() {
            return Err(GenerationError::InvalidDeclaration(
                "declaration has no name".into(),
            ));
        }

        if self.native_name.as_deref() == Some("") {
            return Err(GenerationError::InvalidDeclaration(format!(
                "'{owner}' has an empty native name"
            )));
        }

        if self.is_component && self.is_extension {
            return Err(GenerationError::InvalidDeclaration(format!(
                "'{owner}' cannot be both a component and an extension"
            )));
        }

        if self.uid.is_some() != (self.is_component || self.is_extension) {
            return Err(GenerationError::InvalidDeclaration(format!(
                "'{owner}' must carry a UID exactly when it is a component or an extension"
            )));
        }

        let mut methods = FxHashSet::default();
        for method in &self.methods {
            method.validate(&owner)?;
            if RESERVED_METHOD_NAMES.contains(&method.name.as_str()) {
                return Err(GenerationError::ReservedMethodName {
                    declaration: owner,
                    method: method.name.clone(),
                });
            }
            if !methods.insert(method.name.as_str()) {
                return Err(GenerationError::DuplicateMethod {
                    declaration: owner,
                    method: method.name.clone(),
                });
            }
        }

        let mut capabilities = FxHashSet::default();
        for capability in &self.capabilities {
            if capability.name == self.name {
                return Err(GenerationError::InvalidDeclaration(format!(
                    "'{owner}' cannot compose itself"
                )));
            }
            if !capabilities.insert(&capability.name) {
                return Err(GenerationError::DuplicateCapability {
                    declaration: owner,
                    capability: capability.name.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// A host callback interface that native code raises events through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInterfaceDeclaration {
    pub name: QualifiedName,
    /// Callbacks in declaration order; this order is the native
    /// function-pointer table layout.
    pub callbacks: Vec<MethodSignature>,
    /// Name the native side knows the handler by.
    pub handler_name: String,
}

impl EventInterfaceDeclaration {
    /// New interface with the default handler name (see [`default_handler_name`]).
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        let name = name.into();
        let handler_name = default_handler_name(name.simple_name());
        Self {
            name,
            callbacks: Vec::new(),
            handler_name,
        }
    }

    pub fn with_handler_name(mut self, handler_name: impl Into<String>) -> Self {
        self.handler_name = handler_name.into();
        self
    }

    pub fn with_callback(mut self, callback: MethodSignature) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn validate(&self) -> GenerationResult<()> {
        let owner = self.name.to_string();

        if self.handler_name.is_empty() {
            return Err(GenerationError::InvalidDeclaration(format!(
                "event interface '{owner}' has an empty handler name"
            )));
        }

        if self.callbacks.is_empty() {
            return Err(GenerationError::InvalidDeclaration(format!(
                "event interface '{owner}' declares no callbacks"
            )));
        }

        let mut seen = FxHashSet::default();
        for callback in &self.callbacks {
            callback.validate(&owner)?;
            if !seen.insert(callback.name.as_str()) {
                return Err(GenerationError::DuplicateMethod {
                    declaration: owner,
                    method: callback.name.clone(),
                });
            }
            if callback.return_modifier.is_by_ref() {
                return Err(GenerationError::UnsupportedCallback {
                    interface: owner,
                    method: callback.name.clone(),
                    reason: "callbacks cannot return by reference".into(),
                });
            }
        }

        Ok(())
    }
}

/// Native handler name for an interface: a leading `I` marker is dropped
/// (`IVehicleEventHandler` → `VehicleEventHandler`).
pub fn default_handler_name(interface: &str) -> String {
    let mut chars = interface.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_ascii_uppercase() => interface[1..].to_string(),
        _ => interface.to_string(),
    }
}
