//! Native symbol names.
//!
//! Every native entry point is `{Declaration}_{method}`. The method part is
//! the explicit `native` override when one is given, otherwise the Rust
//! method name in lower camel case followed by the overload discriminator.
//! Resolution is a pure function of the declaration; nothing is numbered.

use sash_core::MethodSignature;

/// `get_count` → `getCount`, `GetCount` → `getCount`.
pub fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (index, segment) in name.split('_').filter(|s| !s.is_empty()).enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Native symbol of `method` on the declaration whose simple name is `declaration`.
pub fn native_symbol(declaration: &str, method: &MethodSignature) -> String {
    if let Some(native) = &method.native_name {
        return format!("{declaration}_{native}");
    }
    format!(
        "{declaration}_{}{}",
        lower_camel(&method.name),
        method.overload.as_deref().unwrap_or_default()
    )
}

/// Symbols of the native side of an event interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSymbols {
    pub create: String,
    pub delete: String,
    pub add_handler: String,
    pub remove_handler: String,
    pub has_handler: String,
    pub count: String,
}

impl EventSymbols {
    pub fn new(handler_name: &str) -> Self {
        let dispatcher = format!("IEventDispatcher_{handler_name}");
        Self {
            create: format!("{handler_name}Impl_create"),
            delete: format!("{handler_name}Impl_delete"),
            add_handler: format!("{dispatcher}_addEventHandler"),
            remove_handler: format!("{dispatcher}_removeEventHandler"),
            has_handler: format!("{dispatcher}_hasEventHandler"),
            count: format!("{dispatcher}_count"),
        }
    }
}
