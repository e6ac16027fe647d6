//! API type generation.
//!
//! An API declaration becomes a `#[repr(transparent)]` handle type with one
//! stub per method, a `{Name}Capability` trait whose default methods carry
//! the same stubs, and forwarding glue for every composed capability.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use sash_core::{ApiDeclaration, GenerationError, GenerationResult};
use sash_registry::MarshallerRegistry;

use crate::GeneratorConfig;
use crate::emit;
use crate::sequencer::CallPlan;

/// Path of the capability trait generated for a declaration path.
fn capability_path(declaration: &sash_core::QualifiedName) -> GenerationResult<syn::Path> {
    let path = declaration.with_suffix("Capability").to_string();
    syn::parse_str(&path)
        .map_err(|err| GenerationError::InvalidDeclaration(format!("capability '{path}': {err}")))
}

fn declaration_path(declaration: &sash_core::QualifiedName) -> GenerationResult<syn::Path> {
    let path = declaration.to_string();
    syn::parse_str(&path)
        .map_err(|err| GenerationError::InvalidDeclaration(format!("'{path}': {err}")))
}

/// Plan every method of `declaration`.
pub fn plan_methods(
    declaration: &ApiDeclaration,
    config: &GeneratorConfig,
) -> GenerationResult<Vec<CallPlan>> {
    let registry = MarshallerRegistry::with_bindings(&declaration.marshallers)?;
    declaration
        .methods
        .iter()
        .map(|method| CallPlan::new(declaration.native_prefix(), method, &registry, config))
        .collect()
}

/// Generate the handle type and its glue for `declaration`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate_api(
    declaration: &ApiDeclaration,
    config: &GeneratorConfig,
) -> GenerationResult<TokenStream> {
    declaration.validate()?;
    let plans = plan_methods(declaration, config)?;

    let runtime = config.runtime();
    let vis = config.visibility();
    let name = emit::ident(declaration.name.simple_name())?;
    let capability = format_ident!("{}Capability", declaration.name.simple_name());

    let inherent_prefix = quote!(#vis);
    let inherent_handle = quote!(self.handle);
    let inherent = plans
        .iter()
        .map(|plan| plan.method(&inherent_prefix, &inherent_handle));

    let trait_prefix = TokenStream::new();
    let trait_handle = quote!(#runtime::ApiObject::handle(self));
    let forwarded = plans
        .iter()
        .map(|plan| plan.method(&trait_prefix, &trait_handle));

    let composed = declaration
        .capabilities
        .iter()
        .map(|composed| {
            let capability = capability_path(&composed.name)?;
            let other = declaration_path(&composed.name)?;
            Ok(quote! {
                impl #capability for #name {}

                impl ::core::convert::From<#name> for #other {
                    fn from(value: #name) -> Self {
                        <#other as #runtime::ApiObject>::from_handle(value.handle)
                    }
                }

                impl ::core::convert::From<#other> for #name {
                    fn from(value: #other) -> Self {
                        Self::from_handle(#runtime::ApiObject::handle(&value))
                    }
                }
            })
        })
        .collect::<GenerationResult<Vec<_>>>()?;

    let marker = match declaration.uid {
        Some(uid) if declaration.is_component => quote! {
            impl #runtime::Component for #name {
                const UID: #runtime::Uid = #runtime::Uid::new(#uid);
            }
        },
        Some(uid) if declaration.is_extension => quote! {
            impl #runtime::Extension for #name {
                const UID: #runtime::Uid = #runtime::Uid::new(#uid);
            }
        },
        _ => TokenStream::new(),
    };

    tracing::debug!(
        declaration = %declaration.name,
        methods = plans.len(),
        capabilities = declaration.capabilities.len(),
        "generated api type"
    );

    Ok(quote! {
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis struct #name {
            handle: #runtime::NativeHandle,
        }

        impl #name {
            #vis const fn from_handle(handle: #runtime::NativeHandle) -> Self {
                Self { handle }
            }

            #vis const fn handle(&self) -> #runtime::NativeHandle {
                self.handle
            }

            #(#inherent)*
        }

        impl #runtime::ApiObject for #name {
            fn handle(&self) -> #runtime::NativeHandle {
                self.handle
            }

            fn from_handle(handle: #runtime::NativeHandle) -> Self {
                Self { handle }
            }
        }

        #vis trait #capability: #runtime::ApiObject {
            #(#forwarded)*
        }

        impl #capability for #name {}

        #(#composed)*

        #marker
    })
}
