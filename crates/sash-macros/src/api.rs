//! Implementation of the `#[sash::api]` attribute macro.
//!
//! The annotated trait is consumed: its methods become the declaration and
//! the trait itself is replaced by the generated handle type.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use sash_compiler::{GeneratorConfig, generate_api};
use sash_core::{ApiDeclaration, GenerationError};
use syn::{ItemTrait, parse_macro_input};

use crate::attrs::{ApiAttrs, path_string};
use crate::signature::trait_methods;

pub fn api_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut attrs = ApiAttrs::default();
    let parser = syn::meta::parser(|meta| attrs.parse_meta(meta));
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as ItemTrait);

    match api_inner(&attrs, &input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Map a generation error onto the most specific span available.
pub fn generation_error(input: &ItemTrait, err: GenerationError) -> syn::Error {
    let method = err.method().and_then(|name| {
        input.items.iter().find_map(|item| match item {
            syn::TraitItem::Fn(method) if method.sig.ident == name => Some(&method.sig),
            _ => None,
        })
    });
    match method {
        Some(sig) => syn::Error::new_spanned(sig, err),
        None => syn::Error::new_spanned(&input.ident, err),
    }
}

fn api_inner(attrs: &ApiAttrs, input: &ItemTrait) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic traits cannot be projected across the native boundary",
        ));
    }
    if let Some(default) = input.items.iter().find_map(|item| match item {
        syn::TraitItem::Fn(method) => method.default.as_ref(),
        _ => None,
    }) {
        return Err(syn::Error::new_spanned(
            default,
            "native API methods cannot have a body",
        ));
    }

    let mut declaration = ApiDeclaration::new(input.ident.to_string());
    for (_, signature) in trait_methods(&input.items)? {
        declaration = declaration.with_method(signature);
    }
    for capability in &attrs.compose {
        declaration = declaration.with_capability(path_string(capability));
    }
    for binding in &attrs.marshal {
        declaration = declaration.with_marshaller(binding.clone());
    }
    if let Some(name) = &attrs.name {
        declaration = declaration.with_native_name(name.clone());
    }
    match (attrs.component, attrs.extension) {
        (Some(_), Some(_)) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "a declaration cannot be both a component and an extension",
            ));
        }
        (Some(uid), None) => declaration = declaration.component(uid),
        (None, Some(uid)) => declaration = declaration.extension(uid),
        (None, None) => {}
    }

    let mut config = GeneratorConfig::new().with_visibility(input.vis.clone());
    if let Some(library) = &attrs.library {
        config = config.with_library(library.clone());
    }

    let generated = generate_api(&declaration, &config).map_err(|err| generation_error(input, err))?;

    let docs = input.attrs.iter().filter(|attr| attr.path().is_ident("doc"));
    Ok(quote::quote! {
        #(#docs)*
        #generated
    })
}
