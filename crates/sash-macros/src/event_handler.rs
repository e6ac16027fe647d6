//! Implementation of the `#[sash::event_handler]` attribute macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use sash_compiler::{GeneratorConfig, generate_event_interface};
use sash_core::EventInterfaceDeclaration;
use syn::{ItemTrait, parse_macro_input};

use crate::api::generation_error;
use crate::attrs::EventHandlerAttrs;
use crate::signature::{strip_helper_attrs, trait_methods};

pub fn event_handler_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut attrs = EventHandlerAttrs::default();
    let parser = syn::meta::parser(|meta| attrs.parse_meta(meta));
    parse_macro_input!(attr with parser);

    let input = parse_macro_input!(item as ItemTrait);

    match event_handler_inner(&attrs, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn event_handler_inner(attrs: &EventHandlerAttrs, mut input: ItemTrait) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic event interfaces are not supported",
        ));
    }

    let mut declaration = EventInterfaceDeclaration::new(input.ident.to_string());
    for (_, signature) in trait_methods(&input.items)? {
        declaration = declaration.with_callback(signature);
    }
    if let Some(name) = &attrs.name {
        declaration = declaration.with_handler_name(name.clone());
    }

    let mut config = GeneratorConfig::new().with_visibility(input.vis.clone());
    if let Some(library) = &attrs.library {
        config = config.with_library(library.clone());
    }

    let generated = generate_event_interface(&declaration, &config)
        .map_err(|err| generation_error(&input, err))?;

    strip_helper_attrs(&mut input);
    Ok(quote! {
        #input
        #generated
    })
}
