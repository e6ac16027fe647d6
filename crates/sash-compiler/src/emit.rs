//! Token helpers shared by the stub and event generators.

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use sash_core::{GenerationError, GenerationResult, PassModifier, ReturnModifier, TypeRef};

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            name != "_" && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Identifier for a declared name, accepting raw identifiers (`r#type`).
pub(crate) fn ident(name: &str) -> GenerationResult<Ident> {
    match name.strip_prefix("r#") {
        Some(raw) if is_identifier(raw) && !matches!(raw, "crate" | "self" | "super" | "Self") => {
            Ok(Ident::new_raw(raw, Span::call_site()))
        }
        None if is_identifier(name) => Ok(Ident::new(name, Span::call_site())),
        _ => Err(GenerationError::InvalidDeclaration(format!(
            "'{name}' is not a valid identifier"
        ))),
    }
}

/// Generated local derived from a declared name: `__{name}_{suffix}`.
pub(crate) fn local(name: &str, suffix: &str) -> Ident {
    format_ident!("__{}_{}", name.trim_start_matches("r#"), suffix)
}

/// Host type of a value, without reference modifiers. Text is `String`.
pub(crate) fn value_type(ty: &TypeRef) -> GenerationResult<TokenStream> {
    Ok(match ty {
        TypeRef::Unit => quote!(()),
        TypeRef::Bool => quote!(bool),
        TypeRef::Text => quote!(::std::string::String),
        TypeRef::Primitive(kind) => {
            let keyword = format_ident!("{}", kind.keyword());
            quote!(#keyword)
        }
        TypeRef::Named(path) => {
            let parsed: syn::Type = syn::parse_str(path)
                .map_err(|err| GenerationError::InvalidType(format!("'{path}': {err}")))?;
            quote!(#parsed)
        }
    })
}

/// Host type of a parameter as it appears in the generated signature.
///
/// Text read by the native side is always borrowed as `&str`.
pub(crate) fn param_type(ty: &TypeRef, modifier: PassModifier) -> GenerationResult<TokenStream> {
    if matches!(ty, TypeRef::Text) && modifier.flows_in() && !modifier.flows_out() {
        return Ok(quote!(&str));
    }
    let base = value_type(ty)?;
    Ok(match modifier {
        PassModifier::ByValue => base,
        PassModifier::In => quote!(&#base),
        PassModifier::Ref | PassModifier::Out => quote!(&mut #base),
    })
}

/// Host return type as it appears in the generated signature.
pub(crate) fn return_type(ty: &TypeRef, modifier: ReturnModifier) -> GenerationResult<TokenStream> {
    let base = value_type(ty)?;
    Ok(match modifier {
        ReturnModifier::Value => base,
        ReturnModifier::ByRef => quote!(&mut #base),
        ReturnModifier::ByRefReadonly => quote!(&#base),
    })
}

/// `-> T`, or nothing for `()`.
pub(crate) fn arrow(ty: Option<&TokenStream>) -> TokenStream {
    match ty {
        Some(ty) => quote!(-> #ty),
        None => TokenStream::new(),
    }
}
