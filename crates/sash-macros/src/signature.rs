//! Trait method → [`MethodSignature`] conversion.

use sash_core::{MethodSignature, Parameter, PassModifier, ReturnModifier, TypeRef};
use syn::{FnArg, Pat, ReturnType, TraitItem, TraitItemFn, Type};

use crate::attrs::{MethodAttrs, ParamAttrs, is_sash_attr};

/// Host type text of a non-reference type.
fn type_text(ty: &Type) -> String {
    match ty {
        Type::Path(path) => quote::quote!(#path).to_string().replace(' ', ""),
        other => quote::quote!(#other).to_string(),
    }
}

fn is_str(ty: &Type) -> bool {
    matches!(ty, Type::Path(path) if path.qself.is_none() && path.path.is_ident("str"))
}

fn value_type(ty: &Type) -> syn::Result<TypeRef> {
    match ty {
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeRef::Unit),
        Type::Paren(inner) => value_type(&inner.elem),
        Type::Reference(_) | Type::ImplTrait(_) | Type::Infer(_) | Type::Never(_) => Err(
            syn::Error::new_spanned(ty, "unsupported type at the native boundary"),
        ),
        other => Ok(TypeRef::from_path(&type_text(other))),
    }
}

/// Classify a parameter type.
///
/// `&str` and `String` are text passed by value. `&T` is a read-only
/// reference, `&mut T` read-write, or write-only with `#[sash(out)]`.
pub fn parameter_type(ty: &Type, out: bool) -> syn::Result<(TypeRef, PassModifier)> {
    let (ty_ref, modifier) = match ty {
        Type::Reference(reference) if is_str(&reference.elem) => {
            if reference.mutability.is_some() {
                return Err(syn::Error::new_spanned(ty, "`&mut str` cannot cross the native boundary; use `&mut String`"));
            }
            (TypeRef::Text, PassModifier::ByValue)
        }
        Type::Reference(reference) => {
            let modifier = match (reference.mutability.is_some(), out) {
                (true, true) => PassModifier::Out,
                (true, false) => PassModifier::Ref,
                (false, _) => PassModifier::In,
            };
            (value_type(&reference.elem)?, modifier)
        }
        other => (value_type(other)?, PassModifier::ByValue),
    };

    if out && modifier != PassModifier::Out {
        return Err(syn::Error::new_spanned(ty, "`#[sash(out)]` requires a `&mut` parameter"));
    }
    Ok((ty_ref, modifier))
}

pub fn return_type(output: &ReturnType) -> syn::Result<(TypeRef, ReturnModifier)> {
    match output {
        ReturnType::Default => Ok((TypeRef::Unit, ReturnModifier::Value)),
        ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Reference(reference) => {
                let modifier = if reference.mutability.is_some() {
                    ReturnModifier::ByRef
                } else {
                    ReturnModifier::ByRefReadonly
                };
                let inner = if is_str(&reference.elem) {
                    TypeRef::Text
                } else {
                    value_type(&reference.elem)?
                };
                Ok((inner, modifier))
            }
            other => Ok((value_type(other)?, ReturnModifier::Value)),
        },
    }
}

/// Convert one trait method. Only `&self` methods without generics are
/// accepted.
pub fn method_signature(method: &TraitItemFn) -> syn::Result<MethodSignature> {
    let sig = &method.sig;
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(&sig.generics, "generic methods cannot cross the native boundary"));
    }
    if sig.asyncness.is_some() || sig.variadic.is_some() {
        return Err(syn::Error::new_spanned(sig, "async and variadic methods are not supported"));
    }

    let attrs = MethodAttrs::from_attrs(&method.attrs)?;
    let mut signature = MethodSignature::new(sig.ident.to_string());

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            let err = sash_core::GenerationError::UnsupportedReceiver {
                method: sig.ident.to_string(),
            };
            return Err(syn::Error::new_spanned(sig, err));
        }
    }

    for input in inputs {
        let FnArg::Typed(arg) = input else {
            return Err(syn::Error::new_spanned(input, "unexpected receiver"));
        };
        let Pat::Ident(pat) = arg.pat.as_ref() else {
            return Err(syn::Error::new_spanned(&arg.pat, "parameters must be plain identifiers"));
        };
        let param_attrs = ParamAttrs::from_attrs(&arg.attrs)?;
        let (ty, modifier) = parameter_type(&arg.ty, param_attrs.out)?;
        signature = signature.param(Parameter::new(pat.ident.to_string(), ty, modifier));
    }

    let (ty, modifier) = return_type(&sig.output)?;
    signature = signature.returns_by_ref(ty, modifier);

    if let Some(native) = attrs.native {
        signature = signature.native_name(native);
    }
    if let Some(overload) = attrs.overload {
        signature = signature.overload(overload);
    }
    Ok(signature)
}

/// Every method of a trait, rejecting non-method items.
pub fn trait_methods(items: &[TraitItem]) -> syn::Result<Vec<(&TraitItemFn, MethodSignature)>> {
    items
        .iter()
        .map(|item| match item {
            TraitItem::Fn(method) => Ok((method, method_signature(method)?)),
            other => Err(syn::Error::new_spanned(other, "only methods are supported here")),
        })
        .collect()
}

/// Remove `#[sash(..)]` helper attributes from a trait before re-emitting it.
pub fn strip_helper_attrs(item: &mut syn::ItemTrait) {
    for trait_item in &mut item.items {
        if let TraitItem::Fn(method) = trait_item {
            method.attrs.retain(|attr| !is_sash_attr(attr));
            for input in &mut method.sig.inputs {
                if let FnArg::Typed(arg) = input {
                    arg.attrs.retain(|attr| !is_sash_attr(attr));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sash_core::PrimitiveKind;
    use syn::parse_quote;

    #[test]
    fn text_and_reference_parameters() {
        let method: TraitItemFn = parse_quote! {
            fn update(&self, label: &str, position: &Vector3, velocity: &mut Vector3, #[sash(out)] name: &mut String);
        };
        let sig = method_signature(&method).unwrap();
        assert_eq!(sig.params[0].ty, TypeRef::Text);
        assert_eq!(sig.params[0].modifier, PassModifier::ByValue);
        assert_eq!(sig.params[1].modifier, PassModifier::In);
        assert_eq!(sig.params[2].modifier, PassModifier::Ref);
        assert_eq!(sig.params[3].ty, TypeRef::Text);
        assert_eq!(sig.params[3].modifier, PassModifier::Out);
    }

    #[test]
    fn method_attributes() {
        let method: TraitItemFn = parse_quote! {
            #[sash(native = "foo", overload = "A")]
            fn bar(&self) -> i32;
        };
        let sig = method_signature(&method).unwrap();
        assert_eq!(sig.native_name.as_deref(), Some("foo"));
        assert_eq!(sig.overload.as_deref(), Some("A"));
        assert_eq!(sig.return_type, TypeRef::Primitive(PrimitiveKind::I32));
    }

    #[test]
    fn by_ref_returns() {
        let method: TraitItemFn = parse_quote!(fn position(&self) -> &crate::Vector3;);
        let sig = method_signature(&method).unwrap();
        assert_eq!(sig.return_type, TypeRef::named("crate::Vector3"));
        assert_eq!(sig.return_modifier, ReturnModifier::ByRefReadonly);
    }

    #[test]
    fn receiver_must_be_shared_ref() {
        let method: TraitItemFn = parse_quote!(fn reset(&mut self););
        assert!(method_signature(&method).is_err());
        let method: TraitItemFn = parse_quote!(fn create() -> i32;);
        assert!(method_signature(&method).is_err());
    }

    #[test]
    fn out_requires_mut_reference() {
        let method: TraitItemFn = parse_quote!(fn get(&self, #[sash(out)] value: i32););
        assert!(method_signature(&method).is_err());
    }

    #[test]
    fn helper_attributes_are_stripped() {
        let mut item: syn::ItemTrait = parse_quote! {
            trait IEvents {
                #[sash(native = "x")]
                fn on_tick(&self, #[sash(out)] n: &mut i32);
            }
        };
        strip_helper_attrs(&mut item);
        let TraitItem::Fn(method) = &item.items[0] else {
            panic!("expected a method");
        };
        assert!(method.attrs.is_empty());
    }
}
