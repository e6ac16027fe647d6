//! Attribute parsing for sash macros.

use syn::{Attribute, LitInt, LitStr, meta::ParseNestedMeta};

use sash_core::MarshallerBinding;

/// Parsed `#[sash::api(...)]` arguments.
#[derive(Debug, Default)]
pub struct ApiAttrs {
    /// Native symbol prefix (default: the trait name).
    pub name: Option<String>,
    pub component: Option<u64>,
    pub extension: Option<u64>,
    /// Composed capabilities, as paths to their declarations.
    pub compose: Vec<syn::Path>,
    pub library: Option<String>,
    pub marshal: Vec<MarshallerBinding>,
}

impl ApiAttrs {
    /// Handle one `key` or `key = value` item.
    pub fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            self.name = Some(value.value());
        } else if meta.path.is_ident("component") {
            let value: LitInt = meta.value()?.parse()?;
            self.component = Some(value.base10_parse()?);
        } else if meta.path.is_ident("extension") {
            let value: LitInt = meta.value()?.parse()?;
            self.extension = Some(value.base10_parse()?);
        } else if meta.path.is_ident("compose") {
            meta.parse_nested_meta(|inner| {
                self.compose.push(inner.path);
                Ok(())
            })?;
        } else if meta.path.is_ident("library") {
            let value: LitStr = meta.value()?.parse()?;
            self.library = Some(value.value());
        } else if meta.path.is_ident("marshal") {
            meta.parse_nested_meta(|inner| {
                let marshaller: syn::Type = inner.value()?.parse()?;
                self.marshal.push(MarshallerBinding::new(
                    path_string(&inner.path),
                    quote::quote!(#marshaller).to_string(),
                ));
                Ok(())
            })?;
        } else {
            return Err(meta.error(format!(
                "unknown sash::api attribute: {}",
                path_string(&meta.path)
            )));
        }
        Ok(())
    }
}

/// Parsed `#[sash::event_handler(...)]` arguments.
#[derive(Debug, Default)]
pub struct EventHandlerAttrs {
    /// Native handler name (default: the trait name without its `I` prefix).
    pub name: Option<String>,
    pub library: Option<String>,
}

impl EventHandlerAttrs {
    pub fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            self.name = Some(value.value());
        } else if meta.path.is_ident("library") {
            let value: LitStr = meta.value()?.parse()?;
            self.library = Some(value.value());
        } else {
            return Err(meta.error(format!(
                "unknown sash::event_handler attribute: {}",
                path_string(&meta.path)
            )));
        }
        Ok(())
    }
}

/// Parsed `#[sash(...)]` attributes on a trait method.
#[derive(Debug, Default)]
pub struct MethodAttrs {
    /// Explicit native method name.
    pub native: Option<String>,
    /// Overload discriminator.
    pub overload: Option<String>,
}

impl MethodAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs.iter().filter(|attr| is_sash_attr(attr)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("native") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.native = Some(value.value());
                } else if meta.path.is_ident("overload") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.overload = Some(value.value());
                } else {
                    return Err(meta.error(format!(
                        "unknown sash method attribute: {}",
                        path_string(&meta.path)
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// Parsed `#[sash(...)]` attributes on a parameter.
#[derive(Debug, Default)]
pub struct ParamAttrs {
    /// Write-only `&mut` parameter.
    pub out: bool,
}

impl ParamAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs.iter().filter(|attr| is_sash_attr(attr)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("out") {
                    result.out = true;
                    Ok(())
                } else {
                    Err(meta.error(format!(
                        "unknown sash parameter attribute: {}",
                        path_string(&meta.path)
                    )))
                }
            })?;
        }

        Ok(result)
    }
}

pub fn is_sash_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("sash")
}

/// `a::b::C` without spaces.
pub fn path_string(path: &syn::Path) -> String {
    quote::quote!(#path).to_string().replace(' ', "")
}
