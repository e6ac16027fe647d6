//! Generator configuration.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use sash_core::{GenerationError, GenerationResult};

/// Settings shared by every item the generator emits.
///
/// # Example
///
/// ```
/// use sash_compiler::GeneratorConfig;
///
/// let config = GeneratorConfig::default().with_library("SampSharp");
/// assert_eq!(config.library(), Some("SampSharp"));
/// assert_eq!(config.abi(), "C");
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    runtime: syn::Path,
    abi: String,
    library: Option<String>,
    visibility: syn::Visibility,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime: syn::parse_quote!(::sash),
            abi: "C".into(),
            library: None,
            visibility: syn::parse_quote!(pub),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path generated code uses to reach the runtime crate.
    pub fn with_runtime_path(mut self, path: &str) -> GenerationResult<Self> {
        self.runtime = syn::parse_str(path)
            .map_err(|err| GenerationError::InvalidType(format!("runtime path '{path}': {err}")))?;
        Ok(self)
    }

    /// Calling convention of native entry points.
    pub fn with_abi(mut self, abi: impl Into<String>) -> Self {
        self.abi = abi.into();
        self
    }

    /// Native library the entry points link against. Without one, symbols
    /// are resolved by whatever the final artifact links.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_visibility(mut self, visibility: syn::Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    pub(crate) fn runtime(&self) -> TokenStream {
        self.runtime.to_token_stream()
    }

    pub(crate) fn visibility(&self) -> &syn::Visibility {
        &self.visibility
    }

    pub(crate) fn abi_literal(&self) -> syn::LitStr {
        syn::LitStr::new(&self.abi, proc_macro2::Span::call_site())
    }

    /// Attributes placed on every native `extern` block.
    pub(crate) fn link_attribute(&self) -> TokenStream {
        match &self.library {
            Some(library) => quote!(#[link(name = #library)]),
            None => TokenStream::new(),
        }
    }
}
