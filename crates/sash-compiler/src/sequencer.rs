//! Phase sequencing for native call stubs.
//!
//! A [`CallPlan`] is built per method: strategies are resolved for the
//! return value and every parameter, the native symbol is fixed, and the
//! statements each strategy contributes are grouped by [`Phase`]. Emission
//! then lays the phases out in a fixed order:
//!
//! ```text
//! locals ─► setup ─┬─ guarded ──────────────────────────────────────────┐
//!                  │ marshal ─► { pinned_marshal; native call }          │
//!                  │ ─► notify ─► unmarshal_capture ─► unmarshal ─► value│
//!                  └─────────────────────────────────────────────────────┘
//!                  ─► cleanup_callee ─► cleanup_caller ─► value or resume panic
//! ```
//!
//! Methods whose types need no conversion take the fast path: the body is
//! the native call itself.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use sash_core::{GenerationError, GenerationResult, MethodSignature, PassModifier, ReturnModifier};
use sash_registry::{Direction, MarshalSite, MarshallerRegistry, MarshallerStrategy, Phase};

use crate::GeneratorConfig;
use crate::emit;
use crate::naming;

struct PlannedParam {
    name: Ident,
    native: Ident,
    marshaller: Ident,
    host_ty: TokenStream,
    modifier: PassModifier,
    strategy: Option<MarshallerStrategy>,
    /// Type of the native local (strategy params only).
    native_ty: TokenStream,
}

impl PlannedParam {
    fn direction(&self) -> Direction {
        Direction::of_parameter(self.modifier)
    }

    fn site<'a>(&'a self, runtime: &'a TokenStream) -> MarshalSite<'a> {
        MarshalSite {
            runtime,
            value: &self.name,
            native: &self.native,
            marshaller: &self.marshaller,
            modifier: self.modifier,
            direction: self.direction(),
        }
    }

    /// Parameter of the native entry point.
    fn native_param(&self) -> TokenStream {
        let name = &self.name;
        let ty = match (&self.strategy, self.direction()) {
            (None, _) => self.host_ty.clone(),
            (Some(_), Direction::In) => self.native_ty.clone(),
            (Some(_), _) => {
                let native_ty = &self.native_ty;
                quote!(&mut #native_ty)
            }
        };
        quote!(#name: #ty)
    }

    /// Argument passed to the native entry point.
    fn native_arg(&self) -> TokenStream {
        let native = &self.native;
        match (&self.strategy, self.direction()) {
            (None, _) => {
                let name = &self.name;
                quote!(#name)
            }
            (Some(_), Direction::In) => quote!(#native),
            (Some(_), _) => quote!(&mut #native),
        }
    }
}

struct PlannedReturn {
    /// `None` for `()`.
    host_ty: Option<TokenStream>,
    /// Return type of the native entry point, `None` for `()`.
    native_ty: Option<TokenStream>,
    modifier: ReturnModifier,
    strategy: Option<MarshallerStrategy>,
    value: Ident,
    native: Ident,
    marshaller: Ident,
}

impl PlannedReturn {
    fn site<'a>(&'a self, runtime: &'a TokenStream) -> MarshalSite<'a> {
        MarshalSite {
            runtime,
            value: &self.value,
            native: &self.native,
            marshaller: &self.marshaller,
            modifier: PassModifier::ByValue,
            direction: Direction::Return,
        }
    }
}

/// Resolved, phase-grouped description of one native call stub.
pub struct CallPlan {
    method: Ident,
    symbol: String,
    params: Vec<PlannedParam>,
    ret: PlannedReturn,
    runtime: TokenStream,
    abi: syn::LitStr,
    link: TokenStream,
}

impl CallPlan {
    /// Plan the stub for `method` of the declaration named `declaration`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn new(
        declaration: &str,
        method: &MethodSignature,
        registry: &MarshallerRegistry,
        config: &GeneratorConfig,
    ) -> GenerationResult<Self> {
        let runtime = config.runtime();
        let symbol = naming::native_symbol(declaration, method);

        let ret_strategy = registry.resolve_marshalled(&method.return_type)?.cloned();
        if method.return_modifier.is_by_ref() && ret_strategy.is_some() {
            return Err(GenerationError::ByRefReturnRequiresMarshalling {
                method: method.name.clone(),
                ty: method.return_type.to_string(),
            });
        }

        let ret = if method.returns_void() {
            PlannedReturn {
                host_ty: None,
                native_ty: None,
                modifier: method.return_modifier,
                strategy: None,
                value: format_ident!("__sash_return"),
                native: format_ident!("__sash_return_native"),
                marshaller: format_ident!("__sash_return_marshaller"),
            }
        } else {
            let host_ty = emit::return_type(&method.return_type, method.return_modifier)?;
            let value_ty = emit::value_type(&method.return_type)?;
            let native_ty = match (&ret_strategy, method.return_modifier) {
                (Some(strategy), _) => strategy.native_type(Direction::Return, &value_ty, &runtime),
                (None, ReturnModifier::Value) => host_ty.clone(),
                (None, ReturnModifier::ByRef) => quote!(*mut #value_ty),
                (None, ReturnModifier::ByRefReadonly) => quote!(*const #value_ty),
            };
            PlannedReturn {
                host_ty: Some(host_ty),
                native_ty: Some(native_ty),
                modifier: method.return_modifier,
                strategy: ret_strategy,
                value: format_ident!("__sash_return"),
                native: format_ident!("__sash_return_native"),
                marshaller: format_ident!("__sash_return_marshaller"),
            }
        };

        let params = method
            .params
            .iter()
            .map(|param| -> GenerationResult<PlannedParam> {
                let strategy = registry.resolve_marshalled(&param.ty)?.cloned();
                let host_ty = emit::param_type(&param.ty, param.modifier)?;
                let value_ty = emit::value_type(&param.ty)?;
                let direction = Direction::of_parameter(param.modifier);
                let native_ty = match &strategy {
                    Some(strategy) => strategy.native_type(direction, &value_ty, &runtime),
                    None => value_ty,
                };
                Ok(PlannedParam {
                    name: emit::ident(&param.name)?,
                    native: emit::local(&param.name, "native"),
                    marshaller: emit::local(&param.name, "marshaller"),
                    host_ty,
                    modifier: param.modifier,
                    strategy,
                    native_ty,
                })
            })
            .collect::<GenerationResult<Vec<_>>>()?;

        let plan = Self {
            method: emit::ident(&method.name)?,
            symbol,
            params,
            ret,
            runtime,
            abi: config.abi_literal(),
            link: config.link_attribute(),
        };

        tracing::debug!(
            symbol = %plan.symbol,
            fast_path = plan.is_fast_path(),
            guarded = plan.has_guard(),
            "planned native call"
        );
        Ok(plan)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// True when nothing needs conversion and the stub is a direct call.
    pub fn is_fast_path(&self) -> bool {
        self.ret.strategy.is_none() && self.params.iter().all(|p| p.strategy.is_none())
    }

    /// Statements every strategy contributes to `phase`: parameters in
    /// declaration order, then the return value.
    pub fn stage(&self, phase: Phase) -> TokenStream {
        let mut out = TokenStream::new();
        for param in &self.params {
            if let Some(strategy) = &param.strategy {
                out.extend(strategy.emit(phase, &param.site(&self.runtime)));
            }
        }
        if let Some(strategy) = &self.ret.strategy {
            out.extend(strategy.emit(phase, &self.ret.site(&self.runtime)));
        }
        out
    }

    /// Whether the stub needs a panic guard around its conversion stages.
    pub fn has_guard(&self) -> bool {
        Phase::ALL
            .into_iter()
            .filter(|phase| phase.is_cleanup())
            .any(|phase| !self.stage(phase).is_empty())
    }

    /// Local `extern` block declaring the native entry point as `__invoke`.
    pub fn native_declaration(&self) -> TokenStream {
        let symbol = &self.symbol;
        let abi = &self.abi;
        let link = &self.link;
        let runtime = &self.runtime;
        let params = self.params.iter().map(PlannedParam::native_param);
        let ret = emit::arrow(self.ret.native_ty.as_ref());
        quote! {
            #link
            unsafe extern #abi {
                #[link_name = #symbol]
                fn __invoke(handle: #runtime::NativeHandle #(, #params)*) #ret;
            }
        }
    }

    /// `fn name(&self, ..) -> R`
    pub fn signature(&self) -> TokenStream {
        let method = &self.method;
        let params = self.params.iter().map(|param| {
            let name = &param.name;
            let ty = &param.host_ty;
            quote!(#name: #ty)
        });
        let ret = emit::arrow(self.ret.host_ty.as_ref());
        quote!(fn #method(&self #(, #params)*) #ret)
    }

    fn native_call(&self) -> TokenStream {
        let args = self.params.iter().map(PlannedParam::native_arg);
        quote!(unsafe { __invoke(__handle #(, #args)*) })
    }

    fn deref_by_ref(&self, pointer: TokenStream) -> TokenStream {
        let runtime = &self.runtime;
        let symbol = &self.symbol;
        match self.ret.modifier {
            ReturnModifier::Value => pointer,
            ReturnModifier::ByRef => quote!(#runtime::boundary::deref_native_mut(#pointer, #symbol)),
            ReturnModifier::ByRefReadonly => quote!(#runtime::boundary::deref_native(#pointer, #symbol)),
        }
    }

    /// Method body. `handle` evaluates to the receiver's native handle.
    pub fn body(&self, handle: &TokenStream) -> TokenStream {
        let declaration = self.native_declaration();
        let call = self.native_call();

        if self.is_fast_path() {
            let call = if self.ret.host_ty.is_some() {
                self.deref_by_ref(call)
            } else {
                call
            };
            return quote! {
                let __handle = #handle;
                #declaration
                #call
            };
        }

        let runtime = &self.runtime;
        let locals = self.params.iter().filter(|p| p.strategy.is_some()).map(|param| {
            let native = &param.native;
            let native_ty = &param.native_ty;
            quote! { let mut #native: #native_ty = ::core::default::Default::default(); }
        });

        let setup = self.stage(Phase::Setup);
        let marshal = self.stage(Phase::Marshal);
        let pinned = self.stage(Phase::PinnedMarshal);
        let notify = self.stage(Phase::Notify);
        let capture = self.stage(Phase::UnmarshalCapture);
        let unmarshal = self.stage(Phase::Unmarshal);
        let cleanup_callee = self.stage(Phase::CleanupCallee);
        let cleanup_caller = self.stage(Phase::CleanupCaller);

        let ret_native = &self.ret.native;
        let (invoke, tail) = if self.ret.host_ty.is_some() {
            let tail = match &self.ret.strategy {
                Some(strategy) => strategy.unmarshal_return(&self.ret.site(runtime)),
                None => self.deref_by_ref(quote!(#ret_native)),
            };
            (quote! { let #ret_native = { #pinned #call }; }, tail)
        } else {
            (quote! { { #pinned #call; } }, TokenStream::new())
        };

        let guarded = quote! {
            #marshal
            #invoke
            #notify
            #capture
            #unmarshal
            #tail
        };

        if !self.has_guard() {
            return quote! {
                let __handle = #handle;
                #declaration
                #(#locals)*
                #setup
                #guarded
            };
        }

        quote! {
            let __handle = #handle;
            #declaration
            #(#locals)*
            #setup
            let __result = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| {
                #guarded
            }));
            #cleanup_callee
            #cleanup_caller
            #runtime::boundary::finish(__result)
        }
    }

    /// The complete method, with `prefix` (visibility or nothing) in front.
    pub fn method(&self, prefix: &TokenStream, handle: &TokenStream) -> TokenStream {
        let signature = self.signature();
        let body = self.body(handle);
        quote! {
            #[allow(unused_mut, unused_assignments, unused_unsafe, clippy::needless_late_init)]
            #prefix #signature {
                #body
            }
        }
    }
}
