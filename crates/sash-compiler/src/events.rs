//! Event interface generation.
//!
//! For a host callback trait this emits everything native code needs to
//! raise events into it:
//!
//! - a static [`ActiveHandlerSlot`](../../sash_runtime/event/struct.ActiveHandlerSlot.html)
//!   holding the single active handler,
//! - one `extern` trampoline per callback, in declaration order, passed to
//!   the native adapter constructor as its function-pointer table,
//! - `{Handler}Impl`, which owns activation and disposal,
//! - `{Handler}Dispatcher`, the handle type of a native event dispatcher.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use sash_core::{
    EventInterfaceDeclaration, GenerationError, GenerationResult, MethodSignature, TypeRef,
};
use sash_registry::{Direction, MarshallerRegistry, MarshallerStrategy};

use crate::GeneratorConfig;
use crate::emit;
use crate::naming::EventSymbols;

/// One callback as seen from both sides of the trampoline.
struct Trampoline {
    /// Name of the trampoline function.
    name: Ident,
    /// `extern fn(..) -> R` type of the table entry.
    pointer_ty: TokenStream,
    /// The trampoline item itself.
    item: TokenStream,
}

fn unsupported(
    interface: &EventInterfaceDeclaration,
    callback: &MethodSignature,
    err: GenerationError,
) -> GenerationError {
    GenerationError::UnsupportedCallback {
        interface: interface.name.to_string(),
        method: callback.name.clone(),
        reason: err.to_string(),
    }
}

fn plan_trampoline(
    interface: &EventInterfaceDeclaration,
    callback: &MethodSignature,
    registry: &MarshallerRegistry,
    slot: &Ident,
    config: &GeneratorConfig,
) -> GenerationResult<Trampoline> {
    let runtime = config.runtime();
    let abi = config.abi_literal();
    let method = emit::ident(&callback.name)?;
    let event = callback.name.as_str();

    let mut native_params = Vec::new();
    let mut native_tys = Vec::new();
    let mut conversions = Vec::new();
    let mut args = Vec::new();

    for param in &callback.params {
        let name = emit::ident(&param.name)?;
        let direction = Direction::of_parameter(param.modifier);
        let strategy = registry.resolve_marshalled(&param.ty)?;
        if let Some(strategy) = strategy {
            strategy
                .check_callback(&param.ty.to_string(), direction)
                .map_err(|err| unsupported(interface, callback, err))?;
        }

        let native_ty = match strategy {
            Some(MarshallerStrategy::BooleanNormalize) => {
                conversions.push(quote! {
                    let #name = #runtime::marshal::BoolMarshaller::from_native(#name);
                });
                args.push(quote!(#name));
                quote!(#runtime::BlittableBool)
            }
            Some(MarshallerStrategy::TextView) => {
                conversions.push(quote! {
                    let #name = unsafe { #runtime::marshal::StringViewMarshaller::to_managed(#name) };
                });
                args.push(quote!(&#name));
                quote!(#runtime::StringView)
            }
            _ => {
                args.push(quote!(#name));
                emit::param_type(&param.ty, param.modifier)?
            }
        };
        native_params.push(quote!(#name: #native_ty));
        native_tys.push(native_ty);
    }

    let call = quote! {
        #runtime::event::dispatch(&#slot, #event, |__handler| __handler.#method(#(#args),*))
    };

    let strategy = registry.resolve_marshalled(&callback.return_type)?;
    if let Some(strategy) = strategy {
        strategy
            .check_callback(&callback.return_type.to_string(), Direction::Return)
            .map_err(|err| unsupported(interface, callback, err))?;
    }
    let (native_ret, body) = match (&callback.return_type, strategy) {
        (TypeRef::Unit, _) => (None, quote!(#call;)),
        (_, Some(MarshallerStrategy::BooleanNormalize)) => (
            Some(quote!(#runtime::BlittableBool)),
            quote!(#runtime::marshal::BoolMarshaller::to_native(#call)),
        ),
        (ty, _) => (Some(emit::value_type(ty)?), call),
    };

    let name = format_ident!("__sash_{}", event.trim_start_matches("r#"));
    let ret = emit::arrow(native_ret.as_ref());
    let item = quote! {
        #[allow(unused_unsafe)]
        extern #abi fn #name(#(#native_params),*) #ret {
            #(#conversions)*
            #body
        }
    };

    Ok(Trampoline {
        name,
        pointer_ty: quote!(extern #abi fn(#(#native_tys),*) #ret),
        item,
    })
}

/// Generate the slot, trampolines, adapter and dispatcher for `interface`.
///
/// The callback trait itself is not emitted; front-ends keep the trait as
/// written.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate_event_interface(
    interface: &EventInterfaceDeclaration,
    config: &GeneratorConfig,
) -> GenerationResult<TokenStream> {
    interface.validate()?;

    let runtime = config.runtime();
    let vis = config.visibility();
    let abi = config.abi_literal();
    let link = config.link_attribute();
    let registry = MarshallerRegistry::builtin();
    let symbols = EventSymbols::new(&interface.handler_name);

    let interface_name = interface.name.to_string();
    let trait_ident = emit::ident(interface.name.simple_name())?;
    let handler = emit::ident(&interface.handler_name)?;
    let adapter = format_ident!("{}Impl", handler);
    let dispatcher = format_ident!("{}Dispatcher", handler);
    let slot = format_ident!("__SASH_SLOT_{}", interface.handler_name.to_uppercase());
    let dyn_handler = quote!(dyn #trait_ident + ::core::marker::Send + ::core::marker::Sync);
    let arc = quote!(::std::sync::Arc<#dyn_handler>);

    let trampolines = interface
        .callbacks
        .iter()
        .map(|callback| plan_trampoline(interface, callback, &registry, &slot, config))
        .collect::<GenerationResult<Vec<_>>>()?;

    let trampoline_items = trampolines.iter().map(|t| &t.item);
    let trampoline_names = trampolines.iter().map(|t| &t.name);
    let table = interface
        .callbacks
        .iter()
        .zip(&trampolines)
        .map(|(callback, trampoline)| {
            let name = emit::ident(&callback.name)?;
            let ty = &trampoline.pointer_ty;
            Ok(quote!(#name: #ty))
        })
        .collect::<GenerationResult<Vec<_>>>()?;

    let create = &symbols.create;
    let delete = &symbols.delete;
    let add = &symbols.add_handler;
    let remove = &symbols.remove_handler;
    let has = &symbols.has_handler;
    let count = &symbols.count;

    tracing::debug!(
        interface = %interface.name,
        handler = %interface.handler_name,
        callbacks = trampolines.len(),
        "generated event interface"
    );

    Ok(quote! {
        #[doc(hidden)]
        static #slot: #runtime::ActiveHandlerSlot<#dyn_handler> =
            #runtime::ActiveHandlerSlot::new(#interface_name);

        /// Native adapter for the active handler.
        #vis struct #adapter;

        impl #adapter {
            /// The slot holding the active handler.
            #vis fn slot() -> &'static #runtime::ActiveHandlerSlot<#dyn_handler> {
                &#slot
            }

            fn create() -> #runtime::NativeHandle {
                #(#trampoline_items)*

                #link
                unsafe extern #abi {
                    #[link_name = #create]
                    fn __create(#(#table),*) -> #runtime::NativeHandle;
                }

                unsafe { __create(#(#trampoline_names),*) }
            }

            fn delete(handle: #runtime::NativeHandle) {
                #link
                unsafe extern #abi {
                    #[link_name = #delete]
                    fn __delete(handle: #runtime::NativeHandle);
                }

                unsafe { __delete(handle) }
            }

            /// Make `handler` the active handler, creating the native adapter.
            #vis fn activate(handler: &#arc) -> ::core::result::Result<#runtime::NativeHandle, #runtime::EventError> {
                #slot.activate(handler, Self::create)
            }

            /// Activate `handler` until the returned guard is dropped.
            #vis fn scope(
                handler: #arc,
            ) -> ::core::result::Result<#runtime::ScopedHandler<'static, #dyn_handler>, #runtime::EventError> {
                #slot.scope(handler, Self::create, Self::delete)
            }

            #vis fn active() -> ::core::option::Option<#arc> {
                #slot.active()
            }

            #vis fn is_active(handler: &#arc) -> bool {
                #slot.is_active(handler)
            }

            /// Remove `handler` from every dispatcher it was added to and
            /// delete the native adapter.
            #vis fn dispose(handler: &#arc) -> ::core::result::Result<(), #runtime::EventError> {
                #slot.dispose(handler, Self::delete)
            }
        }

        /// Native event dispatcher.
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis struct #dispatcher {
            handle: #runtime::NativeHandle,
        }

        impl #runtime::ApiObject for #dispatcher {
            fn handle(&self) -> #runtime::NativeHandle {
                self.handle
            }

            fn from_handle(handle: #runtime::NativeHandle) -> Self {
                Self { handle }
            }
        }

        impl #dispatcher {
            #vis const fn from_handle(handle: #runtime::NativeHandle) -> Self {
                Self { handle }
            }

            #vis const fn handle(&self) -> #runtime::NativeHandle {
                self.handle
            }

            /// Activate `handler` if needed and add it at `priority`.
            ///
            /// Returns `false` when another handler is active or this one is
            /// being disposed. Disposing the handler later removes it from
            /// this dispatcher.
            #vis fn add_event_handler(&self, handler: &#arc, priority: #runtime::EventPriority) -> bool {
                #link
                unsafe extern #abi {
                    #[link_name = #add]
                    fn __invoke(
                        dispatcher: #runtime::NativeHandle,
                        handler: #runtime::NativeHandle,
                        priority: i8,
                    ) -> #runtime::BlittableBool;
                }

                let __dispatcher = *self;
                let __hooked = ::std::sync::Arc::clone(handler);
                let ::core::result::Result::Ok(__native) = #slot.attach(
                    handler,
                    #adapter::create,
                    self.handle,
                    ::std::boxed::Box::new(move || {
                        __dispatcher.remove_event_handler(&__hooked);
                    }),
                ) else {
                    return false;
                };

                #runtime::BlittableBool::get(unsafe { __invoke(self.handle, __native, priority.to_native()) })
            }

            /// Remove `handler`. Returns `false` when it is not the active
            /// handler or the native side did not have it.
            #vis fn remove_event_handler(&self, handler: &#arc) -> bool {
                #link
                unsafe extern #abi {
                    #[link_name = #remove]
                    fn __invoke(
                        dispatcher: #runtime::NativeHandle,
                        handler: #runtime::NativeHandle,
                    ) -> #runtime::BlittableBool;
                }

                let ::core::option::Option::Some(__native) = #slot.active_handle(handler) else {
                    return false;
                };

                let __removed = #runtime::BlittableBool::get(unsafe { __invoke(self.handle, __native) });
                #slot.forget_hook(handler, self.handle);
                __removed
            }

            /// Priority `handler` was added at, if it is registered here.
            #vis fn has_event_handler(&self, handler: &#arc) -> ::core::option::Option<#runtime::EventPriority> {
                #link
                unsafe extern #abi {
                    #[link_name = #has]
                    fn __invoke(
                        dispatcher: #runtime::NativeHandle,
                        handler: #runtime::NativeHandle,
                        priority: &mut i8,
                    ) -> #runtime::BlittableBool;
                }

                let ::core::option::Option::Some(__native) = #slot.active_handle(handler) else {
                    return ::core::option::Option::None;
                };

                let mut __priority: i8 = 0;
                let __found = #runtime::BlittableBool::get(unsafe {
                    __invoke(self.handle, __native, &mut __priority)
                });
                if __found {
                    ::core::option::Option::Some(#runtime::EventPriority::from_native(__priority))
                } else {
                    ::core::option::Option::None
                }
            }

            /// Number of handlers registered on this dispatcher.
            #vis fn count(&self) -> usize {
                #link
                unsafe extern #abi {
                    #[link_name = #count]
                    fn __invoke(dispatcher: #runtime::NativeHandle) -> #runtime::Size;
                }

                let __count = unsafe { __invoke(self.handle) };
                __count.0
            }
        }
    })
}
