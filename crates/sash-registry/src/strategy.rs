//! Marshaller strategies and the code each one contributes per phase.
//!
//! A strategy is a closed set of conversions. For a given [`Direction`] it
//! declares which [`Phase`]s it takes part in ([`MarshallerStrategy::phases`])
//! and produces the statements for each of them
//! ([`MarshallerStrategy::emit`]). The sequencer only orders and places
//! those statements; it never looks at what they contain.

use bitflags::bitflags;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use sash_core::{GenerationError, GenerationResult, PassModifier};

bitflags! {
    /// Set of phases a strategy participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhaseSet: u16 {
        const SETUP = 1 << 0;
        const MARSHAL = 1 << 1;
        const PINNED_MARSHAL = 1 << 2;
        const NOTIFY = 1 << 3;
        const UNMARSHAL_CAPTURE = 1 << 4;
        const UNMARSHAL = 1 << 5;
        const CLEANUP_CALLEE = 1 << 6;
        const CLEANUP_CALLER = 1 << 7;

        /// Phases that must run even when a later phase panics.
        const CLEANUP = Self::CLEANUP_CALLEE.bits() | Self::CLEANUP_CALLER.bits();
    }
}

/// One stage of a marshalling stub, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Marshal,
    PinnedMarshal,
    Notify,
    UnmarshalCapture,
    Unmarshal,
    CleanupCallee,
    CleanupCaller,
}

impl Phase {
    /// Every phase in the order stubs run them.
    pub const ALL: [Phase; 8] = [
        Phase::Setup,
        Phase::Marshal,
        Phase::PinnedMarshal,
        Phase::Notify,
        Phase::UnmarshalCapture,
        Phase::Unmarshal,
        Phase::CleanupCallee,
        Phase::CleanupCaller,
    ];

    pub fn flag(self) -> PhaseSet {
        match self {
            Phase::Setup => PhaseSet::SETUP,
            Phase::Marshal => PhaseSet::MARSHAL,
            Phase::PinnedMarshal => PhaseSet::PINNED_MARSHAL,
            Phase::Notify => PhaseSet::NOTIFY,
            Phase::UnmarshalCapture => PhaseSet::UNMARSHAL_CAPTURE,
            Phase::Unmarshal => PhaseSet::UNMARSHAL,
            Phase::CleanupCallee => PhaseSet::CLEANUP_CALLEE,
            Phase::CleanupCaller => PhaseSet::CLEANUP_CALLER,
        }
    }

    pub fn is_cleanup(self) -> bool {
        PhaseSet::CLEANUP.contains(self.flag())
    }
}

/// Which way a value crosses the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to native (by value or `&T`).
    In,
    /// Native to host through a `#[sash(out)]` parameter.
    Out,
    /// Both ways through a `&mut T` parameter.
    InOut,
    /// The return value.
    Return,
}

impl Direction {
    pub fn of_parameter(modifier: PassModifier) -> Self {
        match modifier {
            PassModifier::ByValue | PassModifier::In => Direction::In,
            PassModifier::Out => Direction::Out,
            PassModifier::Ref => Direction::InOut,
        }
    }

    fn reads_host(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    fn writes_host(self) -> bool {
        !matches!(self, Direction::In)
    }
}

/// A marshaller type supplied by a declaration.
///
/// The type implements the runtime `ToNative` and/or `FromNative` traits;
/// generated code calls it through fully qualified trait paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomMarshaller {
    ty: syn::Type,
}

impl CustomMarshaller {
    pub fn parse(path: &str) -> GenerationResult<Self> {
        syn::parse_str::<syn::Type>(path)
            .map(|ty| Self { ty })
            .map_err(|err| GenerationError::InvalidType(format!("marshaller '{path}': {err}")))
    }

    pub fn ty(&self) -> &syn::Type {
        &self.ty
    }

    fn to_native_trait(&self, runtime: &TokenStream) -> TokenStream {
        let ty = &self.ty;
        quote!(<#ty as #runtime::marshal::ToNative>)
    }

    fn from_native_trait(&self, runtime: &TokenStream) -> TokenStream {
        let ty = &self.ty;
        quote!(<#ty as #runtime::marshal::FromNative>)
    }
}

/// Names a stub uses for one marshalled value.
///
/// `value` is the host parameter; for return values it is unused. `native`
/// is the native local the entry point reads or writes, `marshaller` the
/// local holding marshaller state between phases.
pub struct MarshalSite<'a> {
    /// Path of the runtime crate (usually `::sash`).
    pub runtime: &'a TokenStream,
    pub value: &'a Ident,
    pub native: &'a Ident,
    pub marshaller: &'a Ident,
    pub modifier: PassModifier,
    pub direction: Direction,
}

impl MarshalSite<'_> {
    /// The host value as `&Managed`.
    fn borrowed_value(&self) -> TokenStream {
        let value = self.value;
        if self.modifier.is_reference() {
            quote!(&*#value)
        } else {
            quote!(&#value)
        }
    }

    /// The host value as a plain `bool`.
    fn bool_value(&self) -> TokenStream {
        let value = self.value;
        if self.modifier.is_reference() {
            quote!(*#value)
        } else {
            quote!(#value)
        }
    }
}

/// How values of one host type cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarshallerStrategy {
    /// Already native-compatible; every phase is empty.
    PassThrough,
    /// `bool` ↔ one-byte `BlittableBool`.
    BooleanNormalize,
    /// `&str`/`String` ↔ `StringView` over a caller-pinned buffer.
    TextView,
    /// A declaration-supplied marshaller type.
    Custom(CustomMarshaller),
}

impl MarshallerStrategy {
    pub fn custom(path: &str) -> GenerationResult<Self> {
        CustomMarshaller::parse(path).map(MarshallerStrategy::Custom)
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, MarshallerStrategy::PassThrough)
    }

    /// Whether the native side needs a stable address for this value.
    pub fn requires_pinning(&self, direction: Direction) -> bool {
        self.phases(direction).contains(PhaseSet::PINNED_MARSHAL)
    }

    /// Short name for diagnostics and logging.
    pub fn name(&self) -> String {
        match self {
            MarshallerStrategy::PassThrough => "pass-through".into(),
            MarshallerStrategy::BooleanNormalize => "bool".into(),
            MarshallerStrategy::TextView => "text-view".into(),
            MarshallerStrategy::Custom(custom) => {
                let ty = custom.ty();
                quote!(#ty).to_string().replace(' ', "")
            }
        }
    }

    /// Native representation passed to or returned from the entry point.
    ///
    /// `host` is the host type, used as-is by pass-through.
    pub fn native_type(
        &self,
        direction: Direction,
        host: &TokenStream,
        runtime: &TokenStream,
    ) -> TokenStream {
        match self {
            MarshallerStrategy::PassThrough => host.clone(),
            MarshallerStrategy::BooleanNormalize => quote!(#runtime::BlittableBool),
            MarshallerStrategy::TextView => quote!(#runtime::StringView),
            MarshallerStrategy::Custom(custom) => {
                let target = if direction.reads_host() {
                    custom.to_native_trait(runtime)
                } else {
                    custom.from_native_trait(runtime)
                };
                quote!(#target::Native)
            }
        }
    }

    /// Phases this strategy contributes for `direction`.
    pub fn phases(&self, direction: Direction) -> PhaseSet {
        let to_native = |set: PhaseSet| if direction.reads_host() { set } else { PhaseSet::empty() };
        let from_native = |set: PhaseSet| if direction.writes_host() { set } else { PhaseSet::empty() };

        match self {
            MarshallerStrategy::PassThrough => PhaseSet::empty(),
            MarshallerStrategy::BooleanNormalize => {
                to_native(PhaseSet::MARSHAL) | from_native(PhaseSet::UNMARSHAL)
            }
            MarshallerStrategy::TextView => {
                to_native(
                    PhaseSet::SETUP
                        | PhaseSet::MARSHAL
                        | PhaseSet::PINNED_MARSHAL
                        | PhaseSet::CLEANUP_CALLER,
                ) | from_native(PhaseSet::UNMARSHAL)
            }
            MarshallerStrategy::Custom(_) => {
                to_native(
                    PhaseSet::SETUP
                        | PhaseSet::MARSHAL
                        | PhaseSet::PINNED_MARSHAL
                        | PhaseSet::NOTIFY
                        | PhaseSet::CLEANUP_CALLER,
                ) | from_native(
                    PhaseSet::SETUP
                        | PhaseSet::UNMARSHAL_CAPTURE
                        | PhaseSet::UNMARSHAL
                        | PhaseSet::CLEANUP_CALLEE,
                )
            }
        }
    }

    /// Statements for `phase` at `site`. Empty when the strategy does not
    /// take part in that phase.
    ///
    /// For [`Direction::Return`] the [`Phase::Unmarshal`] statement is empty;
    /// the value comes from [`unmarshal_return`](Self::unmarshal_return).
    pub fn emit(&self, phase: Phase, site: &MarshalSite<'_>) -> TokenStream {
        if !self.phases(site.direction).contains(phase.flag()) {
            return TokenStream::new();
        }
        if phase == Phase::Unmarshal && site.direction == Direction::Return {
            return TokenStream::new();
        }

        let runtime = site.runtime;
        let value = site.value;
        let native = site.native;
        let marshaller = site.marshaller;

        match self {
            MarshallerStrategy::PassThrough => TokenStream::new(),

            MarshallerStrategy::BooleanNormalize => match phase {
                Phase::Marshal => {
                    let host = site.bool_value();
                    quote! { #native = #runtime::marshal::BoolMarshaller::to_native(#host); }
                }
                Phase::Unmarshal => quote! {
                    *#value = #runtime::marshal::BoolMarshaller::from_native(#native);
                },
                _ => TokenStream::new(),
            },

            MarshallerStrategy::TextView => match phase {
                Phase::Setup => quote! {
                    let mut #marshaller = #runtime::marshal::StringViewMarshaller::new();
                },
                Phase::Marshal => {
                    let host = site.borrowed_value();
                    quote! { #marshaller.from_managed(#host); }
                }
                Phase::PinnedMarshal => quote! { #native = #marshaller.to_native(); },
                Phase::Unmarshal => quote! {
                    *#value = unsafe { #runtime::marshal::StringViewMarshaller::to_managed(#native) };
                },
                Phase::CleanupCaller => quote! { #marshaller.free(); },
                _ => TokenStream::new(),
            },

            MarshallerStrategy::Custom(custom) => {
                let to = custom.to_native_trait(runtime);
                let from = custom.from_native_trait(runtime);
                match phase {
                    Phase::Setup if site.direction.reads_host() => {
                        quote! { let mut #marshaller = #to::setup(); }
                    }
                    Phase::Setup => quote! { let mut #marshaller = #from::setup(); },
                    Phase::Marshal => {
                        let host = site.borrowed_value();
                        quote! { #to::marshal(&mut #marshaller, #host); }
                    }
                    Phase::PinnedMarshal => {
                        quote! { #native = #to::pinned_marshal(&mut #marshaller); }
                    }
                    Phase::Notify => quote! { #to::notify_invoked(&mut #marshaller); },
                    Phase::UnmarshalCapture => {
                        quote! { #from::unmarshal_capture(&mut #marshaller, #native); }
                    }
                    Phase::Unmarshal => quote! { *#value = #from::unmarshal(&mut #marshaller); },
                    Phase::CleanupCallee => quote! { #from::cleanup_callee(&mut #marshaller); },
                    Phase::CleanupCaller => quote! { #to::cleanup_caller(&mut #marshaller); },
                }
            }
        }
    }

    /// Expression converting the captured native return value to the host
    /// return value.
    pub fn unmarshal_return(&self, site: &MarshalSite<'_>) -> TokenStream {
        let runtime = site.runtime;
        let native = site.native;
        let marshaller = site.marshaller;

        match self {
            MarshallerStrategy::PassThrough => quote!(#native),
            MarshallerStrategy::BooleanNormalize => {
                quote!(#runtime::marshal::BoolMarshaller::from_native(#native))
            }
            MarshallerStrategy::TextView => {
                quote!(unsafe { #runtime::marshal::StringViewMarshaller::to_managed(#native) })
            }
            MarshallerStrategy::Custom(custom) => {
                let from = custom.from_native_trait(runtime);
                quote!(#from::unmarshal(&mut #marshaller))
            }
        }
    }

    /// Check that a callback trampoline can convert this value.
    ///
    /// Trampolines only support stateless conversions of values flowing
    /// into the host, plus `bool` results.
    pub fn check_callback(&self, ty: &str, direction: Direction) -> GenerationResult<()> {
        match (self, direction) {
            (MarshallerStrategy::PassThrough, _) => Ok(()),
            (MarshallerStrategy::BooleanNormalize | MarshallerStrategy::TextView, Direction::In)
            | (MarshallerStrategy::BooleanNormalize, Direction::Return) => Ok(()),
            _ => Err(GenerationError::UnsupportedStrategy {
                ty: ty.to_string(),
                position: match direction {
                    Direction::In => "as a callback parameter".into(),
                    Direction::Return => "as a callback return value".into(),
                    Direction::Out | Direction::InOut => "as a by-ref callback parameter".into(),
                },
            }),
        }
    }
}
