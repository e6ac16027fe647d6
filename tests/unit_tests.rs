//! Generator-level tests.
//!
//! These build declarations by hand through `sash::codegen`, without the
//! attribute macros, and check the resolved plans and emitted tokens.

use quote::quote;
use sash::codegen::{
    ApiDeclaration, CallPlan, EventInterfaceDeclaration, GenerationError, GeneratorConfig,
    MarshallerBinding, MarshallerRegistry, MethodSignature, Parameter, PassModifier, Phase,
    PrimitiveKind, ReturnModifier, TypeRef, generate_api, generate_event_interface,
    lower_camel, native_symbol, plan_methods,
};

fn i32_ty() -> TypeRef {
    TypeRef::Primitive(PrimitiveKind::I32)
}

fn widget() -> ApiDeclaration {
    ApiDeclaration::new("Widget")
        .with_method(MethodSignature::new("get_count").returns(i32_ty()))
        .with_method(
            MethodSignature::new("set_label").param(Parameter::by_value("label", TypeRef::Text)),
        )
}

fn plan(method: MethodSignature) -> Result<CallPlan, GenerationError> {
    CallPlan::new(
        "Widget",
        &method,
        &MarshallerRegistry::builtin(),
        &GeneratorConfig::default(),
    )
}

// =============================================================================
// Name resolution
// =============================================================================

/// Symbols are a pure function of the declaration.
#[test]
fn test_symbol_resolution_is_deterministic() {
    let decl = widget();
    let first: Vec<_> = decl
        .methods
        .iter()
        .map(|m| native_symbol(decl.native_prefix(), m))
        .collect();
    let second: Vec<_> = decl
        .methods
        .iter()
        .map(|m| native_symbol(decl.native_prefix(), m))
        .collect();
    assert_eq!(first, second);
    assert_eq!(first, ["Widget_getCount", "Widget_setLabel"]);
}

#[test]
fn test_lower_camel_keeps_inner_capitals() {
    assert_eq!(lower_camel("get_HP"), "getHP");
    assert_eq!(lower_camel("set_virtual_world"), "setVirtualWorld");
}

#[test]
fn test_native_prefix_override() {
    let decl = widget().with_native_name("CWidget");
    let plans = plan_methods(&decl, &GeneratorConfig::default()).unwrap();
    assert_eq!(plans[0].symbol(), "CWidget_getCount");
}

#[test]
fn test_overloads_resolve_to_distinct_symbols() {
    let decl = ApiDeclaration::new("IActor")
        .with_method(
            MethodSignature::new("set_position")
                .param(Parameter::by_value("x", TypeRef::Primitive(PrimitiveKind::F32)))
                .overload("A"),
        )
        .with_method(
            MethodSignature::new("set_position_vec")
                .param(Parameter::new("pos", TypeRef::named("Vector3"), PassModifier::In))
                .native_name("setPositionB"),
        );
    let plans = plan_methods(&decl, &GeneratorConfig::default()).unwrap();
    assert_eq!(plans[0].symbol(), "IActor_setPositionA");
    assert_eq!(plans[1].symbol(), "IActor_setPositionB");
    assert!(generate_api(&decl, &GeneratorConfig::default()).is_ok());
}

// =============================================================================
// Call plans
// =============================================================================

#[test]
fn test_fast_path_body_is_direct_call() {
    let plan = plan(MethodSignature::new("get_count").returns(i32_ty())).unwrap();
    assert!(plan.is_fast_path());
    assert!(!plan.has_guard());

    let body = plan.body(&quote!(self.handle)).to_string();
    assert!(body.contains(&quote!(unsafe { __invoke(__handle) }).to_string()));
    assert!(!body.contains("catch_unwind"));
}

/// Text in-parameters are pinned and released after the call.
#[test]
fn test_text_plan_stages() {
    let plan = plan(
        MethodSignature::new("set_label").param(Parameter::by_value("label", TypeRef::Text)),
    )
    .unwrap();

    assert!(!plan.is_fast_path());
    assert!(plan.has_guard());
    assert!(!plan.stage(Phase::Setup).is_empty());
    assert!(!plan.stage(Phase::PinnedMarshal).is_empty());
    assert!(!plan.stage(Phase::CleanupCaller).is_empty());
    assert!(plan.stage(Phase::Notify).is_empty());
    assert!(plan.stage(Phase::UnmarshalCapture).is_empty());

    let body = plan.body(&quote!(self.handle)).to_string();
    let call = body.find("__invoke (__handle").unwrap();
    let pinned = body.find("to_native ()").unwrap();
    let free = body.find("free ()").unwrap();
    assert!(pinned < call && call < free);
}

#[test]
fn test_bool_plan_needs_no_guard() {
    let plan = plan(MethodSignature::new("is_visible").returns(TypeRef::Bool)).unwrap();
    assert!(!plan.is_fast_path());
    assert!(!plan.has_guard());
    assert!(
        plan.native_declaration()
            .to_string()
            .contains(&quote!(-> ::sash::BlittableBool).to_string())
    );
}

#[test]
fn test_custom_marshaller_contributes_every_phase() {
    let registry =
        MarshallerRegistry::with_bindings(&[MarshallerBinding::new("Tag", "TagMarshaller")])
            .unwrap();
    let method = MethodSignature::new("update").param(Parameter::new(
        "tag",
        TypeRef::named("Tag"),
        PassModifier::Ref,
    ));
    let plan = CallPlan::new("Probe", &method, &registry, &GeneratorConfig::default()).unwrap();

    for phase in Phase::ALL {
        assert!(!plan.stage(phase).is_empty(), "{phase:?} is empty");
    }
}

#[test]
fn test_by_ref_return_of_marshalled_type_is_rejected() {
    let err = plan(MethodSignature::new("flag").returns_by_ref(TypeRef::Bool, ReturnModifier::ByRef))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        GenerationError::ByRefReturnRequiresMarshalling { ref method, .. } if method == "flag"
    ));
}

#[test]
fn test_library_link_attribute() {
    let config = GeneratorConfig::new().with_library("omp-capi");
    let plans = plan_methods(&widget(), &config).unwrap();
    let declaration = plans[0].native_declaration().to_string();
    assert!(declaration.contains(&quote!(#[link(name = "omp-capi")]).to_string()));
}

// =============================================================================
// Generated items
// =============================================================================

#[test]
fn test_ambiguous_registration_fails_whole_declaration() {
    let decl = widget()
        .with_marshaller(MarshallerBinding::new("bool", "MyBool"))
        .with_method(MethodSignature::new("is_visible").returns(TypeRef::Bool));
    assert!(matches!(
        generate_api(&decl, &GeneratorConfig::default()),
        Err(GenerationError::AmbiguousStrategy { .. })
    ));
}

/// A method named like a generated accessor is refused before any tokens
/// are produced, and the error names the method.
#[test]
fn test_accessor_named_method_is_rejected() {
    let decl = widget().with_method(MethodSignature::new("handle").returns(i32_ty()));
    let err = generate_api(&decl, &GeneratorConfig::default()).unwrap_err();
    assert_eq!(err.method(), Some("handle"));
    assert!(matches!(err, GenerationError::ReservedMethodName { .. }));

    let decl = widget().with_method(
        MethodSignature::new("from_handle").param(Parameter::by_value("raw", i32_ty())),
    );
    assert!(matches!(
        generate_api(&decl, &GeneratorConfig::default()),
        Err(GenerationError::ReservedMethodName { ref method, .. }) if method == "from_handle"
    ));
}

#[test]
fn test_event_interface_default_handler_name() {
    let decl = EventInterfaceDeclaration::new("IPlayerSpawnEventHandler").with_callback(
        MethodSignature::new("on_player_spawn").param(Parameter::by_value("player_id", i32_ty())),
    );
    assert_eq!(decl.handler_name, "PlayerSpawnEventHandler");

    let tokens = generate_event_interface(&decl, &GeneratorConfig::default())
        .unwrap()
        .to_string();
    assert!(tokens.contains("\"PlayerSpawnEventHandlerImpl_create\""));
    assert!(tokens.contains(&quote!(pub struct PlayerSpawnEventHandlerDispatcher).to_string()));
}
