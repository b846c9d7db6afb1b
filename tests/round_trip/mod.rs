use symval::runtime::{DispatchKind, ObjectModel, Symbol};
use symval::svm::{Phase, Presence, RecordKind, SvmConfig, SymbolValidationManager};

use crate::common::{self, Fixture};

#[test]
fn unchanged_universe_validates_every_record() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    let records = compile.seal().expect("seal");
    assert_eq!(compile.phase(), Phase::Sealed);

    let mut load = SymbolValidationManager::for_load(&fx.universe, SvmConfig::strict());
    load.validate_records(&records).expect("replay");
    assert_eq!(load.phase(), Phase::Validated);

    for symbol in [
        Symbol::Type(fx.canvas),
        Symbol::Type(fx.circle),
        Symbol::Type(fx.circle_grid),
        Symbol::Type(fx.util),
        Symbol::Procedure(fx.render),
        Symbol::Procedure(fx.circle_area),
        Symbol::Procedure(fx.max),
    ] {
        assert_eq!(
            load.try_get_id_from_symbol(symbol),
            compile.try_get_id_from_symbol(symbol),
            "Replay must reproduce the compile-time ID of {symbol}"
        );
    }
}

#[test]
fn replay_does_not_depend_on_handle_identity() {
    let compile_fx = Fixture::build();
    let mut compile =
        SymbolValidationManager::for_compile(&compile_fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &compile_fx).expect("record");
    let records = compile.seal().expect("seal");

    let load_fx = Fixture::with_padding(5);
    assert_ne!(compile_fx.circle, load_fx.circle, "Padding should shift every handle");
    let mut load = SymbolValidationManager::for_load(&load_fx.universe, SvmConfig::strict());
    load.validate_records(&records).expect("replay");

    let circle_id = compile.get_id_from_symbol(compile_fx.circle).expect("compile id");
    assert_eq!(
        load.get_type_from_id(circle_id, Presence::Required).expect("bound"),
        Some(load_fx.circle),
        "IDs must resolve to the equivalent symbol of the loading universe"
    );
    let grid_id = compile.get_id_from_symbol(compile_fx.circle_grid).expect("compile id");
    let grid = load
        .get_type_from_id(grid_id, Presence::Required)
        .expect("bound")
        .expect("present");
    assert_eq!(load_fx.universe.type_name(grid), "[[Circle");
    let implementer_id = compile.get_id_from_symbol(compile_fx.circle_area).expect("compile id");
    assert_eq!(
        load.get_procedure_from_id(implementer_id, Presence::Required).expect("bound"),
        Some(load_fx.circle_area)
    );
}

#[test]
fn sealed_list_follows_derivation_order() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    let kinds: Vec<RecordKind> = compile.records().iter().map(|record| record.kind()).collect();
    assert_eq!(
        kinds,
        [
            RecordKind::ProfiledType,
            RecordKind::TypeChain,
            RecordKind::ProcedureFromTypeAndSignature,
            RecordKind::TypeFromEntry,
            RecordKind::TypeChain,
            RecordKind::VirtualProcedureFromEntry,
            RecordKind::TypeByName,
            RecordKind::TypeChain,
            RecordKind::SuperTypeFromType,
            RecordKind::ProcedureFromSingleImplementer,
            RecordKind::TypeInstanceOfType,
            RecordKind::TypeInitialization,
            RecordKind::StaticProcedureFromEntry,
            RecordKind::TypeFromProcedure,
            RecordKind::TypeChain,
            RecordKind::ArrayTypeFromComponent,
            RecordKind::ArrayTypeFromComponent,
            RecordKind::MetaTypeFromType,
        ],
        "New types are followed by their shape check and arrays unroll one dimension at a time"
    );
}

#[test]
fn every_entry_based_kind_round_trips() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let canvas = fx.canvas;
    let mut compile = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    assert!(compile
        .add_system_type_by_name_record(universe.system_type_by_name("Object"))
        .expect("add"));
    assert!(compile.add_profiled_type_record(Some(canvas)).expect("add"));
    assert!(compile
        .add_declaring_type_from_field_record(
            universe.entry_declaring_type(canvas, common::RADIUS_ENTRY),
            canvas,
            common::RADIUS_ENTRY,
        )
        .expect("add"));
    assert!(compile
        .add_defining_type_from_entry_record(
            universe.entry_defining_type(canvas, common::RADIUS_ENTRY, false),
            canvas,
            common::RADIUS_ENTRY,
            false,
        )
        .expect("add"));
    assert!(compile
        .add_static_type_from_entry_record(
            universe.entry_static_type(canvas, common::MAX_ENTRY),
            canvas,
            common::MAX_ENTRY,
        )
        .expect("add"));
    assert!(compile
        .add_type_from_dispatch_entry_record(
            universe.entry_dispatch_type(canvas, common::DRAW_ENTRY),
            canvas,
            common::DRAW_ENTRY,
        )
        .expect("add"));
    assert!(compile
        .add_interface_procedure_from_entry_record(
            universe.entry_interface_procedure(canvas, fx.circle, common::DRAW_ENTRY),
            canvas,
            fx.circle,
            common::DRAW_ENTRY,
        )
        .expect("add"));
    assert!(compile
        .add_procedure_from_type_record(universe.procedure_at(fx.circle, 0), fx.circle, 0)
        .expect("add"));
    assert!(compile
        .add_virtual_procedure_from_offset_record(
            universe.virtual_procedure_at(fx.circle, common::AREA_SLOT as i32, false),
            fx.circle,
            common::AREA_SLOT as i32,
            false,
        )
        .expect("add"));
    assert!(compile.add_type_by_name_record(Some(fx.circle_grid), canvas).expect("add"));
    assert!(compile
        .add_component_type_from_array_record(
            universe.component_type(fx.circle_grid),
            fx.circle_grid,
        )
        .expect("add"));
    let records = compile.seal().expect("seal");

    let mut load = SymbolValidationManager::for_load(universe, SvmConfig::strict());
    load.validate_records(&records).expect("replay");
    assert_eq!(
        load.try_get_id_from_symbol(fx.circle_area),
        compile.try_get_id_from_symbol(fx.circle_area)
    );
}

#[test]
fn speculative_and_check_kinds_round_trip() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let canvas = fx.canvas;
    let mut compile = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    assert!(compile
        .add_type_from_dispatch_entry_record(
            universe.entry_dispatch_type(canvas, common::DRAW_ENTRY),
            canvas,
            common::DRAW_ENTRY,
        )
        .expect("add"));
    assert!(compile
        .add_concrete_subtype_from_type_record(universe.single_concrete_subtype(fx.shape), fx.shape)
        .expect("add"));
    assert!(compile
        .add_procedure_from_single_interface_implementer_record(
            universe.single_interface_implementer(fx.drawable, common::DRAW_ENTRY, fx.render),
            fx.drawable,
            common::DRAW_ENTRY,
            fx.render,
        )
        .expect("add"));
    assert!(compile
        .add_procedure_from_single_abstract_implementer_record(
            universe.single_abstract_implementer(fx.shape, common::AREA_SLOT, fx.render),
            fx.shape,
            common::AREA_SLOT,
            fx.render,
        )
        .expect("add"));
    assert!(compile
        .add_improper_interface_procedure_from_entry_record(
            universe.entry_improper_interface_procedure(canvas, common::HASH_ENTRY),
            canvas,
            common::HASH_ENTRY,
        )
        .expect("add"));
    assert!(
        !compile
            .add_special_procedure_from_entry_record(
                universe.entry_procedure(canvas, common::AREA_ENTRY, DispatchKind::Special),
                canvas,
                common::AREA_ENTRY,
            )
            .expect("add"),
        "A lookup that found nothing is reported as not validated"
    );
    assert!(compile
        .add_stack_walker_may_skip_frames_record(
            fx.render,
            canvas,
            universe.may_skip_frames(fx.render, canvas),
        )
        .expect("add"));
    assert!(compile
        .add_type_from_procedure_record(Some(universe.owner_of(fx.max)), fx.max)
        .expect("add"));
    assert!(
        compile.is_already_validated(fx.hash),
        "Improper interface calls bind to the class procedure"
    );
    let records = compile.seal().expect("seal");

    let mut load = SymbolValidationManager::for_load(universe, SvmConfig::strict());
    load.validate_records(&records).expect("replay");
    assert_eq!(
        load.try_get_id_from_symbol(fx.circle_draw),
        compile.try_get_id_from_symbol(fx.circle_draw)
    );
    assert_eq!(load.try_get_id_from_symbol(fx.hash), compile.try_get_id_from_symbol(fx.hash));
}
