use symval::runtime::{ObjectModel, Universe};
use symval::svm::{
    PersistedRecord, Phase, Presence, RecordKind, SvmConfig, SvmError, SymbolId,
    SymbolValidationManager, ValidationRecord, raw_or_no_id,
};

use crate::common::{self, Fixture};

fn record_fixture(fx: &Fixture) -> Vec<PersistedRecord> {
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, fx).expect("record");
    compile.seal().expect("seal")
}

fn position_of(records: &[PersistedRecord], kind: RecordKind) -> usize {
    records
        .iter()
        .position(|record| record.kind() == kind)
        .expect("kind recorded")
}

#[test]
fn second_implementer_rejects_exactly_the_speculative_record() {
    let records = record_fixture(&Fixture::build());
    let failing = position_of(&records, RecordKind::ProcedureFromSingleImplementer);

    let mut drifted = Fixture::build();
    drifted.load_square();

    let mut prefix = SymbolValidationManager::for_load(&drifted.universe, SvmConfig::default());
    prefix
        .validate_records(&records[..failing])
        .expect("records before the speculation are unaffected");

    let mut load = SymbolValidationManager::for_load(&drifted.universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("speculation no longer holds");
    assert_eq!(
        err,
        SvmError::Rejected {
            index: failing,
            kind: RecordKind::ProcedureFromSingleImplementer
        }
    );
    assert!(!err.is_logic_error(), "Drift is an expected outcome: {err}");
    assert_eq!(load.phase(), Phase::Rejected);
}

#[test]
fn renamed_type_fails_on_its_by_name_record_without_partial_mapping() {
    let mut universe = Universe::new();
    let widget = universe.define_type("Widget").finish();
    let root = universe.root_type();
    let mut compile = SymbolValidationManager::for_compile(&universe, SvmConfig::strict());
    assert!(compile.add_type_by_name_record(Some(widget), root).expect("add"));
    let widget_id = compile.get_id_from_symbol(widget).expect("id");
    let records = compile.seal().expect("seal");

    universe.rename_type(widget, "Gadget");
    let mut load = SymbolValidationManager::for_load(&universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("name no longer resolves");
    assert_eq!(
        err,
        SvmError::Rejected {
            index: 0,
            kind: RecordKind::TypeByName
        }
    );
    assert_eq!(raw_or_no_id(load.try_get_id_from_symbol(widget)), SymbolId::NO_ID);
    assert_eq!(load.get_type_from_id(widget_id, Presence::Optional), Ok(None));
    assert_eq!(
        load.get_type_from_id(SymbolId::FIRST, Presence::Optional),
        Ok(None),
        "A rejected load must not expose any binding, not even the seeded ones"
    );
}

#[test]
fn lost_initialization_is_detected() {
    let records = record_fixture(&Fixture::build());
    let mut drifted = Fixture::build();
    drifted.universe.mark_initialized(drifted.circle, false);

    let mut load = SymbolValidationManager::for_load(&drifted.universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("circle is no longer initialized");
    assert_eq!(
        err,
        SvmError::Rejected {
            index: position_of(&records, RecordKind::TypeInitialization),
            kind: RecordKind::TypeInitialization
        }
    );
}

#[test]
fn gained_initialization_is_harmless() {
    let mut universe = Universe::new();
    let lazy = universe.define_type("Lazy").finish();
    let root = universe.root_type();
    let mut compile = SymbolValidationManager::for_compile(&universe, SvmConfig::strict());
    compile.add_type_by_name_record(Some(lazy), root).expect("add");
    assert!(compile.add_type_initialization_record(lazy, false).expect("add"));
    let records = compile.seal().expect("seal");

    universe.mark_initialized(lazy, true);
    let mut load = SymbolValidationManager::for_load(&universe, SvmConfig::default());
    load.validate_records(&records)
        .expect("initializing later never invalidates code compiled against an uninitialized type");
}

#[test]
fn new_procedure_changes_the_type_shape() {
    let records = record_fixture(&Fixture::build());
    let mut drifted = Fixture::build();
    drifted.universe.define_procedure(drifted.canvas, "clear", "()V").finish();

    let mut load = SymbolValidationManager::for_load(&drifted.universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("canvas changed shape");
    assert_eq!(
        err,
        SvmError::Rejected {
            index: 0,
            kind: RecordKind::ProfiledType
        },
        "A profiled type is re-found by name and shape, so the first record already fails"
    );
}

#[test]
fn frame_skipping_flip_is_detected() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    compile
        .add_stack_walker_may_skip_frames_record(fx.render, fx.canvas, false)
        .expect("add");
    let records = compile.seal().expect("seal");

    let mut drifted = Fixture::build();
    drifted.universe.set_may_skip_frames(drifted.render, true);
    let mut load = SymbolValidationManager::for_load(&drifted.universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("frame skipping changed");
    assert!(matches!(
        err,
        SvmError::Rejected {
            kind: RecordKind::StackWalkerMaySkipFrames,
            ..
        }
    ));
}

#[test]
fn instance_of_outcome_must_match() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    let mut records = compile.seal().expect("seal");
    let index = position_of(&records, RecordKind::TypeInstanceOfType);
    if let ValidationRecord::TypeInstanceOfType { is_instance, .. } = &mut records[index] {
        *is_instance = false;
    }

    let mut load = SymbolValidationManager::for_load(&fx.universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("outcome flipped");
    assert_eq!(
        err,
        SvmError::Rejected {
            index,
            kind: RecordKind::TypeInstanceOfType
        }
    );
}

#[test]
fn reference_to_an_unbound_id_is_a_logic_error() {
    let universe = Universe::new();
    let records: Vec<PersistedRecord> = vec![ValidationRecord::SuperTypeFromType {
        super_type: SymbolId::FIRST,
        child: SymbolId::from_raw(40).expect("id"),
    }];
    let mut load = SymbolValidationManager::for_load(&universe, SvmConfig::default());
    let err = load.validate_records(&records).expect_err("child was never bound");
    assert!(err.is_logic_error(), "A malformed list is not runtime drift: {err}");
    assert_eq!(load.phase(), Phase::Rejected);
}

fn rejection_of(universe: &Universe, records: &[PersistedRecord]) -> SvmError {
    let mut load = SymbolValidationManager::for_load(universe, SvmConfig::default());
    let err = load.validate_records(records).expect_err("drifted runtime must reject");
    assert_eq!(load.phase(), Phase::Rejected);
    err
}

#[test]
fn missing_array_dimension_fails_at_that_dimension() {
    let mut universe = Universe::new();
    let cell = universe.define_type("Cell").finish();
    let row = universe.array_of(cell);
    let grid = universe.array_of(row);
    let root = universe.root_type();
    let mut compile = SymbolValidationManager::for_compile(&universe, SvmConfig::strict());
    assert!(compile.add_type_by_name_record(Some(grid), root).expect("add"));
    let records = compile.seal().expect("seal");
    let kinds: Vec<RecordKind> = records.iter().map(|record| record.kind()).collect();
    assert_eq!(
        kinds,
        [
            RecordKind::TypeByName,
            RecordKind::TypeChain,
            RecordKind::ArrayTypeFromComponent,
            RecordKind::ArrayTypeFromComponent,
        ],
        "A two-dimensional array unrolls into its base component plus one record per dimension"
    );

    let mut shallow = Universe::new();
    let cell = shallow.define_type("Cell").finish();
    shallow.array_of(cell);
    assert_eq!(
        rejection_of(&shallow, &records),
        SvmError::Rejected {
            index: 3,
            kind: RecordKind::ArrayTypeFromComponent
        },
        "The first dimension still resolves, only the second is gone"
    );
}

#[test]
fn array_depth_beyond_the_limit_is_not_recorded() {
    let fx = Fixture::build();
    let config = SvmConfig::default().with_max_array_dimensions(1);
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, config);
    let err = compile
        .add_type_by_name_record(Some(fx.circle_grid), fx.universe.root_type())
        .expect_err("two dimensions exceed the configured limit");
    assert!(matches!(err, SvmError::Limit { .. }), "unexpected error: {err}");
    assert!(!err.is_logic_error(), "A limit only abandons this compilation");
    assert!(compile.records().is_empty());
    assert_eq!(compile.try_get_id_from_symbol(fx.circle), None);
}

#[test]
fn second_concrete_subtype_rejects_the_concrete_subtype_record() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let mut compile = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    compile.add_profiled_type_record(Some(fx.canvas)).expect("add");
    compile
        .add_type_from_entry_record(
            universe.entry_type(fx.canvas, common::SHAPE_ENTRY),
            fx.canvas,
            common::SHAPE_ENTRY,
        )
        .expect("add");
    assert_eq!(universe.single_concrete_subtype(fx.shape), Some(fx.circle));
    assert!(compile
        .add_concrete_subtype_from_type_record(universe.single_concrete_subtype(fx.shape), fx.shape)
        .expect("add"));
    let records = compile.seal().expect("seal");

    let mut drifted = Fixture::build();
    drifted.load_square();
    assert_eq!(
        rejection_of(&drifted.universe, &records),
        SvmError::Rejected {
            index: position_of(&records, RecordKind::ConcreteSubtypeFromType),
            kind: RecordKind::ConcreteSubtypeFromType
        }
    );
}

#[test]
fn second_abstract_implementer_rejects_the_speculative_record() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let mut compile = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    compile.add_profiled_type_record(Some(fx.canvas)).expect("add");
    compile
        .add_procedure_from_type_and_signature_record(Some(fx.render), fx.canvas, fx.canvas)
        .expect("add");
    compile
        .add_type_from_entry_record(
            universe.entry_type(fx.canvas, common::SHAPE_ENTRY),
            fx.canvas,
            common::SHAPE_ENTRY,
        )
        .expect("add");
    let implementer = universe.single_abstract_implementer(fx.shape, common::AREA_SLOT, fx.render);
    assert_eq!(implementer, Some(fx.circle_area));
    assert!(compile
        .add_procedure_from_single_abstract_implementer_record(
            implementer,
            fx.shape,
            common::AREA_SLOT,
            fx.render,
        )
        .expect("add"));
    let records = compile.seal().expect("seal");

    let mut drifted = Fixture::build();
    drifted.load_square();
    assert_eq!(
        rejection_of(&drifted.universe, &records),
        SvmError::Rejected {
            index: position_of(&records, RecordKind::ProcedureFromSingleAbstractImplementer),
            kind: RecordKind::ProcedureFromSingleAbstractImplementer
        }
    );
}

#[test]
fn second_interface_implementer_rejects_the_speculative_record() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let mut compile = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    compile.add_profiled_type_record(Some(fx.canvas)).expect("add");
    compile
        .add_procedure_from_type_and_signature_record(Some(fx.render), fx.canvas, fx.canvas)
        .expect("add");
    compile
        .add_type_by_name_record(universe.type_by_name(fx.canvas, "Drawable"), fx.canvas)
        .expect("add");
    let implementer =
        universe.single_interface_implementer(fx.drawable, common::DRAW_ENTRY, fx.render);
    assert_eq!(implementer, Some(fx.circle_draw));
    assert!(compile
        .add_procedure_from_single_interface_implementer_record(
            implementer,
            fx.drawable,
            common::DRAW_ENTRY,
            fx.render,
        )
        .expect("add"));
    let records = compile.seal().expect("seal");

    let mut drifted = Fixture::build();
    let sprite = drifted
        .universe
        .define_type("Sprite")
        .context(drifted.app)
        .implements(drifted.drawable)
        .finish();
    drifted.universe.define_procedure(sprite, "draw", "()V").finish();
    assert_eq!(
        rejection_of(&drifted.universe, &records),
        SvmError::Rejected {
            index: position_of(&records, RecordKind::ProcedureFromSingleInterfaceImplementer),
            kind: RecordKind::ProcedureFromSingleInterfaceImplementer
        }
    );
}
