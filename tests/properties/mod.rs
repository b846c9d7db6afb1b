use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use symval::runtime::{DispatchKind, ObjectModel, Universe};
use symval::svm::{
    PersistedRecord, SvmConfig, SvmResult, SymbolId, SymbolValidationManager, ValidationRecord,
};

use crate::common::{self, Fixture};

const OPERATIONS: usize = 7;

/// Each operation first adds whatever its operands need, so any sequence is well-formed.
fn apply(
    svm: &mut SymbolValidationManager<'_, Universe>,
    fx: &Fixture,
    op: usize,
) -> SvmResult<bool> {
    let universe = &fx.universe;
    let canvas = fx.canvas;
    match op {
        0 => svm.add_profiled_type_record(Some(canvas)),
        1 => {
            svm.add_profiled_type_record(Some(canvas))?;
            svm.add_type_from_entry_record(
                universe.entry_type(canvas, common::SHAPE_ENTRY),
                canvas,
                common::SHAPE_ENTRY,
            )
        }
        2 => {
            svm.add_profiled_type_record(Some(canvas))?;
            svm.add_type_by_name_record(Some(fx.circle), canvas)
        }
        3 => {
            svm.add_profiled_type_record(Some(canvas))?;
            svm.add_type_by_name_record(Some(fx.circle_grid), canvas)
        }
        4 => {
            svm.add_profiled_type_record(Some(canvas))?;
            svm.add_static_procedure_from_entry_record(
                universe.entry_procedure(canvas, common::MAX_ENTRY, DispatchKind::Static),
                canvas,
                common::MAX_ENTRY,
            )
        }
        5 => svm.add_type_instance_of_type_record(
            universe.meta_type(),
            universe.root_type(),
            false,
            false,
            true,
        ),
        _ => {
            svm.add_profiled_type_record(Some(canvas))?;
            svm.add_type_by_name_record(Some(fx.circle), canvas)?;
            svm.add_type_initialization_record(fx.circle, true)
        }
    }
}

fn seal_sequence(
    fx: &Fixture,
    ops: &[usize],
    repeat: usize,
) -> Result<Vec<PersistedRecord>, TestCaseError> {
    let mut svm = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    for op in ops {
        for _ in 0..repeat {
            let added =
                apply(&mut svm, fx, *op).map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert!(added, "operation {} must report success on every call", op);
        }
    }
    svm.seal().map_err(|err| TestCaseError::fail(err.to_string()))
}

fn id(raw: u16) -> SymbolId {
    SymbolId::from_raw(raw).expect("non-zero id")
}

proptest! {
    #[test]
    fn prop_instance_of_records_are_totally_ordered(
        a in (1u16..6, 1u16..6, any::<bool>(), any::<bool>(), any::<bool>()),
        b in (1u16..6, 1u16..6, any::<bool>(), any::<bool>(), any::<bool>()),
    ) {
        let make = |fields: (u16, u16, bool, bool, bool)| -> PersistedRecord {
            let (object, cast, object_fixed, cast_fixed, is_instance) = fields;
            ValidationRecord::TypeInstanceOfType {
                object: id(object),
                cast: id(cast),
                object_fixed,
                cast_fixed,
                is_instance,
            }
        };
        let (left, right) = (make(a), make(b));
        let less = left.is_less_than(&right);
        let greater = right.is_less_than(&left);
        prop_assert!(!(less && greater), "order must be antisymmetric");
        prop_assert_eq!(a == b, !less && !greater, "ties only between identical facts");
        prop_assert_eq!(left.is_equal(&right), a == b);
    }

    #[test]
    fn prop_named_records_are_totally_ordered(
        ty in 1u16..4,
        beholder in 1u16..4,
        left_name in "[A-C][a-c]{0,2}",
        right_name in "[A-C][a-c]{0,2}",
    ) {
        let make = |name: &str| -> PersistedRecord {
            ValidationRecord::TypeByName {
                ty: id(ty),
                beholder: id(beholder),
                name: name.to_owned(),
            }
        };
        let (left, right) = (make(&left_name), make(&right_name));
        prop_assert_eq!(left.is_less_than(&right), left_name < right_name);
        prop_assert_eq!(left.is_equal(&right), left_name == right_name);
    }

    #[test]
    fn prop_sealed_list_is_deterministic_and_idempotent(
        ops in prop::collection::vec(0usize..OPERATIONS, 0..16),
    ) {
        let fx = Fixture::build();
        let first = seal_sequence(&fx, &ops, 1)?;
        let second = seal_sequence(&fx, &ops, 1)?;
        prop_assert_eq!(&first, &second, "same calls must seal to the same list");
        let doubled = seal_sequence(&fx, &ops, 2)?;
        prop_assert_eq!(&first, &doubled, "repeating every call must not change the list");
    }
}
