use symval::runtime::ObjectModel;
use symval::svm::{SvmConfig, SymbolValidationManager};

use crate::common::{self, Fixture};

#[test]
fn records_added_inside_a_region_never_persist() {
    let fx = Fixture::build();
    let universe = &fx.universe;
    let mut svm = SymbolValidationManager::for_compile(universe, SvmConfig::strict());
    assert!(svm.add_profiled_type_record(Some(fx.canvas)).expect("add"));
    let before = svm.records().to_vec();

    svm.enter_heuristic_region().expect("enter");
    assert!(
        svm.is_already_validated(fx.circle_grid),
        "Everything counts as validated while speculating"
    );
    assert!(!svm.add_type_by_name_record(Some(fx.circle), fx.canvas).expect("add"));
    assert!(!svm
        .add_procedure_from_single_implementer_record(
            universe.single_implementer(fx.shape, common::AREA_SLOT, fx.render),
            fx.shape,
            common::AREA_SLOT,
            fx.render,
        )
        .expect("add"));
    assert!(!svm.add_type_initialization_record(fx.circle, true).expect("add"));
    svm.enter_heuristic_region().expect("nested enter");
    svm.exit_heuristic_region().expect("nested exit");
    assert!(svm.in_heuristic_region(), "Outer region stays open after a nested exit");
    svm.exit_heuristic_region().expect("exit");

    assert_eq!(svm.records(), before.as_slice(), "Store must look frozen across the region");
    assert!(!svm.is_already_validated(fx.circle));
    assert_eq!(svm.try_get_id_from_symbol(fx.circle), None, "No IDs leak out of a region");
}

#[test]
fn guard_scopes_the_region() {
    let fx = Fixture::build();
    let mut svm = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    {
        let mut speculative = svm.heuristic_region().expect("open");
        assert!(!speculative
            .add_type_by_name_record(Some(fx.circle), fx.universe.root_type())
            .expect("add"));
    }
    assert!(!svm.in_heuristic_region());
    assert!(svm.records().is_empty());
    let sealed = svm.seal().expect("seal after the guard closed");
    assert!(sealed.is_empty());
}

#[test]
fn exiting_through_the_guard_keeps_the_outer_region_open() {
    let fx = Fixture::build();
    let mut svm = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::default());
    svm.enter_heuristic_region().expect("outer");
    {
        let mut speculative = svm.heuristic_region().expect("inner");
        speculative.exit_heuristic_region().expect("closes the inner region early");
    }
    assert!(
        svm.in_heuristic_region(),
        "Dropping the guard after an early exit must not close the outer region"
    );
    assert!(!svm.add_type_by_name_record(Some(fx.circle), fx.canvas).expect("add"));
    svm.exit_heuristic_region().expect("outer exit");
    assert!(!svm.in_heuristic_region());
    assert!(svm.records().is_empty(), "Nothing recorded while the outer region was open");
}

#[test]
#[should_panic(expected = "heuristic region guard opened at depth 2 closed at depth 1")]
fn strict_mode_panics_on_an_unbalanced_guard() {
    let fx = Fixture::build();
    let mut svm = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    svm.enter_heuristic_region().expect("outer");
    let mut speculative = svm.heuristic_region().expect("inner");
    speculative.exit_heuristic_region().expect("closes the inner region early");
}
