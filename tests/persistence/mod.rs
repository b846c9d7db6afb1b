use std::fs::File;

use symval::cache::{self, CodecError};
use symval::svm::{SvmConfig, SymbolValidationManager};

use crate::common::{self, Fixture};

#[test]
fn sealed_records_survive_a_cache_file() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    let records = compile.seal().expect("seal");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("render.svm");
    cache::write_records(File::create(&path).expect("create"), &records).expect("write");
    let loaded = cache::read_records(File::open(&path).expect("open")).expect("read");
    assert_eq!(loaded, records);

    let load_fx = Fixture::with_padding(2);
    let mut load = SymbolValidationManager::for_load(&load_fx.universe, SvmConfig::strict());
    load.validate_records(&loaded).expect("replay from disk");
}

#[test]
fn damaged_cache_file_is_refused_before_replay() {
    let fx = Fixture::build();
    let mut compile = SymbolValidationManager::for_compile(&fx.universe, SvmConfig::strict());
    common::record_render(&mut compile, &fx).expect("record");
    let mut bytes = cache::encode_records(&compile.seal().expect("seal"));
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    assert!(matches!(cache::decode_records(&bytes), Err(CodecError::ChecksumMismatch)));
    bytes.truncate(10);
    assert!(cache::decode_records(&bytes).is_err(), "Truncated artifacts are discarded");
}
