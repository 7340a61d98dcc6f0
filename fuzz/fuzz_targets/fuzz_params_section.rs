#![no_main]

use cytoframe::prelude::*;
use cytoframe::schema::Section;
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tempfile::TempDir;

/// A valid two-channel store, written once per fuzzing process
fn base_store() -> &'static TempDir {
    static STORE: OnceLock<TempDir> = OnceLock::new();
    STORE.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let frame = MemCytoFrame::new(
            vec![ColumnDescriptor::new("A"), ColumnDescriptor::new("B")],
            Keywords::new(),
            EventMatrix::zeros(4, 2),
        )
        .unwrap();
        frame
            .write_store(dir.path().join("base.tile"), false, &StoreConfig::default())
            .unwrap();
        dir
    })
}

fuzz_target!(|data: &[u8]| {
    // Replace the params section with arbitrary bytes; opening must fail
    // gracefully or succeed, never panic
    let work = TempDir::new().unwrap();
    let uri = work.path().join("case.tile");
    cytoframe::store::copy_dir_recursive(&base_store().path().join("base.tile"), &uri).unwrap();
    std::fs::write(Section::Params.path(&uri), data).unwrap();

    if let Ok(mut frame) = TileCytoFrame::open(&uri, false) {
        let _ = frame.get_columns(ColumnType::Channel);
        let _ = frame.flush_meta();
    }
});
