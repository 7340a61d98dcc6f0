use super::*;
use crate::metadata::{ColumnDescriptor, MetaCategory};
use crate::store::StoreConfig;
use std::error::Error;
use tempfile::tempdir;

/// 10 events x 8 channels; value = row * 8 + col, exact in f32
fn sample_frame() -> MemCytoFrame {
    let n_rows = 10;
    let n_cols = 8;
    let columns: Vec<Vec<f64>> = (0..n_cols)
        .map(|c| (0..n_rows).map(|r| (r * n_cols + c) as f64).collect())
        .collect();
    let matrix = EventMatrix::from_columns(n_rows, columns).unwrap();

    let params: Vec<ColumnDescriptor> = (1..=n_cols)
        .map(|i| {
            ColumnDescriptor::new(format!("FL{}-A", i))
                .with_marker(if i == 3 { "CD3" } else { "" })
                .with_instrument_range(0.0, 1024.0)
        })
        .collect();

    let mut keywords: Keywords = vec![("$PAR".to_string(), n_cols.to_string())]
        .into_iter()
        .collect();
    for i in 1..=n_cols {
        keywords.set(format!("$P{}N", i), format!("FL{}-A", i));
        keywords.set(format!("$P{}R", i), "1024");
    }

    MemCytoFrame::new(params, keywords, matrix)
        .unwrap()
        .with_pheno(vec![("name", "sample.fcs")].into_iter().collect())
}

fn sample_tile(dir: &Path) -> TileCytoFrame {
    TileCytoFrame::create_from(
        &sample_frame(),
        dir.join("sample.tile"),
        false,
        StoreConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_mem_new_validates_shape() {
    let matrix = EventMatrix::zeros(3, 2);
    let err = MemCytoFrame::new(vec![ColumnDescriptor::new("A")], Keywords::new(), matrix.clone())
        .unwrap_err();
    assert!(matches!(err, FrameError::SizeMismatch { .. }));

    let dup = vec![ColumnDescriptor::new("A"), ColumnDescriptor::new("a")];
    let err = MemCytoFrame::new(dup, Keywords::new(), matrix.clone()).unwrap_err();
    assert!(matches!(err, FrameError::DuplicateName(_)));

    let unnamed = vec![ColumnDescriptor::new(""), ColumnDescriptor::new("B")];
    let err = MemCytoFrame::new(unnamed, Keywords::new(), matrix).unwrap_err();
    assert!(matches!(err, FrameError::InvalidName(_)));
}

#[test]
fn test_column_lookup() {
    let frame = sample_frame();
    assert_eq!(frame.n_cols(), 8);
    assert_eq!(frame.n_rows(), 10);
    assert_eq!(frame.column_index("fl2-a", ColumnType::Channel).unwrap(), 1);
    assert_eq!(frame.column_index("cd3", ColumnType::Marker).unwrap(), 2);
    assert_eq!(
        frame
            .column_indices(&["FL8-A", "FL1-A"], ColumnType::Channel)
            .unwrap(),
        vec![7, 0]
    );
    assert_eq!(frame.marker_of("FL3-A").unwrap(), "CD3");
    assert!(matches!(
        frame.column_index("FSC-A", ColumnType::Channel),
        Err(FrameError::NotFound(_))
    ));
}

#[test]
fn test_set_columns_updates_keywords() {
    let mut frame = sample_frame();
    let names: Vec<String> = (1..=8).map(|i| format!("C{}", i)).collect();
    frame.set_columns(&names).unwrap();

    assert_eq!(frame.get_columns(ColumnType::Channel), names);
    assert_eq!(frame.get_keyword("$P4N").unwrap(), "C4");
    assert_eq!(frame.column_index("c4", ColumnType::Channel).unwrap(), 3);

    let err = frame.set_columns(&names[..3]).unwrap_err();
    assert!(matches!(err, FrameError::SizeMismatch { expected: 8, found: 3 }));
}

#[test]
fn test_rename_and_ranges() {
    let mut frame = sample_frame();
    frame.rename_column("FL1-A", "CD4", true).unwrap();
    assert_eq!(frame.get_keyword("$P1N").unwrap(), "CD4");
    assert!(matches!(
        frame.rename_column("CD4", "fl2-a", false),
        Err(FrameError::DuplicateName(_))
    ));

    frame
        .set_range("CD4", ColumnType::Channel, (-10.0, 4096.0), true)
        .unwrap();
    assert_eq!(
        frame
            .get_range("cd4", ColumnType::Channel, RangeType::Instrument)
            .unwrap(),
        (-10.0, 4096.0)
    );
    assert_eq!(frame.get_keyword("flowCore_$P1Rmin").unwrap(), "-10");
    assert_eq!(frame.get_keyword("flowCore_$P1Rmax").unwrap(), "4096");
}

#[test]
fn test_mem_set_data_recomputes_data_ranges() {
    let mut frame = sample_frame();
    let replacement = EventMatrix::from_columns(2, vec![vec![-1.0, 5.0]; 8]).unwrap();
    frame.set_data(replacement.clone()).unwrap();

    assert_eq!(frame.n_rows(), 2);
    assert_eq!(frame.get_data().unwrap(), replacement);
    assert_eq!(
        frame
            .get_range("FL1-A", ColumnType::Channel, RangeType::Data)
            .unwrap(),
        (-1.0, 5.0)
    );

    let err = frame.set_data(EventMatrix::zeros(2, 3)).unwrap_err();
    assert!(matches!(err, FrameError::SizeMismatch { expected: 8, found: 3 }));
}

#[test]
fn test_mem_subset_in_place() {
    let mut frame = sample_frame();
    frame.subset_columns(&[5, 2]).unwrap();
    assert_eq!(frame.get_columns(ColumnType::Channel), vec!["FL6-A", "FL3-A"]);
    assert_eq!(frame.get_keyword("$PAR").unwrap(), "2");
    assert_eq!(frame.get_keyword("$P1N").unwrap(), "FL6-A");
    assert!(frame.get_keyword("$P3N").is_err());

    frame.subset_rows(&[9, 0]).unwrap();
    assert_eq!(frame.matrix().to_row_major(), vec![77.0, 74.0, 5.0, 2.0]);

    assert!(matches!(
        frame.subset_columns(&[0, 0]),
        Err(FrameError::DuplicateName(_))
    ));
    assert!(matches!(
        frame.subset_rows(&[2]),
        Err(FrameError::IndexOutOfBounds { axis: "row", .. })
    ));
}

#[test]
fn test_keywords_and_pheno() {
    let mut frame = sample_frame();
    assert!(matches!(frame.get_keyword("$FIL"), Err(FrameError::NotFound(_))));
    frame.set_keyword("$FIL", "a.fcs");
    assert_eq!(frame.get_keyword("$fil").unwrap(), "a.fcs");

    assert_eq!(frame.get_pheno("name").unwrap(), "sample.fcs");
    frame.set_pheno("batch", "7");
    assert_eq!(frame.del_pheno("batch").as_deref(), Some("7"));
    assert!(frame.del_pheno("batch").is_none());
    assert!(matches!(frame.get_pheno("batch"), Err(FrameError::NotFound(_))));
}

#[test]
fn test_tile_open_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let source = sample_frame();
    let tile = sample_tile(dir.path());

    assert_eq!(tile.backend(), Backend::Tile);
    assert_eq!(tile.dims(), (10, 8));
    assert!(tile.is_open());
    assert!(!tile.dirty_flags().any());
    assert_eq!(tile.params(), source.params());
    assert_eq!(tile.get_keywords(), source.get_keywords());
    assert_eq!(tile.get_pheno_data(), source.get_pheno_data());
    assert_eq!(tile.get_data()?, *source.matrix());
    assert_eq!(tile.to_mem()?, source);
    Ok(())
}

#[test]
fn test_tile_open_missing_store() {
    let dir = tempdir().unwrap();
    let err = TileCytoFrame::open(dir.path().join("absent.tile"), true).unwrap_err();
    assert!(matches!(err, FrameError::NotFound(_)));

    let err = TileCytoFrame::open("s3://bucket/sample.tile", true).unwrap_err();
    assert!(matches!(err, FrameError::Unsupported(_)));
}

#[test]
fn test_tile_column_subset_matches_full_read() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());

    let full = tile.get_data()?;
    let subset = tile.get_data_subset(None, Some(&[2, 5]))?;
    assert_eq!(subset, full.select_cols(&[2, 5])?);

    let both = tile.get_data_subset(Some(&[4, 1]), Some(&[5, 2]))?;
    assert_eq!(both, full.select(Some(&[4, 1]), Some(&[5, 2]))?);

    let by_name = tile.get_data_by_names(&["CD3"], ColumnType::Marker)?;
    assert_eq!(by_name, full.select_cols(&[2])?);

    assert!(matches!(
        tile.get_data_subset(None, Some(&[8])),
        Err(FrameError::IndexOutOfBounds { axis: "column", .. })
    ));
    Ok(())
}

#[test]
fn test_dirty_flags_lifecycle() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());

    tile.set_marker("FL1-A", "CD45")?;
    assert!(tile.is_dirty(MetaCategory::Params));
    assert!(!tile.is_dirty(MetaCategory::Keywords));

    tile.set_pheno("batch", "3");
    assert_eq!(
        tile.dirty_flags().dirty_categories(),
        vec![MetaCategory::Params, MetaCategory::PhenoData]
    );

    tile.flush_params()?;
    assert!(!tile.is_dirty(MetaCategory::Params));
    assert!(tile.is_dirty(MetaCategory::PhenoData));

    tile.flush_meta()?;
    assert!(!tile.dirty_flags().any());

    let reopened = TileCytoFrame::open(tile.uri(), true)?;
    assert_eq!(reopened.marker_of("FL1-A")?, "CD45");
    assert_eq!(reopened.get_pheno("batch")?, "3");
    Ok(())
}

type Setter = fn(&mut TileCytoFrame) -> Result<(), FrameError>;

/// Every public metadata mutation marks exactly the categories it changed
#[test]
fn test_each_setter_marks_its_categories() -> Result<(), Box<dyn Error>> {
    use MetaCategory::{Keywords as Kw, Params, PhenoData as Pd};

    let cases: [(&str, Setter, &[MetaCategory]); 16] = [
        ("set_params", |f| {
            let mut params = f.params().to_vec();
            params[0].marker = "CD45".to_string();
            f.set_params(params)
        }, &[Params]),
        ("set_columns", |f| {
            let names: Vec<String> = (1..=8).map(|i| format!("P{}", i)).collect();
            f.set_columns(&names)
        }, &[Params, Kw]),
        ("rename_column with keywords", |f| f.rename_column("FL2-A", "CD8", true), &[Params, Kw]),
        ("rename_column", |f| f.rename_column("FL2-A", "CD8", false), &[Params]),
        ("rename_columns with keywords", |f| {
            let swap = [
                ("FL1-A".to_string(), "FL2-A".to_string()),
                ("FL2-A".to_string(), "FL1-A".to_string()),
            ];
            f.rename_columns(&swap, true)
        }, &[Params, Kw]),
        ("rename_columns", |f| {
            f.rename_columns(&[("FL1-A".to_string(), "CD4".to_string())], false)
        }, &[Params]),
        ("set_marker", |f| f.set_marker("FL4-A", "CD19"), &[Params]),
        ("set_range with keywords", |f| {
            f.set_range("CD3", ColumnType::Marker, (-10.0, 500.0), true)
        }, &[Params, Kw]),
        ("set_range", |f| f.set_range("FL1-A", ColumnType::Channel, (-10.0, 500.0), false), &[Params]),
        ("set_keyword", |f| {
            f.set_keyword("$FIL", "edited.fcs");
            Ok(())
        }, &[Kw]),
        ("set_keywords", |f| {
            f.set_keywords(vec![("$PAR", "8")].into_iter().collect());
            Ok(())
        }, &[Kw]),
        ("set_pheno", |f| {
            f.set_pheno("batch", "7");
            Ok(())
        }, &[Pd]),
        ("set_pheno_data", |f| {
            f.set_pheno_data(vec![("visit", "2")].into_iter().collect());
            Ok(())
        }, &[Pd]),
        ("del_pheno", |f| {
            assert_eq!(f.del_pheno("name").as_deref(), Some("sample.fcs"));
            Ok(())
        }, &[Pd]),
        ("del_pheno of a missing attribute", |f| {
            assert!(f.del_pheno("missing").is_none());
            Ok(())
        }, &[]),
        ("set_data", |f| f.set_data(EventMatrix::from_columns(2, vec![vec![1.0, 4.0]; 8])?), &[Params]),
    ];

    let dir = tempdir()?;
    for (i, (name, setter, expected)) in cases.into_iter().enumerate() {
        let uri = dir.path().join(format!("case{}.tile", i));
        let mut tile = TileCytoFrame::create_from(&sample_frame(), &uri, false, StoreConfig::default())?;
        let before = tile.cache().clone();

        setter(&mut tile)?;
        assert_eq!(tile.dirty_flags().dirty_categories(), expected, "{}", name);

        // Flushing the marked categories persists the whole cached state
        tile.flush_meta()?;
        let reopened = TileCytoFrame::open(&uri, true)?;
        assert_eq!(reopened.cache(), tile.cache(), "{}", name);
        if expected.is_empty() {
            assert_eq!(tile.cache(), &before, "{}", name);
        }
    }
    Ok(())
}

#[test]
fn test_load_meta_discards_unflushed_changes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());

    tile.rename_column("FL2-A", "CD8", true)?;
    tile.set_keyword("$FIL", "renamed.fcs");
    assert!(tile.dirty_flags().any());

    tile.load_meta()?;
    assert!(!tile.dirty_flags().any());
    assert_eq!(tile.column_index("FL2-A", ColumnType::Channel)?, 1);
    assert!(tile.get_keyword("$FIL").is_err());
    Ok(())
}

#[test]
fn test_readonly_flush_keeps_flags() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());
    let uri = tile.uri().to_path_buf();
    drop(tile);

    let mut readonly = TileCytoFrame::open(&uri, true)?;
    assert!(readonly.is_readonly());
    readonly.set_keyword("$FIL", "x.fcs");

    let err = readonly.flush_meta().unwrap_err();
    assert!(matches!(err, FrameError::ReadOnly(_)));
    assert!(readonly.is_dirty(MetaCategory::Keywords));

    readonly.set_readonly(false);
    readonly.flush_meta()?;
    assert!(!readonly.dirty_flags().any());
    Ok(())
}

#[test]
fn test_readonly_set_data_leaves_store_unchanged() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());
    let before = tile.get_data()?;
    let uri = tile.uri().to_path_buf();
    drop(tile);

    let mut readonly = TileCytoFrame::open(&uri, true)?;
    let err = readonly.set_data(EventMatrix::zeros(3, 8)).unwrap_err();
    assert!(matches!(err, FrameError::ReadOnly(_)));
    assert_eq!(readonly.dims(), (10, 8));
    assert_eq!(TileCytoFrame::open(&uri, true)?.get_data()?, before);
    Ok(())
}

#[test]
fn test_tile_set_data() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());

    let replacement = EventMatrix::from_columns(3, vec![vec![0.5, 1.5, 2.5]; 8])?;
    tile.set_data(replacement.clone())?;
    assert!(tile.is_open());
    assert_eq!(tile.dims(), (3, 8));
    assert_eq!(tile.get_data()?, replacement);
    assert!(tile.is_dirty(MetaCategory::Params));
    assert_eq!(
        tile.get_range("FL1-A", ColumnType::Channel, RangeType::Data)?,
        (0.5, 2.5)
    );

    tile.flush_meta()?;
    let reopened = TileCytoFrame::open(tile.uri(), true)?;
    assert_eq!(reopened.dims(), (3, 8));
    assert_eq!(
        reopened.get_range("FL1-A", ColumnType::Channel, RangeType::Data)?,
        (0.5, 2.5)
    );

    let err = tile.set_data(EventMatrix::zeros(3, 2)).unwrap_err();
    assert!(matches!(err, FrameError::SizeMismatch { .. }));
    Ok(())
}

#[test]
fn test_tile_data_ranges_follow_stored_precision() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());

    // 0.1 and 16777217 are not representable in f32
    let replacement = EventMatrix::from_columns(2, vec![vec![0.1, 16_777_217.0]; 8])?;
    tile.set_data(replacement)?;
    tile.flush_meta()?;

    let reopened = TileCytoFrame::open(tile.uri(), true)?;
    let stored = reopened.get_data()?;
    let column = stored.column(0).unwrap_or_default();
    let observed = (
        column.iter().copied().fold(f64::INFINITY, f64::min),
        column.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    assert_eq!(
        reopened.get_range("FL1-A", ColumnType::Channel, RangeType::Data)?,
        observed
    );
    assert_eq!(observed, (f64::from(0.1f32), 16_777_216.0));
    Ok(())
}

#[test]
fn test_closed_handle_reopens_on_read() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());
    tile.close();
    assert!(!tile.is_open());
    assert_eq!(tile.get_data()?.shape(), (10, 8));
    Ok(())
}

#[test]
fn test_tile_copy_is_independent() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());

    let dest = dir.path().join("copy.tile");
    let mut copy = tile.copy_with(None, None, &CopyOptions::to(&dest))?;
    assert_eq!(copy.uri(), dest.as_path());
    assert_eq!(copy.get_data()?, tile.get_data()?);

    copy.set_keyword("$FIL", "copy.fcs");
    copy.set_data(EventMatrix::zeros(1, 8))?;
    copy.flush_meta()?;

    assert!(tile.get_keyword("$FIL").is_err());
    assert_eq!(tile.get_data()?.shape(), (10, 8));

    tile.set_pheno("name", "changed");
    assert_eq!(copy.get_pheno("name")?, "sample.fcs");
    tile.load_meta()?;
    Ok(())
}

#[test]
fn test_tile_copy_destination_rules() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());

    let err = tile
        .copy_with(None, None, &CopyOptions::to(tile.uri()))
        .unwrap_err();
    assert!(matches!(err, FrameError::AlreadyExists(_)));

    // Explicit overwrite of the source's own store is allowed
    let replaced = tile.copy_with(
        Some(&[0, 1, 2]),
        None,
        &CopyOptions::to(tile.uri()).overwrite(true),
    )?;
    assert_eq!(replaced.dims(), (3, 8));
    assert_eq!(replaced.uri(), tile.uri());
    drop(replaced);
    let tile = TileCytoFrame::open(tile.uri(), false)?;
    assert_eq!(tile.dims(), (3, 8));

    let dest = dir.path().join("other.tile");
    tile.copy_with(None, None, &CopyOptions::to(&dest))?;
    let err = tile
        .copy_with(None, Some(&[0]), &CopyOptions::to(&dest))
        .unwrap_err();
    assert!(matches!(err, FrameError::AlreadyExists(_)));

    let narrow = tile.copy_with(None, Some(&[0]), &CopyOptions::to(&dest).overwrite(true))?;
    assert_eq!(narrow.dims(), (3, 1));

    let auto = tile.copy()?;
    assert!(auto.uri().starts_with(std::env::temp_dir()));
    assert_eq!(auto.dims(), (3, 8));
    let auto_uri = auto.uri().to_path_buf();
    drop(auto);
    crate::store::remove_location(&auto_uri)?;
    Ok(())
}

#[test]
fn test_overwritten_source_refuses_stale_writes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());
    let uri = tile.uri().to_path_buf();

    let replaced = tile.copy_with(
        Some(&[0, 1, 2]),
        Some(&[0, 1]),
        &CopyOptions::to(&uri).overwrite(true),
    )?;
    assert_eq!(replaced.dims(), (3, 2));
    let expected = replaced.get_data()?;
    drop(replaced);

    // The source still caches 10x8 and must not touch the 3x2 store
    assert_eq!(tile.dims(), (10, 8));
    assert!(matches!(tile.get_data(), Err(FrameError::SchemaInconsistency(_))));
    assert!(matches!(
        tile.get_data_subset(None, Some(&[0])),
        Err(FrameError::SchemaInconsistency(_))
    ));

    tile.set_marker("FL1-A", "CD45")?;
    assert!(matches!(tile.flush_meta(), Err(FrameError::SchemaInconsistency(_))));
    assert!(tile.is_dirty(MetaCategory::Params));
    assert!(matches!(
        tile.set_data(EventMatrix::zeros(1, 8)),
        Err(FrameError::SchemaInconsistency(_))
    ));

    let on_disk = TileCytoFrame::open(&uri, true)?;
    assert_eq!(on_disk.dims(), (3, 2));
    assert_eq!(on_disk.marker_of("FL1-A")?, "");
    drop(on_disk);

    // Reloading re-syncs the source with the new store
    tile.load_meta()?;
    assert_eq!(tile.dims(), (3, 2));
    assert!(!tile.dirty_flags().any());
    assert_eq!(tile.get_columns(ColumnType::Channel), vec!["FL1-A", "FL2-A"]);
    assert_eq!(tile.get_data()?, expected);
    Ok(())
}

#[test]
fn test_overwritten_source_with_same_dims_reads_new_store() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());

    let mut replaced = tile.copy_with(None, None, &CopyOptions::to(tile.uri()).overwrite(true))?;
    replaced.set_data(EventMatrix::from_columns(10, vec![vec![2.5; 10]; 8])?)?;
    replaced.flush_meta()?;
    drop(replaced);

    assert_eq!(tile.get_data()?, EventMatrix::from_columns(10, vec![vec![2.5; 10]; 8])?);
    Ok(())
}

#[test]
fn test_tile_subset_copy_renumbers_keywords() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tile = sample_tile(dir.path());

    let subset = tile.copy_with(
        Some(&[0, 1, 2]),
        Some(&[6, 3]),
        &CopyOptions::to(dir.path().join("subset.tile")),
    )?;
    assert_eq!(subset.dims(), (3, 2));
    assert_eq!(subset.get_columns(ColumnType::Channel), vec!["FL7-A", "FL4-A"]);
    assert_eq!(subset.get_keyword("$PAR")?, "2");
    assert_eq!(subset.get_keyword("$P1N")?, "FL7-A");
    assert_eq!(subset.get_keyword("$P2N")?, "FL4-A");
    assert_eq!(
        subset.get_data()?,
        tile.get_data()?.select(Some(&[0, 1, 2]), Some(&[6, 3]))?
    );
    Ok(())
}

#[test]
fn test_mem_copy_and_backend_conversion() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let frame = sample_frame();
    let copy = frame.copy()?;
    assert_eq!(copy, frame);

    let tile = sample_tile(dir.path());
    assert_eq!(MemCytoFrame::from_tile(&tile)?, frame);
    Ok(())
}

#[test]
fn test_tile_messages() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());
    let original_uri = tile.uri().to_path_buf();

    let link = dir.path().join("link.tile");
    let err = tile.to_message(&link, MigrationOption::Link).unwrap_err();
    assert!(matches!(err, FrameError::Unsupported(_)));
    assert!(!link.exists());

    let skip = tile.to_message(&link, MigrationOption::Skip)?;
    assert_eq!(skip.uri.as_deref(), Some(original_uri.as_path()));
    assert_eq!(skip.backend, Backend::Tile);
    assert_eq!((skip.n_rows, skip.n_cols), (10, 8));

    let copied = dir.path().join("copied.tile");
    let message = tile.to_message(&copied, MigrationOption::Copy)?;
    assert_eq!(message.uri.as_deref(), Some(copied.as_path()));
    assert_eq!(TileCytoFrame::open(&copied, true)?.get_data()?, tile.get_data()?);

    let missing_parent = dir.path().join("nope").join("x.tile");
    assert!(matches!(
        tile.to_message(&missing_parent, MigrationOption::Copy),
        Err(FrameError::NotFound(_))
    ));

    let moved = dir.path().join("moved.tile");
    tile.set_readonly(true);
    let err = tile.to_message(&moved, MigrationOption::Move).unwrap_err();
    assert!(matches!(err, FrameError::ReadOnly(_)));
    assert!(original_uri.is_dir());
    assert!(!moved.exists());
    assert_eq!(tile.uri(), original_uri.as_path());

    // Copy leaves the persisted store alone, so it is allowed read-only
    let readonly_copy = dir.path().join("readonly-copy.tile");
    tile.to_message(&readonly_copy, MigrationOption::Copy)?;
    tile.set_readonly(false);

    tile.to_message(&moved, MigrationOption::Move)?;
    assert_eq!(tile.uri(), moved.as_path());
    assert!(!original_uri.exists());
    assert_eq!(tile.get_data()?.shape(), (10, 8));

    // Migrating onto the current location is a no-op
    let same = tile.to_message(&moved, MigrationOption::Copy)?;
    assert_eq!(same.uri.as_deref(), Some(moved.as_path()));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_tile_symlink_message() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut tile = sample_tile(dir.path());
    let link = dir.path().join("linked.tile");

    tile.to_message(&link, MigrationOption::Symlink)?;
    assert!(std::fs::symlink_metadata(&link)?.file_type().is_symlink());
    assert_eq!(TileCytoFrame::open(&link, true)?.dims(), (10, 8));
    Ok(())
}

#[test]
fn test_mem_messages() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut frame = sample_frame();

    let skip = frame.to_message(dir.path(), MigrationOption::Skip)?;
    assert!(skip.uri.is_none());
    assert_eq!(skip.backend, Backend::Mem);

    assert!(matches!(
        frame.to_message(dir.path(), MigrationOption::Symlink),
        Err(FrameError::Unsupported(_))
    ));

    let dest = dir.path().join("mem.tile");
    let message = frame.to_message(&dest, MigrationOption::Copy)?;
    let json = message.to_json()?;
    let decoded = FrameMessage::from_json(&json)?;
    assert_eq!(decoded, message);

    let reopened = decoded.open(false)?;
    assert_eq!(reopened.to_mem()?, frame);
    assert!(!reopened.dirty_flags().any());

    let mut edited = decoded.clone();
    edited.keywords.set("$FIL", "edited.fcs");
    let restored = edited.open(false)?;
    assert!(restored.is_dirty(MetaCategory::Keywords));
    assert_eq!(restored.get_keyword("$FIL")?, "edited.fcs");
    Ok(())
}
