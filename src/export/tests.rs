use super::*;
use crate::codec::{Id40, TripleBatchRecord};
use crate::formats::store_triple_batch;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

fn triple(s: u64, p: u64, o: u64) -> TripleBatchRecord {
    TripleBatchRecord {
        subject_id: Id40::new(s).unwrap(),
        predicate_id: Id40::new(p).unwrap(),
        object_id: Id40::new(o).unwrap(),
    }
}

fn terms() -> TermTable {
    let mut table = TermTable::default();
    table.entities.insert(1, "Amsterdam".to_string());
    table.entities.insert(2, "Delft".to_string());
    table.relations.insert(10, "locatedIn".to_string());
    table.relations.insert(11, "twinnedWith".to_string());
    table
}

fn gunzip(path: &Path) -> String {
    let mut text = String::new();
    GzDecoder::new(fs::File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text
}

#[test]
fn query_stubs_follow_subject_predicate_runs() {
    let dir = tempdir().unwrap();
    let batch = dir.path().join("batch.bin");
    let out = dir.path().join("queries");
    store_triple_batch(
        &batch,
        &[
            triple(1, 10, 5),
            triple(1, 10, 6),
            triple(2, 10, 7),
            triple(2, 11, 1),
            triple(1, 10, 2),
        ],
    )
    .unwrap();

    let written = export_query_stubs(&batch, &terms(), &out).unwrap();
    assert_eq!(written, 4);

    for (predicate, counter) in [(10, 0), (10, 1), (11, 2), (10, 3)] {
        assert!(stub_path(&out, predicate, counter).exists());
    }
    assert!(!stub_path(&out, 10, 4).exists());

    let stub: QueryStub =
        serde_json::from_str(&fs::read_to_string(stub_path(&out, 11, 2)).unwrap()).unwrap();
    assert_eq!(
        stub,
        QueryStub {
            subject: "Delft".to_string(),
            predicate: "twinnedWith".to_string(),
            object: "?".to_string(),
        }
    );
}

#[test]
fn query_stubs_fail_on_unknown_terms() {
    let dir = tempdir().unwrap();
    let records = vec![Ok(triple(9, 10, 1))];
    let err = write_query_stubs(records, &terms(), dir.path()).unwrap_err();
    assert!(matches!(
        err,
        ExportError::UnknownTerm {
            kind: "entity",
            id: 9,
        }
    ));
}

#[test]
fn empty_batch_writes_nothing() {
    let dir = tempdir().unwrap();
    let records: Vec<crate::codec::Result<TripleBatchRecord>> = Vec::new();
    assert_eq!(write_query_stubs(records, &terms(), dir.path()).unwrap(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn dataset_text_export() {
    let dir = tempdir().unwrap();
    let mut entities = std::collections::BTreeMap::new();
    entities.insert(3, "Zürich".to_string());
    entities.insert(1, "a b".to_string());
    let dataset = TripleDataset {
        train: vec![(1, 3, 7), (3, 1, 8)],
        valid: vec![(1, 1, 9)],
        entities,
    };

    let out = dir.path().join("db");
    let summary = dataset.export(&out).unwrap();
    assert_eq!(
        summary,
        ExportSummary {
            valid: 1,
            train: 2,
            entities: 2,
        }
    );

    assert_eq!(fs::read_to_string(out.join(VALID_FILE)).unwrap(), "1 9 1\n");
    assert_eq!(gunzip(&out.join(TRIPLES_FILE)), "1 7 3\n3 8 1\n");
    assert_eq!(gunzip(&out.join(DICT_FILE)), "1 3 a b\n3 6 Zürich\n");
}
