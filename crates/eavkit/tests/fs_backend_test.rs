use eavkit::model::{EntityRef, ValueRecord, ValueTable};
use eavkit::store::fs_backend::FsBackend;
use eavkit::store::{MetadataStore, ValueStore};
use eavkit::{AttrValue, AttributeCache, AttributeDefinition, DataType, EavApi, EavConfig};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use uuid::Uuid;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().to_path_buf());
    (dir, backend)
}

#[test]
fn test_fs_backend_definitions_io() {
    let (_dir, backend) = setup();
    let color = AttributeDefinition::new("product", "color", "string").with_label("Color");
    backend.define(color.clone()).unwrap();
    backend
        .define(AttributeDefinition::new("order", "note", "text"))
        .unwrap();

    let fetched = backend.fetch_definitions("product").unwrap();
    assert_eq!(fetched, vec![color]);
    assert!(backend.fetch_definitions("customer").unwrap().is_empty());
}

#[test]
fn test_fs_backend_save_definitions_replaces_type() {
    let (_dir, backend) = setup();
    backend
        .define(AttributeDefinition::new("product", "color", "string"))
        .unwrap();
    backend
        .save_definitions(
            "product",
            &[AttributeDefinition::new("product", "size", "integer")],
        )
        .unwrap();

    let codes: Vec<_> = backend
        .fetch_definitions("product")
        .unwrap()
        .into_iter()
        .map(|d| d.code)
        .collect();
    assert_eq!(codes, vec!["size"]);
}

#[test]
fn test_fs_backend_scalar_value_io() {
    let (dir, backend) = setup();
    let definition = AttributeDefinition::new("product", "color", "string");
    let entity = EntityRef::new("product", Uuid::new_v4());
    let table = ValueTable::new(DataType::String, false);

    // 1. Write
    let mut record = ValueRecord::new(table, &entity, &definition, AttrValue::from("red"));
    backend.persist_value(&record).unwrap();

    // 2. Overwrite in place
    record.value = AttrValue::from("blue");
    backend.persist_value(&record).unwrap();

    // 3. Read
    let loaded = backend
        .load_value(table, &entity.entity_id, &definition.id)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.value, AttrValue::from("blue"));
    assert!(dir.path().join("values/string.scalar.json").exists());

    // No temporary files left behind
    for entry in fs::read_dir(dir.path().join("values")).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_fs_backend_collection_io() {
    let (_dir, backend) = setup();
    let definition = AttributeDefinition::new("product", "tags", "string").collection();
    let entity = EntityRef::new("product", Uuid::new_v4());
    let table = ValueTable::new(DataType::String, true);

    for tag in ["a", "b"] {
        let record = ValueRecord::new(table, &entity, &definition, AttrValue::from(tag));
        backend.persist_collection_member(&record).unwrap();
    }

    let members: Vec<_> = backend
        .load_collection(table, &entity.entity_id, &definition.id)
        .unwrap()
        .into_iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(members, vec![AttrValue::from("a"), AttrValue::from("b")]);

    backend
        .clear_collection(table, &entity.entity_id, &definition.id)
        .unwrap();
    assert!(backend
        .load_collection(table, &entity.entity_id, &definition.id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_fs_backend_through_the_api() {
    let (dir, backend) = setup();
    backend
        .define(AttributeDefinition::new("product", "color", "string"))
        .unwrap();
    backend
        .define(AttributeDefinition::new("product", "tags", "string").collection())
        .unwrap();
    let backend = Arc::new(backend);
    let entity = EntityRef::new("product", Uuid::new_v4());

    {
        let api = EavApi::with_cache(
            backend.clone(),
            backend.clone(),
            EavConfig::default(),
            Arc::new(AttributeCache::new()),
        )
        .unwrap();
        let mut interactor = api.attach(entity.clone()).unwrap();
        interactor.set("color", "red").unwrap();
        interactor.set("tags", vec!["a", "b"]).unwrap();
    }

    // A new backend over the same directory sees everything
    let reopened = Arc::new(FsBackend::new(dir.path().to_path_buf()));
    let api = EavApi::with_cache(
        reopened.clone(),
        reopened,
        EavConfig::default(),
        Arc::new(AttributeCache::new()),
    )
    .unwrap();
    let mut interactor = api.attach(entity).unwrap();
    assert_eq!(
        interactor.get("color").unwrap().attribute(),
        Some(AttrValue::from("red"))
    );
    assert_eq!(
        interactor.get("tags").unwrap().attribute(),
        Some(AttrValue::from(vec!["a", "b"]))
    );
}

#[test]
fn test_fs_backend_concurrent_writes_to_one_table() {
    let (_dir, backend) = setup();
    let backend = Arc::new(backend);
    let definition = Arc::new(AttributeDefinition::new("product", "color", "string"));
    let table = ValueTable::new(DataType::String, false);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let backend = backend.clone();
            let definition = definition.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        let entity = EntityRef::new("product", Uuid::new_v4());
                        let value = AttrValue::from(format!("color-{t}-{i}"));
                        let record = ValueRecord::new(table, &entity, &definition, value);
                        backend.persist_value(&record).unwrap();
                        record
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let written: Vec<ValueRecord> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(written.len(), 200);

    // Every write that returned Ok is on disk
    for record in &written {
        let loaded = backend
            .load_value(table, &record.entity_id, &definition.id)
            .unwrap();
        assert_eq!(loaded.map(|r| r.value), Some(record.value.clone()));
    }
}

#[test]
fn test_fs_backend_concurrent_collection_members() {
    let (_dir, backend) = setup();
    let backend = Arc::new(backend);
    let definition = Arc::new(AttributeDefinition::new("product", "tags", "string").collection());
    let entity = EntityRef::new("product", Uuid::new_v4());
    let table = ValueTable::new(DataType::String, true);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let backend = backend.clone();
            let definition = definition.clone();
            let entity = entity.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let value = AttrValue::from(format!("tag-{t}-{i}"));
                    let record = ValueRecord::new(table, &entity, &definition, value);
                    backend.persist_collection_member(&record).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let members = backend
        .load_collection(table, &entity.entity_id, &definition.id)
        .unwrap();
    assert_eq!(members.len(), 40);
}
