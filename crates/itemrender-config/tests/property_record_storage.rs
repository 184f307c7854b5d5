//! Property-based tests for record storage
//!
//! Covers the save/load law, default-file creation for unseen ids and the
//! file-name flattening used for per-item files.

use itemrender_config::paths::{id_from_file_name, record_file_name};
use itemrender_config::{
    ConfigManager, ConfigRecord, ConfigStore, Factory, ManagerOptions, RenderSettings,
    RenderTarget, Validator, Vec3,
};
use proptest::prelude::*;
use tempfile::TempDir;

/// Namespaced ids without underscores, so flattening stays reversible
fn id_strategy() -> impl Strategy<Value = String> {
    (r"[a-z][a-z0-9]{0,8}", r"[a-z][a-z0-9]{0,12}").prop_map(|(ns, path)| format!("{}:{}", ns, path))
}

fn vec3_strategy() -> impl Strategy<Value = Vec3> {
    (-360.0f32..360.0, -360.0f32..360.0, -360.0f32..360.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn settings_strategy() -> impl Strategy<Value = RenderSettings> {
    (-10.0f32..10.0, vec3_strategy(), vec3_strategy()).prop_map(|(scale, rotation, translate)| {
        RenderSettings {
            scale,
            rotation,
            translate,
        }
    })
}

fn target_strategy() -> impl Strategy<Value = RenderTarget> {
    prop_oneof![
        r"[a-z]{1,8}:[a-z]{1,8}".prop_map(RenderTarget::AsBlock),
        r"[a-z]{1,8}:[a-z]{1,8}".prop_map(RenderTarget::AsEntity),
        Just(RenderTarget::Neither),
    ]
}

fn record_strategy() -> impl Strategy<Value = ConfigRecord> {
    (
        id_strategy(),
        any::<bool>(),
        target_strategy(),
        settings_strategy(),
        settings_strategy(),
    )
        .prop_map(|(id, enabled, target, first, third)| ConfigRecord {
            id,
            enabled,
            target,
            first_person: Some(first),
            third_person: Some(third),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any error-free record survives a save followed by a load
    #[test]
    fn prop_save_then_load_round_trips(record in record_strategy()) {
        prop_assert!(Validator::new().validate_record(&record).is_valid());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ConfigStore::new(temp_dir.path());

        store.save_record(&record.id, &record).expect("Failed to save record");
        let loaded = store.load_record(&record.id).expect("Failed to load record");

        prop_assert_eq!(loaded, record);
    }

    /// An unseen id yields the default record and exactly one new file
    #[test]
    fn prop_missing_record_creates_one_default_file(id in id_strategy()) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::new(ManagerOptions::new(temp_dir.path()));

        let record = manager.get_record(&id);

        prop_assert_eq!(record, Factory::default_record(&id));
        let files: Vec<_> = std::fs::read_dir(manager.store().items_dir())
            .expect("items dir should exist")
            .collect();
        prop_assert_eq!(files.len(), 1);
        prop_assert!(manager.store().record_path(&id).is_file());
    }

    /// Ids without underscores are recovered from their file names
    #[test]
    fn prop_flattening_reverses_without_underscores(id in id_strategy()) {
        let file_name = record_file_name(&id);
        prop_assert!(!file_name.contains(':'));
        prop_assert_eq!(id_from_file_name(&file_name), Some(id));
    }

    /// Empty-reference block targets are always rejected with one error
    #[test]
    fn prop_empty_block_reference_is_rejected(id in id_strategy(), settings in settings_strategy()) {
        let record = ConfigRecord {
            id,
            enabled: true,
            target: RenderTarget::AsBlock(String::new()),
            first_person: Some(settings),
            third_person: Some(settings),
        };
        let result = Validator::new().validate_record(&record);
        prop_assert_eq!(result.errors.len(), 1);
    }
}

#[test]
fn test_flattening_collision_is_preserved() {
    assert_eq!(record_file_name("a:b_c"), record_file_name("a_b:c"));
    assert_eq!(id_from_file_name(&record_file_name("a_b:c")).as_deref(), Some("a:b_c"));
}
