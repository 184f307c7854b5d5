//! Integration tests for the configuration lifecycle across restarts
//!
//! Each test drives a manager against a temporary root, drops it, and
//! checks what a fresh manager (a new process) sees.

use std::sync::Arc;
use std::thread;

use itemrender_config::{
    AllowList, ConfigContext, DisplayContext, ErrorKind, ManagerOptions, RenderOverrideSource,
    RenderTarget, View,
};
use itemrender_integration_tests::{block_record, read_json, reopen, temp_manager};

#[test]
fn test_first_run_creates_concrete_files() {
    let (dir, manager) = temp_manager();
    manager.get_record("minecraft:torch");

    assert!(dir.path().join("config.json").is_file());
    assert!(dir.path().join("restrictions.json").is_file());
    assert!(dir.path().join("items").join("minecraft_torch.json").is_file());

    let aggregate = read_json(&dir, "config.json");
    assert_eq!(aggregate["settings"]["autoSaveInterval"], 300);
    assert_eq!(aggregate["enabledItems"], serde_json::json!([]));
}

#[test]
fn test_edits_survive_restart() {
    let (dir, manager) = temp_manager();
    manager
        .mutate("minecraft:torch", |record| {
            record.enabled = true;
            record.target = RenderTarget::AsEntity("minecraft:armor_stand".to_string());
            record.settings_mut(View::ThirdPerson).scale = 0.25;
        })
        .unwrap();
    drop(manager);

    let manager = reopen(&dir);
    assert!(manager.is_enabled("minecraft:torch"));
    let record = manager.get_record("minecraft:torch");
    assert_eq!(
        record.target,
        RenderTarget::AsEntity("minecraft:armor_stand".to_string())
    );
    assert_eq!(record.settings(View::ThirdPerson).scale, 0.25);

    let render = manager
        .render_override("minecraft:torch", DisplayContext::ThirdPersonRightHand)
        .unwrap();
    assert_eq!(render.transform.scale, 0.25);
}

#[test]
fn test_hand_edited_file_is_picked_up_after_reload() {
    let (dir, manager) = temp_manager();
    manager.set_enabled("minecraft:stick", true).unwrap();
    assert_eq!(manager.get_record("minecraft:stick").target, RenderTarget::Neither);

    std::fs::write(
        dir.path().join("items").join("minecraft_stick.json"),
        r#"{
            "id": "minecraft:stick",
            "enabled": true,
            "renderAsBlock": true,
            "blockId": "minecraft:end_rod",
            "firstPerson": { "scale": 1.5 },
            "thirdPerson": {}
        }"#,
    )
    .unwrap();

    // Cached value stays until an explicit reload
    assert_eq!(manager.get_record("minecraft:stick").target, RenderTarget::Neither);

    manager.invalidate_and_reload().unwrap();

    let record = manager.get_record("minecraft:stick");
    assert_eq!(record.target, RenderTarget::AsBlock("minecraft:end_rod".to_string()));
    assert_eq!(record.settings(View::FirstPerson).scale, 1.5);
}

#[test]
fn test_edit_failures_are_reported() {
    let (dir, manager) = temp_manager();

    let err = manager
        .mutate("minecraft:torch", |record| {
            record.target = RenderTarget::AsBlock(String::new());
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    std::fs::write(dir.path().join("items").join("minecraft_torch.json"), "{").unwrap();
    let err = manager.load_record_for_edit("minecraft:torch").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);

    // The lookup path still answers
    assert!(!manager.get_record("minecraft:torch").enabled);
}

#[test]
fn test_allow_list_survives_restart() {
    let (dir, manager) = temp_manager();
    let mut list = AllowList {
        enabled: true,
        ..AllowList::default()
    };
    list.allow("minecraft:torch");
    manager.save_allow_list(list).unwrap();
    drop(manager);

    let manager = reopen(&dir);
    assert!(manager.is_allowed("minecraft:torch"));
    assert!(!manager.is_allowed("minecraft:stick"));
    assert!(manager.set_enabled("minecraft:stick", true).is_err());
}

#[test]
fn test_shared_context_under_concurrent_use() {
    let dir = tempfile::TempDir::new().unwrap();
    let context = Arc::new(ConfigContext::new(ManagerOptions::new(dir.path())));
    context
        .manager()
        .save_record(
            "minecraft:torch",
            block_record("minecraft:torch", "minecraft:torch"),
        )
        .unwrap();

    let editor = {
        let context = context.clone();
        thread::spawn(move || {
            let manager = context.manager();
            for i in 0..20 {
                manager
                    .mutate("minecraft:torch", |record| {
                        *record = block_record("minecraft:torch", "minecraft:torch");
                        record.settings_mut(View::FirstPerson).scale = i as f32;
                    })
                    .unwrap();
            }
        })
    };
    let renderers: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            thread::spawn(move || {
                let manager = context.manager();
                for _ in 0..200 {
                    let scale = manager
                        .get_record("minecraft:torch")
                        .settings(View::FirstPerson)
                        .scale;
                    assert!((0.0..20.0).contains(&scale) || scale == 1.0);
                }
            })
        })
        .collect();

    editor.join().unwrap();
    for renderer in renderers {
        renderer.join().unwrap();
    }

    let manager = context.manager();
    assert_eq!(
        manager.get_record("minecraft:torch").settings(View::FirstPerson).scale,
        19.0
    );
}
