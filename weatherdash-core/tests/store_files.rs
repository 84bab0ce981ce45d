//! Export/import and on-disk format checks for WeatherStore.

use std::fs;

use weatherdash_core::{WeatherSnapshot, WeatherStore, store};

fn snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: 18.5,
        weather_description: "튼구름".into(),
        humidity: 65,
        wind_speed: 3.1,
        pressure: 1009,
    }
}

fn seeded_store(dir: &std::path::Path) -> WeatherStore {
    let store = WeatherStore::new(dir);
    assert!(store.add_favorite("Home", "Seoul,KR", Some(37.5665), Some(126.978)));
    assert!(store.add_search_history("Seoul,KR", true));
    assert!(store.save_weather_record("Seoul, KR", snapshot(), Some("산책하기 좋은 날씨".into())));
    store
}

#[test]
fn files_are_pretty_json_arrays() {
    let dir = tempfile::tempdir().unwrap();
    seeded_store(dir.path());

    for file in [store::FAVORITES_FILE, store::HISTORY_FILE, store::SAVED_WEATHER_FILE] {
        let contents = fs::read_to_string(dir.path().join(file)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(value.is_array(), "{file} should hold an array");
        assert!(contents.contains('\n'), "{file} should be indented");
    }

    // Korean text is stored as-is, not escaped.
    let saved = fs::read_to_string(dir.path().join(store::SAVED_WEATHER_FILE)).unwrap();
    assert!(saved.contains("산책하기 좋은 날씨"));
}

#[test]
fn export_then_import_into_fresh_store() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = seeded_store(source_dir.path());

    let bundle = source.export_data();
    assert_eq!(bundle.favorites.len(), 1);
    assert_eq!(bundle.history.len(), 1);
    assert_eq!(bundle.saved_weather.len(), 1);

    let json = serde_json::to_string(&bundle).unwrap();
    assert!(json.contains("export_date"));

    let target_dir = tempfile::tempdir().unwrap();
    let target = WeatherStore::new(target_dir.path());
    assert!(target.import_json(&json));

    assert_eq!(target.favorites(), source.favorites());
    assert_eq!(target.search_history(10), source.search_history(10));
    assert_eq!(target.saved_weather(10), source.saved_weather(10));
}

#[test]
fn import_only_touches_present_collections() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());

    let data = serde_json::json!({
        "favorites": [
            {"name": "Work", "query": "Busan,KR", "lat": null, "lon": null, "added_date": null}
        ]
    });
    assert!(store.import_data(&data));

    let favorites = store.favorites();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].query, "Busan,KR");
    // History and saved records were not in the input.
    assert_eq!(store.search_history(10).len(), 1);
    assert_eq!(store.saved_weather(10).len(), 1);
}

#[test]
fn malformed_import_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());

    let data = serde_json::json!({
        "favorites": [],
        "history": [{"query": 42}]
    });
    assert!(!store.import_data(&data));
    assert_eq!(store.favorites().len(), 1);
    assert_eq!(store.search_history(10).len(), 1);

    assert!(!store.import_data(&serde_json::json!(["not", "an", "object"])));
    assert!(!store.import_json("{ definitely not json"));
}
