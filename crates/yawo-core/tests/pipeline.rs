use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use yawo_core::{
    ArtResolver, DisplaySettings, Fetch, ImageRef, Instrument, OverlayConfig, PollOutcome,
    Result, SongStateDetector, SongUpdate, SourceCatalog, StreamOutput,
};

const ROOT: &str = "https://catalog.test";

/// Local files from disk, catalog URLs from memory.
struct TestFetch {
    remote: HashMap<String, String>,
}

impl Fetch for TestFetch {
    fn fetch_bytes(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("https://") {
            return self
                .remote
                .get(location)
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| yawo_core::Error::InvalidLocation(location.to_string()));
        }
        Ok(fs::read(location)?)
    }
}

struct FixedArt;

impl ArtResolver for FixedArt {
    fn resolve_image(&self, _artist: &str, _album: &str) -> Option<String> {
        Some("https://lastfm.test/mega.png".to_string())
    }
}

fn test_fetch() -> Arc<dyn Fetch> {
    let mut remote = HashMap::new();
    remote.insert(
        format!("{ROOT}/base/index.json"),
        r#"{"type":"base","sources":[
            {"ids":["yarg"],"icon":"yarg","names":{"en-US":"YARG"}}
        ]}"#
        .to_string(),
    );
    remote.insert(
        format!("{ROOT}/extra/index.json"),
        r#"{"type":"extra","sources":[
            {"ids":["rb3","rb3dlc"],"icon":"rockband3","names":{"en-US":"Rock Band 3"}}
        ]}"#
        .to_string(),
    );
    Arc::new(TestFetch { remote })
}

fn loaded_catalog(fetch: &Arc<dyn Fetch>) -> Arc<SourceCatalog> {
    let catalog = Arc::new(SourceCatalog::with_root(ROOT));
    for handle in catalog.spawn_load(Arc::clone(fetch)) {
        handle.join().unwrap();
    }
    assert!(catalog.wait_loaded(Duration::from_secs(5)));
    catalog
}

fn status_json(name: &str, source: &str, location: &str) -> String {
    serde_json::json!({
        "Name": name,
        "Artist": "Band",
        "Album": "Record",
        "Source": source,
        "Location": location,
        "SongLength": 215000,
        "PartDifficulties": { "GUITAR": 3, "DRUMS": -1, "VOCALS": 5 }
    })
    .to_string()
}

#[test]
fn test_full_cycle_to_stream_output() {
    let dir = TempDir::new().unwrap();
    let chart = dir.path().join("chart");
    fs::create_dir(&chart).unwrap();
    fs::write(chart.join("album.png"), [0x89, b'P', b'N', b'G']).unwrap();

    let status = dir.path().join("currentSong.json");
    fs::write(
        &status,
        status_json("Song", "rb3dlc", &chart.to_string_lossy()),
    )
    .unwrap();

    let config = OverlayConfig::builder()
        .status_path(status.to_string_lossy())
        .selected_instruments(vec![Instrument::Drums, Instrument::Guitar, Instrument::Vocals])
        .playing_scene("Gameplay")
        .build();

    let fetch = test_fetch();
    let detector = SongStateDetector::new(&config.status_path, Arc::clone(&fetch), loaded_catalog(&fetch))
        .with_selected_instruments(config.selected_instruments.clone())
        .with_art_resolver(Arc::new(FixedArt));

    let received: Arc<Mutex<Vec<SongUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    detector.subscribe(move |update| {
        sink.lock().unwrap().push(update.clone());
        Ok(())
    });

    let out_dir = dir.path().join("overlay");
    let output = StreamOutput::new(&out_dir, DisplaySettings::from(&config));
    detector.subscribe(move |update| Ok(output.write_update(update)?));

    assert_eq!(detector.poll(), PollOutcome::NotifiedSong);
    assert_eq!(detector.poll(), PollOutcome::Unchanged);

    let updates = received.lock().unwrap();
    assert_eq!(updates.len(), 1);
    let song = updates[0].song().unwrap();

    assert_eq!(song.record.name, "Song");
    assert_eq!(song.record.song_length, 215000);
    assert!(matches!(
        &song.album_art,
        Some(ImageRef::Data(src)) if src.starts_with("data:image/png;base64,")
    ));
    assert_eq!(
        song.source_icon,
        Some(ImageRef::Url(format!("{ROOT}/extra/icons/rockband3.png")))
    );

    let selected = song.selected_instrument().unwrap();
    assert_eq!(selected.instrument, Instrument::Guitar);
    assert_eq!(selected.difficulty, 3);
    assert_eq!(song.selected_instruments.len(), 2);

    assert_eq!(fs::read_to_string(out_dir.join("title.txt")).unwrap(), "Song");
    assert_eq!(fs::read_to_string(out_dir.join("instrument.txt")).unwrap(), "GUITAR 3");
    assert_eq!(fs::read_to_string(out_dir.join("playstate.txt")).unwrap(), "play");
    assert_eq!(fs::read_to_string(out_dir.join("scene.txt")).unwrap(), "Gameplay");
}

#[test]
fn test_fallback_art_and_default_icon() {
    let dir = TempDir::new().unwrap();
    let status = dir.path().join("currentSong.json");
    let missing_chart = dir.path().join("no-such-chart");
    fs::write(
        &status,
        status_json("Song", "unknown-source", &missing_chart.to_string_lossy()),
    )
    .unwrap();

    let fetch = test_fetch();
    let detector = SongStateDetector::new(status.to_string_lossy(), Arc::clone(&fetch), loaded_catalog(&fetch))
        .with_art_resolver(Arc::new(FixedArt));

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    detector.subscribe(move |update| {
        sink.lock().unwrap().push(update.clone());
        Ok(())
    });

    assert_eq!(detector.poll(), PollOutcome::NotifiedSong);

    let updates = received.lock().unwrap();
    let song = updates[0].song().unwrap();
    assert_eq!(
        song.album_art,
        Some(ImageRef::Url("https://lastfm.test/mega.png".to_string()))
    );
    assert_eq!(
        song.source_icon,
        Some(ImageRef::Url(format!("{ROOT}/base/icons/custom.png")))
    );
    assert!(song.selected_instruments.is_empty());
}

#[test]
fn test_vendor_format_then_garbage() {
    let dir = TempDir::new().unwrap();
    let status = dir.path().join("currentSong.json");
    fs::write(
        &status,
        r#""{\qName\q:\qSong\q,\qPlaylist\q:\q,\qArtist\q:\qBand\q,\qYear\q:1999}""#,
    )
    .unwrap();

    let fetch = test_fetch();
    let detector = SongStateDetector::new(
        status.to_string_lossy(),
        Arc::clone(&fetch),
        Arc::new(SourceCatalog::with_root(ROOT)),
    );

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    detector.subscribe(move |update| {
        sink.lock().unwrap().push(update.clone());
        Ok(())
    });

    assert_eq!(detector.poll(), PollOutcome::NotifiedSong);
    fs::write(&status, "{ not json").unwrap();
    assert_eq!(detector.poll(), PollOutcome::NotifiedEmpty);
    fs::remove_file(&status).unwrap();
    assert_eq!(detector.poll(), PollOutcome::ReadFailed);

    let updates = received.lock().unwrap();
    assert_eq!(updates.len(), 2);

    let song = updates[0].song().unwrap();
    assert_eq!(song.record.name, "Song");
    assert_eq!(song.record.artist, "Band");
    assert_eq!(song.record.playlist, "");
    assert_eq!(song.record.year, "1999");
    // Catalog never loaded
    assert_eq!(song.source_icon, None);

    assert_eq!(updates[1], SongUpdate::Empty);
}
