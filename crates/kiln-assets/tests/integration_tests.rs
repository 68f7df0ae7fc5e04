//! Integration tests for the asset pipeline.
//!
//! Fixtures live in a `MemorySource` so reads can be counted, with recording
//! backends standing in for the render/audio collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use kiln_assets::*;

// ============================================================================
// Recording Backends
// ============================================================================

#[derive(Default)]
struct RenderStats {
    textures: AtomicUsize,
    shaders: AtomicUsize,
    fail_textures: AtomicBool,
}

struct RecordingRender {
    stats: Arc<RenderStats>,
}

impl RenderBackend for RecordingRender {
    fn create_texture(&self, image: &ImageData) -> Option<TextureHandle> {
        assert!(!image.is_empty());
        if self.stats.fail_textures.load(Ordering::Relaxed) {
            return None;
        }
        let n = self.stats.textures.fetch_add(1, Ordering::Relaxed);
        Some(TextureHandle(n as u64 + 1))
    }

    fn create_shader(&self, vertex_src: &str, fragment_src: &str) -> Option<ShaderHandle> {
        assert!(!vertex_src.is_empty());
        assert!(!fragment_src.is_empty());
        let n = self.stats.shaders.fetch_add(1, Ordering::Relaxed);
        Some(ShaderHandle(n as u64 + 1))
    }
}

#[derive(Default)]
struct AudioStats {
    streams: AtomicUsize,
}

struct RecordingAudio {
    stats: Arc<AudioStats>,
}

impl AudioBackend for RecordingAudio {
    fn create_stream(&self, bytes: &[u8]) -> Option<SoundHandle> {
        assert!(!bytes.is_empty());
        let n = self.stats.streams.fetch_add(1, Ordering::Relaxed);
        Some(SoundHandle(n as u64 + 1))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

struct Fixture {
    library: Library,
    source: Arc<MemorySource>,
    render: Arc<RenderStats>,
    audio: Arc<AudioStats>,
}

fn game_source() -> MemorySource {
    MemorySource::new()
        .with_file("notes/readme.txt", b"hello kiln".as_slice())
        .with_file("data/blob.bin", [0u8, 1, 2, 3].as_slice())
        .with_file("data/settings.json", br#"{"fullscreen": true}"#.as_slice())
        .with_file(
            "game/hero.json",
            br#"{"atlas": "a.json", "region": "hero"}"#.as_slice(),
        )
        .with_file(
            "game/a.json",
            br#"{"texture": "a.png", "regions": {"hero": [0, 0, 16, 16], "villain": [16, 0, 16, 16]}}"#
                .as_slice(),
        )
        .with_file("game/a.png", [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3].as_slice())
        .with_file(
            "sounds/boom.json",
            br#"{"source": "boom.ogg", "streaming": false}"#.as_slice(),
        )
        .with_file("sounds/boom.ogg", b"OggS-payload".as_slice())
        .with_file(
            "shaders/basic.json",
            br#"{"vertex": "basic.vert", "fragment": "basic.frag"}"#.as_slice(),
        )
        .with_file("shaders/basic.vert", b"void main() { /* vs */ }".as_slice())
        .with_file("shaders/basic.frag", b"void main() { /* fs */ }".as_slice())
}

fn fixture_with(source: MemorySource) -> Fixture {
    let source = Arc::new(source);
    let render = Arc::new(RenderStats::default());
    let audio = Arc::new(AudioStats::default());
    let library = LibraryBuilder::from_shared(source.clone())
        .render_backend(RecordingRender {
            stats: render.clone(),
        })
        .audio_backend(RecordingAudio {
            stats: audio.clone(),
        })
        .worker_threads(2)
        .build();
    Fixture {
        library,
        source,
        render,
        audio,
    }
}

fn fixture() -> Fixture {
    fixture_with(game_source())
}

/// Pump the library until a promise settles, with a safety deadline.
fn settle<T: Clone + Send + 'static>(
    library: &Library,
    promise: &LoadPromise<T>,
) -> LoadResult<T> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(result) = promise.try_value() {
            return result;
        }
        assert!(Instant::now() < deadline, "load did not settle in time");
        if library.frame_tick() == 0 {
            thread::yield_now();
        }
    }
}

// ============================================================================
// Basic Loading
// ============================================================================

#[test]
fn test_load_text_asset() {
    let fix = fixture();
    let text = fix.library.load_asset::<TextAsset>("notes/readme.txt").unwrap();
    assert_eq!(text.text, "hello kiln");
}

#[test]
fn test_load_binary_asset() {
    let fix = fixture();
    let blob = fix.library.load_asset::<BinaryAsset>("data/blob.bin").unwrap();
    assert_eq!(blob.bytes, vec![0, 1, 2, 3]);
}

#[test]
fn test_load_json_asset() {
    let fix = fixture();
    let json = fix
        .library
        .load_asset::<JsonAsset>("data/settings.json")
        .unwrap();
    assert_eq!(json.document["fullscreen"], serde_json::json!(true));
}

#[test]
fn test_missing_asset_rejects_not_found() {
    let fix = fixture();
    let result = fix.library.load_asset::<TextAsset>("notes/absent.txt");
    assert!(matches!(result, Err(LoadError::NotFound { .. })));
}

#[test]
fn test_invalid_utf8_rejects_parse_error() {
    let fix = fixture_with(game_source().with_file("notes/bad.txt", [0xffu8, 0xfe].as_slice()));
    let result = fix.library.load_asset::<TextAsset>("notes/bad.txt");
    assert!(matches!(
        result,
        Err(LoadError::Parse { format: "utf-8", .. })
    ));
}

// ============================================================================
// Cache Coalescing and Idempotence
// ============================================================================

#[test]
fn test_concurrent_requests_share_one_pipeline() {
    let fix = fixture();

    // Hold the workers so every request is issued before the first resolves.
    fix.library.deferrer().worker_pool().pause();

    let promises: Vec<_> = (0..3)
        .map(|_| fix.library.load_asset_async::<TextAsset>("notes/readme.txt"))
        .collect();
    assert!(promises.iter().all(|p| !p.is_settled()));
    assert_eq!(fix.source.read_count(), 0);

    fix.library.deferrer().worker_pool().resume();

    let assets: Vec<_> = promises
        .iter()
        .map(|p| settle(&fix.library, p).unwrap())
        .collect();
    assert_eq!(fix.source.read_count(), 1);
    assert!(Arc::ptr_eq(&assets[0], &assets[1]));
    assert!(Arc::ptr_eq(&assets[1], &assets[2]));
}

#[test]
fn test_refetch_after_success_skips_loader() {
    let fix = fixture();

    let first = fix.library.load_asset::<TextAsset>("notes/readme.txt").unwrap();
    assert_eq!(fix.source.read_count(), 1);

    let second = fix.library.load_asset::<TextAsset>("notes/readme.txt").unwrap();
    assert_eq!(fix.source.read_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_failed_load_is_cached_until_evicted() {
    let fix = fixture();

    let result = fix.library.load_asset::<TextAsset>("notes/absent.txt");
    assert!(result.is_err());
    let reads = fix.source.read_count();

    // The rejection is remembered; asking again does no new work.
    let again = fix.library.load_asset::<TextAsset>("notes/absent.txt");
    assert!(again.is_err());
    assert_eq!(fix.source.read_count(), reads);

    // An explicit sweep clears the failure so the host can retry.
    assert_eq!(fix.library.unload_unused_assets(), 1);
    let retried = fix.library.load_asset::<TextAsset>("notes/absent.txt");
    assert!(retried.is_err());
    assert_eq!(fix.source.read_count(), reads + 1);
}

#[test]
fn test_find_asset_never_triggers_a_load() {
    let fix = fixture();

    assert!(fix.library.find_asset::<TextAsset>("notes/readme.txt").is_none());
    assert_eq!(fix.source.read_count(), 0);

    fix.library.load_asset::<TextAsset>("notes/readme.txt").unwrap();
    assert!(fix.library.find_asset::<TextAsset>("notes/readme.txt").is_some());
}

// ============================================================================
// Dependency Chains
// ============================================================================

#[test]
fn test_sprite_chain_loads_in_dependency_order() {
    let fix = fixture();

    let sprite = fix.library.load_asset::<SpriteAsset>("game/hero.json").unwrap();
    assert_eq!(
        sprite.region,
        Region {
            x: 0,
            y: 0,
            width: 16,
            height: 16
        }
    );
    assert_eq!(sprite.atlas.texture.handle, TextureHandle(1));
    assert_eq!(fix.render.textures.load(Ordering::Relaxed), 1);

    // Every link of the chain is cached under its own type and address.
    assert!(fix.library.find_asset::<AtlasAsset>("game/a.json").is_some());
    assert!(fix.library.find_asset::<TextureAsset>("game/a.png").is_some());
    assert!(fix.library.find_asset::<ImageAsset>("game/a.png").is_some());
    assert_eq!(fix.library.asset_count(), 4);
}

#[test]
fn test_sprite_chain_rejects_when_texture_bytes_missing() {
    // Same tree as the game fixture, minus the texture bytes.
    let source = MemorySource::new()
        .with_file(
            "game/hero.json",
            br#"{"atlas": "a.json", "region": "hero"}"#.as_slice(),
        )
        .with_file(
            "game/a.json",
            br#"{"texture": "a.png", "regions": {"hero": [0, 0, 16, 16]}}"#.as_slice(),
        );
    let fix = fixture_with(source);

    let result = fix.library.load_asset::<SpriteAsset>("game/hero.json");
    match result {
        Err(LoadError::DependencyNotFound { address, cause, .. }) => {
            assert_eq!(address.as_str(), "game/hero.json");
            // The chain bottoms out in the unreadable texture bytes.
            let mut root: &LoadError = cause.as_deref().expect("missing cause");
            while let LoadError::DependencyNotFound {
                cause: Some(inner), ..
            } = root
            {
                root = inner.as_ref();
            }
            assert!(matches!(root, LoadError::NotFound { .. }));
        }
        other => panic!("expected dependency failure, got {:?}", other),
    }

    // No sprite was cached as a success and no texture was created.
    assert!(fix.library.find_asset::<SpriteAsset>("game/hero.json").is_none());
    assert_eq!(fix.render.textures.load(Ordering::Relaxed), 0);
}

#[test]
fn test_sprite_rejects_when_region_missing() {
    let fix = fixture_with(game_source().with_file(
        "game/ghost.json",
        br#"{"atlas": "a.json", "region": "ghost"}"#.as_slice(),
    ));

    let result = fix.library.load_asset::<SpriteAsset>("game/ghost.json");
    match result {
        Err(LoadError::DependencyNotFound { dependency, .. }) => {
            assert!(dependency.contains("ghost"));
        }
        other => panic!("expected dependency failure, got {:?}", other),
    }

    // The atlas itself loaded fine and stays cached.
    assert!(fix.library.find_asset::<AtlasAsset>("game/a.json").is_some());
}

#[test]
fn test_shader_joins_both_sources() {
    let fix = fixture();

    let shader = fix
        .library
        .load_asset::<ShaderAsset>("shaders/basic.json")
        .unwrap();
    assert_eq!(shader.handle, ShaderHandle(1));
    assert_eq!(fix.render.shaders.load(Ordering::Relaxed), 1);

    // Both stage sources were loaded as ordinary text assets.
    assert!(
        fix.library
            .find_asset::<TextAsset>("shaders/basic.vert")
            .is_some()
    );
    assert!(
        fix.library
            .find_asset::<TextAsset>("shaders/basic.frag")
            .is_some()
    );
}

#[test]
fn test_sibling_failure_rejects_shader() {
    let fix = fixture_with(game_source().with_file(
        "shaders/broken.json",
        br#"{"vertex": "basic.vert", "fragment": "nope.frag"}"#.as_slice(),
    ));

    let result = fix.library.load_asset::<ShaderAsset>("shaders/broken.json");
    assert!(matches!(result, Err(LoadError::DependencyNotFound { .. })));
    assert_eq!(fix.render.shaders.load(Ordering::Relaxed), 0);

    // The sibling keeps loading after the aggregate has already failed;
    // let it finish, then observe it cached. There is no rollback.
    fix.library.deferrer().worker_pool().wait_all();
    assert!(
        fix.library
            .find_asset::<TextAsset>("shaders/basic.vert")
            .is_some()
    );
}

// ============================================================================
// Schema Validation
// ============================================================================

#[test]
fn test_sound_loads_with_defaults() {
    let fix = fixture();

    let sound = fix.library.load_asset::<SoundAsset>("sounds/boom.json").unwrap();
    assert_eq!(sound.handle, SoundHandle(1));
    assert!(!sound.streaming);
    assert_eq!(sound.volume, 1.0);
    assert_eq!(fix.audio.streams.load(Ordering::Relaxed), 1);
}

#[test]
fn test_sound_missing_streaming_rejects_before_backend_call() {
    let fix = fixture_with(
        game_source().with_file("sounds/bad.json", br#"{"source": "boom.ogg"}"#.as_slice()),
    );

    let result = fix.library.load_asset::<SoundAsset>("sounds/bad.json");
    match result {
        Err(LoadError::Schema {
            keyword, pointer, ..
        }) => {
            assert_eq!(keyword, "required");
            assert_eq!(pointer, "/streaming");
        }
        other => panic!("expected schema violation, got {:?}", other),
    }
    assert_eq!(fix.audio.streams.load(Ordering::Relaxed), 0);
}

#[test]
fn test_malformed_declaration_rejects_parse_error() {
    let fix = fixture_with(
        game_source().with_file("sounds/garbled.json", b"{not json".as_slice()),
    );

    let result = fix.library.load_asset::<SoundAsset>("sounds/garbled.json");
    assert!(matches!(
        result,
        Err(LoadError::Parse { format: "json", .. })
    ));
}

// ============================================================================
// Backend Failures
// ============================================================================

#[test]
fn test_null_backend_handle_rejects_load() {
    let fix = fixture();
    fix.render.fail_textures.store(true, Ordering::Relaxed);

    let result = fix.library.load_asset::<TextureAsset>("game/a.png");
    assert!(matches!(result, Err(LoadError::Backend { .. })));

    // The image decoded fine before the factory failed; it stays cached.
    assert!(fix.library.find_asset::<ImageAsset>("game/a.png").is_some());
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn test_unload_unused_assets_sweeps_whole_chain() {
    let fix = fixture();

    let sprite = fix.library.load_asset::<SpriteAsset>("game/hero.json").unwrap();
    assert_eq!(fix.library.asset_count(), 4);

    // Quiesce the workers so no pipeline temporaries are still alive.
    fix.library.deferrer().worker_pool().wait_all();

    // While the sprite is held, its whole dependency chain is owned.
    assert_eq!(fix.library.unload_unused_assets(), 0);
    assert_eq!(fix.library.asset_count(), 4);

    drop(sprite);
    assert_eq!(fix.library.unload_unused_assets(), 4);
    assert_eq!(fix.library.asset_count(), 0);

    // A re-request really reloads.
    let reads = fix.source.read_count();
    fix.library.load_asset::<SpriteAsset>("game/hero.json").unwrap();
    assert!(fix.source.read_count() > reads);
}

#[test]
fn test_held_dependency_survives_sweep() {
    let fix = fixture();

    let sprite = fix.library.load_asset::<SpriteAsset>("game/hero.json").unwrap();
    let texture = fix.library.find_asset::<TextureAsset>("game/a.png").unwrap();
    drop(sprite);
    fix.library.deferrer().worker_pool().wait_all();

    // Sprite and atlas go; the held texture keeps itself and its image.
    assert_eq!(fix.library.unload_unused_assets(), 2);
    assert!(fix.library.find_asset::<SpriteAsset>("game/hero.json").is_none());
    assert!(fix.library.find_asset::<AtlasAsset>("game/a.json").is_none());
    assert!(fix.library.find_asset::<TextureAsset>("game/a.png").is_some());
    assert!(fix.library.find_asset::<ImageAsset>("game/a.png").is_some());

    drop(texture);
    assert_eq!(fix.library.unload_unused_assets(), 2);
    assert_eq!(fix.library.asset_count(), 0);
}

// ============================================================================
// Dependency Collection
// ============================================================================

#[test]
fn test_collect_dependencies_is_transitive_and_loads_nothing() {
    let fix = fixture();

    let deps = fix
        .library
        .collect_dependencies(AssetKind::Sprite, "game/hero.json")
        .unwrap();
    assert_eq!(
        deps,
        vec![
            Dependency {
                kind: AssetKind::Texture,
                address: Address::new("game/a.png"),
            },
            Dependency {
                kind: AssetKind::Atlas,
                address: Address::new("game/a.json"),
            },
        ]
    );

    // Only the two declarations were read; nothing was cached.
    assert_eq!(fix.source.read_count(), 2);
    assert_eq!(fix.library.asset_count(), 0);
}

#[test]
fn test_collect_reports_missing_declaration() {
    let source = MemorySource::new().with_file(
        "game/hero.json",
        br#"{"atlas": "a.json", "region": "hero"}"#.as_slice(),
    );
    let fix = fixture_with(source);

    let result = fix
        .library
        .collect_dependencies(AssetKind::Sprite, "game/hero.json");
    match result {
        Err(LoadError::DependencyNotFound {
            address,
            dependency,
            ..
        }) => {
            assert_eq!(address.as_str(), "game/hero.json");
            assert!(dependency.contains("game/a.json"));
        }
        other => panic!("expected dependency failure, got {:?}", other),
    }
}

#[test]
fn test_collect_matches_addresses_the_loader_requests() {
    let fix = fixture();

    let deps = fix
        .library
        .collect_dependencies(AssetKind::Sprite, "game/hero.json")
        .unwrap();
    fix.library.load_asset::<SpriteAsset>("game/hero.json").unwrap();

    for dep in deps {
        let cached = match dep.kind {
            AssetKind::Texture => fix.library.find_asset::<TextureAsset>(dep.address.clone()).is_some(),
            AssetKind::Atlas => fix.library.find_asset::<AtlasAsset>(dep.address.clone()).is_some(),
            other => panic!("unexpected dependency kind {other}"),
        };
        assert!(cached, "collected address was not requested by the loader");
    }
}
