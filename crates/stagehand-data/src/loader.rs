//! Manifest loading: find the manifest next to the game data, parse it in
//! whichever format it was authored in, and turn its name references into
//! shared [`Scene`] and [`Transition`] handles grouped in a
//! [`CollectionLibrary`]. Controller configuration goes through the same
//! parser.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use stagehand_core::collection::Collection;
use stagehand_core::config::ControllerConfig;
use stagehand_core::id::{CollectionId, SceneKey};
use stagehand_core::library::CollectionLibrary;
use stagehand_core::scene::Scene;
use stagehand_core::transition::Transition;

use crate::schema::{ManifestData, SceneDef, TransitionStyle};

/// File stem of the manifest read by [`load_library`].
pub const MANIFEST_BASE_NAME: &str = "collections";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no '{file}' manifest in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file} is not a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// The same stem exists in more than one format.
    #[error("both {a} and {b} exist, keep only one")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("{file} refers to unknown {expected_kind} '{name}'")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("'{name}' is declared twice in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error("collection id {id} is used twice in {file}")]
    DuplicateId { file: PathBuf, id: CollectionId },

    /// A scene needs exactly one of `path` or `index`.
    #[error("scene '{name}' in {file}: {detail}")]
    InvalidScene {
        file: PathBuf,
        name: String,
        detail: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when several formats are possible.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let extension = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|format| Some(format.extension()) == extension)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

/// The `base_name` file in `dir`, in any supported format.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{base_name}.{}", format.extension())))
        .filter(|path| path.is_file());

    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (found, _) => Ok(found),
    }
}

pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    format.parse(&content).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

// ===========================================================================
// Name resolution
// ===========================================================================

fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn scene_key(def: &SceneDef, file: &Path) -> Result<SceneKey, DataLoadError> {
    match (&def.path, def.index) {
        (Some(path), None) => Ok(SceneKey::Path(path.clone())),
        (None, Some(index)) => Ok(SceneKey::Index(index)),
        (Some(_), Some(_)) => Err(DataLoadError::InvalidScene {
            file: file.to_path_buf(),
            name: def.name.clone(),
            detail: "both `path` and `index` are set",
        }),
        (None, None) => Err(DataLoadError::InvalidScene {
            file: file.to_path_buf(),
            name: def.name.clone(),
            detail: "one of `path` or `index` is required",
        }),
    }
}

// ===========================================================================
// Library building
// ===========================================================================

/// Resolve a parsed manifest into a library. `file` is only used in errors.
///
/// Scenes are shared: two collections naming the same scene hold the same
/// [`Scene`].
pub fn build_library(manifest: ManifestData, file: &Path) -> Result<CollectionLibrary, DataLoadError> {
    let mut transitions: HashMap<String, Rc<Transition>> = HashMap::new();
    for def in manifest.transitions {
        check_duplicate(&transitions, &def.name, file)?;
        let transition = match def.style {
            TransitionStyle::Instant => Transition::instant(def.name.clone()),
            TransitionStyle::Fade => Transition::fade(def.name.clone(), def.fade),
        };
        transitions.insert(def.name, Rc::new(transition));
    }

    let mut scenes: HashMap<String, Rc<Scene>> = HashMap::new();
    for def in manifest.scenes {
        check_duplicate(&scenes, &def.name, file)?;
        let scene = Scene::new(def.name.clone(), scene_key(&def, file)?)
            .with_activate_on_load(def.activate_on_load)
            .with_persist(def.persist);
        scenes.insert(def.name, Rc::new(scene));
    }

    let mut library = CollectionLibrary::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut ids: HashSet<CollectionId> = HashSet::new();
    for def in manifest.collections {
        if !names.insert(def.name.clone()) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: def.name,
            });
        }

        let id = match &def.id {
            Some(raw) => CollectionId::parse_str(raw).map_err(|e| DataLoadError::Parse {
                file: file.to_path_buf(),
                detail: format!("collection '{}' has invalid id '{raw}': {e}", def.name),
            })?,
            None => CollectionId::from_name(&def.name),
        };
        if !ids.insert(id) {
            return Err(DataLoadError::DuplicateId {
                file: file.to_path_buf(),
                id,
            });
        }

        let collection = Collection::new(def.name.clone()).with_id(id);
        for scene_name in &def.scenes {
            if scene_name.is_empty() {
                log::warn!("Collection \"{}\" has an unset scene entry", def.name);
                collection.push_scene(None);
            } else {
                let scene = resolve_name(&scenes, scene_name, file, "scene")?;
                collection.push_scene(Some(Rc::clone(scene)));
            }
        }
        if let Some(name) = &def.transition {
            let transition = resolve_name(&transitions, name, file, "transition")?;
            collection.set_transition(Some(Rc::clone(transition)));
        }
        if collection.scene_count() == 0 {
            log::warn!("Collection \"{}\" does not contain any scenes", def.name);
        }

        library.insert(Rc::new(collection));
    }

    Ok(library)
}

/// Read and resolve a single manifest file.
pub fn load_manifest(path: &Path) -> Result<CollectionLibrary, DataLoadError> {
    let manifest: ManifestData = deserialize_file(path)?;
    build_library(manifest, path)
}

/// Load `collections.{ron,toml,json}` from `dir`.
pub fn load_library(dir: &Path) -> Result<CollectionLibrary, DataLoadError> {
    let path = require_data_file(dir, MANIFEST_BASE_NAME)?;
    load_manifest(&path)
}

/// Load a controller configuration file. Missing fields take their defaults.
pub fn load_controller_config(path: &Path) -> Result<ControllerConfig, DataLoadError> {
    deserialize_file(path)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use stagehand_core::transition::TransitionKind;

    use super::*;

    const MANIFEST_RON: &str = r#"#![enable(implicit_some)]
    (
        transitions: [
            (name: "curtain", style: fade, fade: (delay_seconds: 0.5)),
        ],
        scenes: [
            (name: "menu", path: "scenes/menu.scene"),
            (name: "hud", path: "scenes/hud.scene", persist: true),
            (name: "level1", index: 3, activate_on_load: true),
        ],
        collections: [
            (name: "Menu", scenes: ["menu", "hud"]),
            (name: "Game", transition: "curtain", scenes: ["hud", "", "level1"]),
        ],
    )"#;

    // -----------------------------------------------------------------------
    // detect_format / discovery
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("c.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("c.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("c.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("c.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("collections")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("collections.ron"), "()").unwrap();
        fs::write(dir.path().join("collections.json"), "{}").unwrap();

        assert!(matches!(
            find_data_file(dir.path(), "collections"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
    }

    #[test]
    fn require_data_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            require_data_file(dir.path(), "collections"),
            Err(DataLoadError::MissingRequired { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Library building
    // -----------------------------------------------------------------------

    #[test]
    fn ron_manifest_builds_library() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("collections.ron"), MANIFEST_RON).unwrap();

        let library = load_library(dir.path()).unwrap();
        assert_eq!(library.len(), 2);

        let game = library.find_by_name("Game").unwrap();
        assert_eq!(game.entries().len(), 3);
        assert_eq!(game.scene_count(), 2);
        assert_eq!(game.id(), CollectionId::from_name("Game"));

        let level = game.valid_scenes()[1].clone();
        assert_eq!(level.key(), &SceneKey::Index(3));
        assert!(level.activate_on_load());

        let transition = game.transition().unwrap();
        let TransitionKind::Fade(settings) = transition.kind() else {
            panic!("expected a fade transition");
        };
        assert_eq!(settings.delay_seconds, 0.5);
        assert_eq!(settings.fade_in_seconds, 0.5);
    }

    #[test]
    fn scenes_are_shared_between_collections() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("collections.ron"), MANIFEST_RON).unwrap();
        let library = load_library(dir.path()).unwrap();

        let menu_hud = library.find_by_name("Menu").unwrap().valid_scenes()[1].clone();
        let game_hud = library.find_by_name("Game").unwrap().valid_scenes()[0].clone();
        assert!(Rc::ptr_eq(&menu_hud, &game_hud));
        assert!(game_hud.persist());
    }

    #[test]
    fn toml_and_json_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("a.toml");
        fs::write(
            &toml_path,
            r#"
            [[scenes]]
            name = "menu"
            path = "scenes/menu.scene"

            [[collections]]
            name = "Menu"
            id = "6b0f1ce2-3f4e-4c43-9d8a-2a5f0b3c9e11"
            scenes = ["menu"]
            "#,
        )
        .unwrap();
        let library = load_manifest(&toml_path).unwrap();
        let menu = library.find_by_name("Menu").unwrap();
        assert_eq!(
            menu.id().to_string(),
            "6b0f1ce2-3f4e-4c43-9d8a-2a5f0b3c9e11"
        );

        let json_path = dir.path().join("b.json");
        fs::write(
            &json_path,
            r#"{"scenes": [{"name": "menu", "index": 0}],
                "collections": [{"name": "Menu", "scenes": ["menu"]}]}"#,
        )
        .unwrap();
        let library = load_manifest(&json_path).unwrap();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn unresolved_scene_reference() {
        let manifest: ManifestData =
            ron::from_str(r#"(collections: [(name: "Game", scenes: ["nowhere"])])"#).unwrap();
        let err = build_library(manifest, Path::new("collections.ron")).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnresolvedRef { ref name, expected_kind: "scene", .. } if name == "nowhere"
        ));
    }

    #[test]
    fn unresolved_transition_reference() {
        let manifest: ManifestData = ron::from_str(
            r#"#![enable(implicit_some)]
            (scenes: [(name: "a", index: 0)], collections: [(name: "Game", transition: "wipe", scenes: ["a"])])"#,
        )
        .unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("collections.ron")),
            Err(DataLoadError::UnresolvedRef {
                expected_kind: "transition",
                ..
            })
        ));
    }

    #[test]
    fn duplicate_collection_names_and_ids() {
        let manifest: ManifestData =
            ron::from_str(r#"(collections: [(name: "Game"), (name: "Game")])"#).unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("c.ron")),
            Err(DataLoadError::DuplicateName { .. })
        ));

        let manifest: ManifestData = ron::from_str(
            r#"#![enable(implicit_some)]
            (collections: [
                (name: "A", id: "6b0f1ce2-3f4e-4c43-9d8a-2a5f0b3c9e11"),
                (name: "B", id: "6b0f1ce2-3f4e-4c43-9d8a-2a5f0b3c9e11"),
            ])"#,
        )
        .unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("c.ron")),
            Err(DataLoadError::DuplicateId { .. })
        ));
    }

    #[test]
    fn scene_needs_exactly_one_key() {
        let manifest: ManifestData = ron::from_str(r#"(scenes: [(name: "a")])"#).unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("c.ron")),
            Err(DataLoadError::InvalidScene { .. })
        ));

        let manifest: ManifestData =
            ron::from_str(r#"#![enable(implicit_some)] (scenes: [(name: "a", path: "a.scene", index: 1)])"#).unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("c.ron")),
            Err(DataLoadError::InvalidScene { .. })
        ));
    }

    #[test]
    fn invalid_collection_id_is_a_parse_error() {
        let manifest: ManifestData =
            ron::from_str(r#"#![enable(implicit_some)] (collections: [(name: "A", id: "not-a-uuid")])"#).unwrap();
        assert!(matches!(
            build_library(manifest, Path::new("c.ron")),
            Err(DataLoadError::Parse { .. })
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.ron");
        fs::write(&path, "(scenes: [").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(DataLoadError::Parse { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Controller config
    // -----------------------------------------------------------------------

    #[test]
    fn controller_config_defaults_fill_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controller.toml");
        fs::write(&path, "swap_timeout_seconds = 30.0\n").unwrap();

        let config = load_controller_config(&path).unwrap();
        assert_eq!(config.swap_timeout(), Some(30.0));
        assert!(config.persist_selection);
        assert_eq!(config.journal_capacity, 256);
    }

    #[test]
    fn bundled_fixture_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let library = load_library(&dir).unwrap();
        assert!(library.find_by_name("Menu").is_some());
        assert!(library.find_by_name("Game").is_some());

        let config = load_controller_config(&dir.join("controller.toml")).unwrap();
        assert_eq!(config.journal_capacity, 128);
    }
}
