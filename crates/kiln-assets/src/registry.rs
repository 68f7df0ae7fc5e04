//! Stable asset kind identifiers and the per-kind registry.

use std::fmt;

use ahash::AHashMap;

use crate::schema::Schema;
use crate::types;

/// Stable identifier for a concrete asset type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Text,
    Binary,
    Json,
    Image,
    Texture,
    Shader,
    Atlas,
    Sprite,
    Sound,
}

impl AssetKind {
    /// Lowercase name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Text => "text",
            AssetKind::Binary => "binary",
            AssetKind::Json => "json",
            AssetKind::Image => "image",
            AssetKind::Texture => "texture",
            AssetKind::Shader => "shader",
            AssetKind::Atlas => "atlas",
            AssetKind::Sprite => "sprite",
            AssetKind::Sound => "sound",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registered metadata for one asset kind.
///
/// Kinds without a schema have no JSON declaration: their content is the
/// addressed bytes themselves and they never reference other assets.
#[derive(Debug)]
pub struct KindSpec {
    pub kind: AssetKind,
    pub schema: Option<&'static Schema>,
}

/// Table mapping asset kinds to their declaration metadata.
///
/// Built once at library construction; the dependency collector and the
/// declaration loader both consult it so validation and collection can never
/// disagree about a kind's schema.
pub struct KindRegistry {
    specs: AHashMap<AssetKind, KindSpec>,
}

impl KindRegistry {
    /// Create a registry with every built-in kind registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            specs: AHashMap::new(),
        };
        for spec in [
            KindSpec {
                kind: AssetKind::Text,
                schema: None,
            },
            KindSpec {
                kind: AssetKind::Binary,
                schema: None,
            },
            KindSpec {
                kind: AssetKind::Json,
                schema: None,
            },
            KindSpec {
                kind: AssetKind::Image,
                schema: None,
            },
            // Textures load the image at their own address; no declaration.
            KindSpec {
                kind: AssetKind::Texture,
                schema: None,
            },
            KindSpec {
                kind: AssetKind::Shader,
                schema: Some(&types::shader::SHADER_SCHEMA),
            },
            KindSpec {
                kind: AssetKind::Atlas,
                schema: Some(&types::atlas::ATLAS_SCHEMA),
            },
            KindSpec {
                kind: AssetKind::Sprite,
                schema: Some(&types::sprite::SPRITE_SCHEMA),
            },
            KindSpec {
                kind: AssetKind::Sound,
                schema: Some(&types::sound::SOUND_SCHEMA),
            },
        ] {
            registry.register(spec);
        }
        registry
    }

    /// Register or replace a kind.
    pub fn register(&mut self, spec: KindSpec) {
        self.specs.insert(spec.kind, spec);
    }

    /// Look up a kind's registration.
    pub fn spec(&self, kind: AssetKind) -> Option<&KindSpec> {
        self.specs.get(&kind)
    }

    /// The declaration schema for a kind, if it has one.
    pub fn schema(&self, kind: AssetKind) -> Option<&'static Schema> {
        self.specs.get(&kind).and_then(|spec| spec.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_declared_kinds() {
        let registry = KindRegistry::with_builtins();

        // Leaf kinds carry no schema.
        assert!(registry.schema(AssetKind::Text).is_none());
        assert!(registry.schema(AssetKind::Texture).is_none());

        // Declaration-backed kinds do.
        assert!(registry.schema(AssetKind::Atlas).is_some());
        assert!(registry.schema(AssetKind::Sprite).is_some());
        assert!(registry.schema(AssetKind::Sound).is_some());
        assert!(registry.schema(AssetKind::Shader).is_some());
    }
}
