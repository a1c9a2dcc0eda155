//! Named effect registry and YAML presets.
//!
//! The registry maps effect names to constructors that turn a YAML
//! settings value into a boxed [`Processor`]. A [`Preset`] is a small
//! YAML document naming an effect and its settings:
//!
//! ```yaml
//! effect: keyer
//! settings:
//!   reference_color: [0.1, 0.6, 0.2]
//!   saturation: 0.5
//!   highlights: 2.0
//!   compensate: true
//!   compensation_formula: linear_falloff
//! ```
//!
//! Missing settings fall back to the effect defaults.
//!
//! # Example
//!
//! ```rust
//! use pixfx_core::Format;
//! use pixfx_ops::{Preset, Processor, Registry};
//!
//! let preset = Preset::from_yaml_str("effect: vibrance\nsettings: { vibrance: 2.0 }").unwrap();
//! let processor = preset.build(&Registry::with_builtins(), Format::new(64, 64)).unwrap();
//! assert_eq!(processor.name(), "vibrance");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use pixfx_core::Format;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contrast::Contrast;
use crate::keyer::Keyer;
use crate::radial::{CircularRamp, CircularRays, CircularRings};
use crate::scroll::Scroll;
use crate::toon::Toon;
use crate::vibrance::Vibrance;
use crate::{Effect, OpsError, OpsResult, Processor, RowDriver};

type Constructor = fn(serde_yaml::Value, Format) -> OpsResult<Box<dyn Processor>>;

fn construct<E: Effect>(settings: serde_yaml::Value, format: Format) -> OpsResult<Box<dyn Processor>> {
    let settings: E::Settings = if settings.is_null() {
        E::Settings::default()
    } else {
        serde_yaml::from_value(settings)?
    };
    Ok(Box::new(RowDriver::<E>::new(&settings, format)?))
}

/// Maps effect names to constructors.
#[derive(Clone, Default)]
pub struct Registry {
    entries: BTreeMap<&'static str, Constructor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every effect of this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<Keyer>();
        registry.register::<Vibrance>();
        registry.register::<Contrast>();
        registry.register::<CircularRamp>();
        registry.register::<CircularRays>();
        registry.register::<CircularRings>();
        registry.register::<Scroll>();
        registry.register::<Toon>();
        registry
    }

    /// Registers `E` under [`Effect::NAME`], replacing any previous entry.
    pub fn register<E: Effect>(&mut self) {
        self.entries.insert(E::NAME, construct::<E>);
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Builds a processor for `name` from YAML `settings`.
    ///
    /// A null value uses the effect defaults.
    pub fn create(
        &self,
        name: &str,
        settings: serde_yaml::Value,
        format: Format,
    ) -> OpsResult<Box<dyn Processor>> {
        let ctor = self
            .entries
            .get(name)
            .ok_or_else(|| OpsError::UnknownEffect(name.to_string()))?;
        debug!(effect = name, "creating processor");
        ctor(settings, format)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// An effect name with its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Registry name of the effect.
    pub effect: String,
    /// Effect settings; missing fields use defaults.
    #[serde(default)]
    pub settings: serde_yaml::Value,
}

impl Preset {
    /// Creates a preset from typed settings.
    pub fn new<S: Serialize>(effect: impl Into<String>, settings: &S) -> OpsResult<Self> {
        Ok(Self {
            effect: effect.into(),
            settings: serde_yaml::to_value(settings)?,
        })
    }

    /// Parses a preset from YAML.
    pub fn from_yaml_str(yaml: &str) -> OpsResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a preset from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> OpsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Serializes the preset to YAML.
    pub fn to_yaml_string(&self) -> OpsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builds the processor through `registry`.
    pub fn build(&self, registry: &Registry, format: Format) -> OpsResult<Box<dyn Processor>> {
        registry.create(&self.effect, self.settings.clone(), format)
    }
}
