//! Fractal variant registry.
//!
//! Each fractal family is a tagged [`FractalKind`] with static metadata:
//! tunable parameters, presets and the supersample factor it prefers. The
//! sampling code itself lives with the backend that draws it.

use crate::{RenderError, View};
use serde::{Deserialize, Serialize};

/// Registered fractal families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalKind {
    Mandelbrot,
    Test,
}

/// A tunable numeric parameter of a fractal program (uniform).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

/// A named starting point: view, optional supersample override and
/// parameter overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    pub supersamples: Option<u32>,
    pub params: &'static [(&'static str, f64)],
}

impl Preset {
    pub fn view(&self) -> View {
        View::new(self.x, self.y, self.zoom)
    }
}

/// Configuration for a fractal type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalConfig {
    pub kind: FractalKind,
    /// Unique identifier
    pub id: &'static str,
    /// Human-readable name for UI display
    pub display_name: &'static str,
    pub default_supersamples: u32,
    /// Preset loaded when the fractal is first shown.
    pub default_preset: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub presets: &'static [Preset],
}

impl FractalConfig {
    pub fn preset(&self, name: &str) -> Result<&'static Preset, RenderError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| RenderError::UnknownPreset {
                fractal: self.id.to_string(),
                preset: name.to_string(),
            })
    }

    /// Parameter values for a preset: defaults overridden by the preset,
    /// clamped to each parameter's range. Unknown overrides are ignored.
    pub fn resolve_parameters(&self, preset: &Preset) -> Vec<(&'static str, f64)> {
        self.parameters
            .iter()
            .map(|spec| {
                let value = preset
                    .params
                    .iter()
                    .find(|(name, _)| *name == spec.name)
                    .map(|&(_, v)| v)
                    .unwrap_or(spec.default);
                let clamped = value.clamp(spec.min, spec.max);
                if clamped != value {
                    log::warn!(
                        "{}/{}: {} = {} clamped to {}",
                        self.id,
                        preset.name,
                        spec.name,
                        value,
                        clamped
                    );
                }
                (spec.name, clamped)
            })
            .collect()
    }
}

const MANDELBROT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "iterations",
        default: 1000.0,
        min: 1.0,
        max: 1_000_000.0,
    },
    ParameterSpec {
        name: "radius",
        default: 4.0,
        min: 0.1,
        max: 1e6,
    },
    ParameterSpec {
        name: "smoothing",
        default: 1.0,
        min: -20.0,
        max: 20.0,
    },
    ParameterSpec {
        name: "contrast",
        default: 1.0,
        min: 0.0,
        max: 64.0,
    },
    ParameterSpec {
        name: "phase",
        default: 0.0,
        min: -1.0,
        max: 1.0,
    },
    ParameterSpec {
        name: "shift",
        default: 0.0,
        min: -4.0,
        max: 4.0,
    },
    ParameterSpec {
        name: "iGamma",
        default: 0.0,
        min: 0.0,
        max: 1.0,
    },
];

const MANDELBROT_PRESETS: &[Preset] = &[
    Preset {
        name: "Smooth",
        x: -0.6,
        y: 0.0,
        zoom: 3.3,
        supersamples: Some(2),
        params: &[("radius", 4.0), ("iterations", 1000.0)],
    },
    Preset {
        name: "zoomDeeps",
        x: -1.999_774_060_136_290_4,
        y: -0.000_000_003_290_040_321_479_435,
        zoom: 7.275957614183426e-12, // 2^-37
        supersamples: Some(2),
        params: &[("radius", 4.0), ("iterations", 1000.0)],
    },
    Preset {
        name: "Tortoise",
        x: -1.768_902_242_783_826_4,
        y: -0.002_493_102_638_137_61,
        zoom: 2.363965603162759e-11, // 2^-35.3
        supersamples: None,
        params: &[("iterations", 2000.0)],
    },
    Preset {
        name: "Inf",
        x: -0.743_643_887_037_158_7,
        y: 0.131_825_904_205_311_97,
        zoom: 2.3283064365386963e-10, // 2^-32
        supersamples: None,
        params: &[("iterations", 5000.0), ("contrast", 0.23)],
    },
    Preset {
        name: "Corals",
        x: -0.695_865_859_251_144_6,
        y: 0.446_468_447_580_658_46,
        zoom: 2.384185791015625e-07, // 2^-22
        supersamples: None,
        params: &[("iterations", 800.0)],
    },
    Preset {
        name: "Zebra",
        x: -1.479_266_424_776_971_8,
        y: 0.010_498_929_802_855_44,
        zoom: 0.000_000_000_415_561_09,
        supersamples: None,
        params: &[("iterations", 3000.0)],
    },
    Preset {
        name: "Sea Shells",
        x: 0.252_483_049_373_651_74,
        y: -0.000_184_439_514_152_8,
        zoom: 0.000_000_308_115_963_24,
        supersamples: None,
        params: &[
            ("smoothing", 3.0),
            ("contrast", 3.96),
            ("iterations", 980.0),
            ("shift", 0.7),
        ],
    },
    Preset {
        name: "filigran",
        x: -0.40968,
        y: 0.59177,
        zoom: 0.09329864895605955, // 2^-3.422
        supersamples: None,
        params: &[("iterations", 96.0), ("iGamma", 0.0)],
    },
    Preset {
        name: "Drops",
        x: 0.251_495_385_785_914_5,
        y: -0.000_093_649_473_209,
        zoom: 3.9004497168061854e-05, // 2^-14.646
        supersamples: None,
        params: &[("iterations", 245.0)],
    },
];

const TEST_PARAMETERS: &[ParameterSpec] = &[ParameterSpec {
    name: "iterations",
    default: 1000.0,
    min: 1.0,
    max: 100_000.0,
}];

const TEST_PRESETS: &[Preset] = &[Preset {
    name: "Achat",
    x: -1.431124,
    y: 0.0,
    zoom: 0.02061731110582648, // 2^-5.6
    supersamples: None,
    params: &[("iterations", 1000.0)],
}];

/// Registry of available fractal variants.
pub static FRACTAL_CONFIGS: &[FractalConfig] = &[
    FractalConfig {
        kind: FractalKind::Mandelbrot,
        id: "mandelbrot",
        display_name: "Mandelbrot",
        default_supersamples: 4,
        default_preset: "filigran",
        parameters: MANDELBROT_PARAMETERS,
        presets: MANDELBROT_PRESETS,
    },
    FractalConfig {
        kind: FractalKind::Test,
        id: "test",
        display_name: "Test",
        default_supersamples: 4,
        default_preset: "Achat",
        parameters: TEST_PARAMETERS,
        presets: TEST_PRESETS,
    },
];

/// Look up a fractal configuration by ID.
pub fn get_config(id: &str) -> Result<&'static FractalConfig, RenderError> {
    FRACTAL_CONFIGS
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| RenderError::UnknownFractal(id.to_string()))
}

impl FractalKind {
    pub fn config(self) -> &'static FractalConfig {
        FRACTAL_CONFIGS
            .iter()
            .find(|c| c.kind == self)
            .unwrap_or(&FRACTAL_CONFIGS[0])
    }
}
