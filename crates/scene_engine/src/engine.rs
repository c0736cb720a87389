//! Engine shell: configuration, frame pacing, and the per-frame driver

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::time::FrameTimer;
use crate::scene::Scene;

/// Engine configuration
///
/// Deserialized from TOML; every field has a default, so an empty document
/// is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound applied to measured frame deltas, in seconds
    ///
    /// Keeps a long stall (debugger, window drag) from feeding one huge
    /// delta into the scene.
    pub max_delta_seconds: f32,

    /// Fixed per-frame delta in seconds; overrides measured time when set
    pub fixed_timestep: Option<f32>,

    /// Log level filter applied at startup: error, warn, info, debug, trace
    pub log_level: String,

    /// Emit a frame stats line every N frames; 0 disables
    pub frame_log_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delta_seconds: 0.25,
            fixed_timestep: None,
            log_level: "info".to_string(),
            frame_log_interval: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check field ranges; [`Engine::new`] runs this on every config it is
    /// handed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_delta_seconds > 0.0 && self.max_delta_seconds.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "max_delta_seconds",
                reason: format!("must be a positive number, got {}", self.max_delta_seconds),
            });
        }
        if let Some(step) = self.fixed_timestep {
            if !(step > 0.0 && step.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "fixed_timestep",
                    reason: format!("must be a positive number, got {}", step),
                });
            }
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown level {:?}", self.log_level),
            });
        }
        Ok(())
    }

    /// The configured log level filter; `Info` if the string never passed
    /// [`EngineConfig::validate`]
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse::<log::LevelFilter>()
            .unwrap_or(log::LevelFilter::Info)
    }

    /// The delta handed to the scene for a frame that measured `raw` seconds
    pub(crate) fn effective_delta(&self, raw: f32) -> f32 {
        self.fixed_timestep
            .unwrap_or_else(|| raw.min(self.max_delta_seconds))
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// A field value is out of range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending config field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Owns a scene and drives it one frame at a time
///
/// [`Engine::frame`] measures the frame delta, applies the configured pacing
/// policy, then runs one update cycle and one draw cycle. Applications keep
/// their own loop and call `frame` from it.
pub struct Engine {
    scene: Scene,
    timer: FrameTimer,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine around a fresh scene
    ///
    /// # Errors
    /// Returns a configuration error when a field fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        match config.fixed_timestep {
            Some(step) => log::info!("engine initialized, fixed timestep {:.4}s", step),
            None => log::info!(
                "engine initialized, variable timestep capped at {:.3}s",
                config.max_delta_seconds
            ),
        }

        Ok(Self {
            scene: Scene::new(),
            timer: FrameTimer::new(),
            config,
        })
    }

    /// Run one frame: update then draw, returning the delta the scene saw
    pub fn frame(&mut self) -> f32 {
        let raw = self.timer.tick();
        let dt = self.config.effective_delta(raw);

        self.scene.update(dt);
        self.scene.draw();

        if self.config.frame_log_interval > 0
            && self.timer.frame_count() % self.config.frame_log_interval == 0
        {
            log::debug!(
                "frame {}: dt {:.4}s, {} nodes, {:.1} fps average",
                self.timer.frame_count(),
                dt,
                self.scene.node_count(),
                self.timer.average_fps()
            );
        }
        dt
    }

    /// The scene this engine drives
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene, for setup between frames
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.timer.frame_count()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::foundation::math::{Mat4, Mat4Ext};
    use crate::scene::{Behavior, Context, NodeKey, NodeSpec};

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.max_delta_seconds, 0.25);
        assert_eq!(config.fixed_timestep, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.frame_log_interval, 0);
    }

    #[test]
    fn test_config_parses_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_delta_seconds = 0.1
            fixed_timestep = 0.02
            log_level = "debug"
            frame_log_interval = 60
            "#,
        )
        .unwrap();

        assert_relative_eq!(config.max_delta_seconds, 0.1);
        assert_eq!(config.fixed_timestep, Some(0.02));
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
        assert_eq!(config.frame_log_interval, 60);
    }

    #[test]
    fn test_empty_toml_falls_back_to_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.max_delta_seconds, 0.25);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("max_delta_seconds = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = EngineConfig::load_from_file("/nonexistent/engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validate_rejects_nonpositive_max_delta() {
        let config = EngineConfig {
            max_delta_seconds: 0.0,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_delta_seconds",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_nonpositive_fixed_timestep() {
        let config = EngineConfig {
            fixed_timestep: Some(-0.01),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "fixed_timestep",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config = EngineConfig {
            log_level: "loud".to_string(),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "log_level",
                ..
            }
        ));
    }

    #[test]
    fn test_effective_delta_clamps_and_overrides() {
        let variable = EngineConfig::default();
        assert_relative_eq!(variable.effective_delta(0.016), 0.016);
        assert_relative_eq!(variable.effective_delta(1.7), 0.25);

        let fixed = EngineConfig {
            fixed_timestep: Some(0.02),
            ..EngineConfig::default()
        };
        assert_relative_eq!(fixed.effective_delta(5.0), 0.02);
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = EngineConfig {
            max_delta_seconds: -1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::Config(ConfigError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_frame_runs_update_and_draw() {
        struct DtProbe {
            seen: Rc<RefCell<Vec<f32>>>,
        }

        impl Behavior for DtProbe {
            fn on_update(&mut self, _ctx: &mut Context<'_>, _node: NodeKey, dt: f32) {
                self.seen.borrow_mut().push(dt);
            }
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let config = EngineConfig {
            fixed_timestep: Some(0.02),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config).unwrap();

        let t = Mat4::translation(3.0, 0.0, 0.0);
        let root = engine.scene().root();
        let node = engine.scene_mut().spawn(
            NodeSpec::new("probe")
                .local_transform(t)
                .behavior(DtProbe { seen: Rc::clone(&seen) }),
        );
        engine.scene_mut().attach(node, root);

        engine.frame();
        engine.frame();

        // The fixed timestep reaches hooks untouched, and the draw half of
        // the frame has refreshed world transforms.
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_relative_eq!(seen[0], 0.02);
        assert_relative_eq!(seen[1], 0.02);
        assert_relative_eq!(
            engine.scene().world_transform(node).unwrap(),
            t,
            epsilon = 1e-5
        );
        assert_eq!(engine.frame_count(), 2);
    }
}
