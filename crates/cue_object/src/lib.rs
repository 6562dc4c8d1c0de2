//! Object Cues
//!
//! Reversible, loopable animation of a scene object's transform and surface
//! colors, with optional audio, that always lands back on the object's rest
//! state.
//!
//! # Example
//!
//! ```
//! use cue_animation::Sequencer;
//! use cue_object::{CueConfig, CueState, ObjectCue, SceneObject};
//!
//! let config = CueConfig::from_toml_str(
//!     r#"
//!     loop_duration = 1.0
//!     loop_count = 2
//!
//!     [position]
//!     offset = { x = 0.0, y = 0.5, z = 0.0 }
//!     "#,
//! )
//! .unwrap();
//!
//! let mut cue = ObjectCue::new(config, Sequencer::new(), SceneObject::new()).unwrap();
//! cue.enable();
//! cue.start();
//!
//! for _ in 0..180 {
//!     cue.update(1.0 / 60.0);
//! }
//! assert_eq!(cue.state(), CueState::Idle);
//! ```

pub mod audio;
pub mod config;
pub mod cue;
pub mod error;
pub mod scene;
pub mod state;
pub mod targets;
pub mod timing;

pub use audio::{AudioCues, AudioOutput, RecordingOutput};
pub use config::{AudioConfig, CueConfig, ReturnPolicy, SurfaceCue, TransformCue};
pub use cue::ObjectCue;
pub use error::{AudioError, CueError, Result};
pub use scene::{SceneObject, Surface};
pub use state::{CueHook, CueNotification, CueRunState, CueState};
pub use targets::{CueObject, PropertyTarget, PropertyTargetSet, RestState, SurfaceRest};
pub use timing::{remaining_return_duration, CueTiming};
