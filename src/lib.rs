// keyglow - layered per-key keyboard lighting
// Profile model, layer evaluation, compositing engine and profile editor

pub mod brush;
pub mod config;
pub mod coords;
pub mod data_model;
pub mod editor;
pub mod engine;
pub mod input;
pub mod layer;
pub mod preview;
pub mod profile;
pub mod raster;

pub use brush::{BrushSpec, Color, GradientStop};
pub use config::Config;
pub use coords::{RectF, UnitScale};
pub use data_model::{DataModel, DataValue};
pub use editor::{CursorHint, EditorSession, LayerListEntry, SelectionHandle};
pub use engine::{ActiveContext, EngineConfig, Frame, RenderEngine};
pub use input::{key_press_channel, KeyPressHook, KeyPressQueue};
pub use layer::{AnimationPolicy, LayerError, LayerId, LayerModel, LayerProperties, LayerType};
pub use profile::{JsonProfileStore, LoadError, ProfileError, ProfileModel, ProfileStore, SharedProfile};
pub use raster::Canvas;

pub use keyglow_device as device;
