//! Display driver trait

use crate::scene::Scene;

/// Something that can show a scene
///
/// `set_root_scene` composes the scene into the driver's own buffer;
/// nothing reaches the panel until `refresh`.
pub trait DisplayDriver {
    type Error;

    /// Compose the scene for the next refresh
    fn set_root_scene(&mut self, scene: &Scene) -> Result<(), Self::Error>;

    /// Push the composed frame to the panel
    fn refresh(&mut self) -> Result<(), Self::Error>;
}
