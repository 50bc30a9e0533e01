use log::info;
use serde::Serialize;

/// Environment-dimming aid shown behind tracked markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Dimmer {
    /// Set once tracking starts.
    pub active: bool,
    pub visible: bool,
}

impl Dimmer {
    pub fn new(visible: bool) -> Self {
        Self {
            active: false,
            visible,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Flip visibility and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        if self.visible {
            info!("dimmer switched on");
        } else {
            info!("dimmer switched off");
        }
        self.visible
    }
}
