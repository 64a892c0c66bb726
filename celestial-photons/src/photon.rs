use celestial_core::SkyDir;

/// One detected event: where it came from and how energetic it was.
///
/// Only `dir` and `energy` take part in binning. Arrival time and event class
/// are carried for callers that filter events before accumulating them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Photon {
    dir: SkyDir,
    energy: f64,
    time: f64,
    event_class: u8,
}

impl Photon {
    /// Event from `dir` with `energy` in MeV.
    pub fn new(dir: SkyDir, energy: f64) -> Self {
        Self {
            dir,
            energy,
            time: 0.0,
            event_class: 0,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_event_class(mut self, event_class: u8) -> Self {
        self.event_class = event_class;
        self
    }

    pub fn dir(&self) -> &SkyDir {
        &self.dir
    }

    /// Energy in MeV.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Arrival time in seconds, mission elapsed time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn event_class(&self) -> u8 {
        self.event_class
    }
}
