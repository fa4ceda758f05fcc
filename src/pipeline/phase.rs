use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Analysis,
    Setup,
    Build,
}

impl Phase {
    /// Phase chained after this one in an automatic run.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Analysis => Some(Phase::Setup),
            Phase::Setup => Some(Phase::Build),
            Phase::Build => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Analysis => "analysis",
            Phase::Setup => "setup",
            Phase::Build => "build",
        };
        f.write_str(name)
    }
}

/// Nominal progress values written at each point of the lifecycle.
pub mod marks {
    pub const UPLOAD_CREATED: u8 = 10;
    pub const UPLOAD_SAVED: u8 = 15;
    pub const EXTRACTED: u8 = 25;
    pub const ANALYZING: u8 = 30;
    pub const ANALYZED: u8 = 50;
    pub const SETUP_STARTED: u8 = 25;
    pub const SETUP_STEPS: [u8; 4] = [30, 40, 50, 60];
    pub const SETUP_COMPLETE: u8 = 65;
    pub const BUILD_STARTED: u8 = 60;
    pub const PRE_BUILD: u8 = 70;
    pub const FRAMEWORK_BUILD: u8 = 75;
    pub const PACKAGING: u8 = 85;
    pub const VERIFICATION: u8 = 95;
    pub const COMPLETED: u8 = 100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Continuation scheduled through the phase queue
    Automatic,
    /// Direct endpoint call
    Manual,
}

/// One processing run. Progress written during a run never drops below the
/// highest value already written in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRun {
    pub trigger: Trigger,
    floor: u8,
}

impl PhaseRun {
    pub fn automatic(floor: u8) -> Self {
        Self {
            trigger: Trigger::Automatic,
            floor,
        }
    }

    /// Manual runs start from the project's current progress.
    pub fn manual(current_progress: u8) -> Self {
        Self {
            trigger: Trigger::Manual,
            floor: current_progress,
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.trigger == Trigger::Automatic
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    /// Raises the floor to `nominal` when higher and returns the value to write.
    pub fn clamp(&mut self, nominal: u8) -> u8 {
        self.floor = self.floor.max(nominal.min(100));
        self.floor
    }
}
