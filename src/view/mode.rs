use std::fmt;

use serde::{Deserialize, Serialize};

/// Mutually exclusive auxiliary panels beside the page list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidePanelMode {
    Info,
    Outlines,
    Structure,
    Signatures,
}

impl SidePanelMode {
    /// Toolbar order
    pub const ALL: [SidePanelMode; 4] = [
        SidePanelMode::Info,
        SidePanelMode::Outlines,
        SidePanelMode::Structure,
        SidePanelMode::Signatures,
    ];

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Info => "Document info",
            Self::Outlines => "Outlines",
            Self::Structure => "Structure",
            Self::Signatures => "Signatures",
        }
    }
}

impl fmt::Display for SidePanelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
