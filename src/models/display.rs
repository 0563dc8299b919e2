// Display models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayKind {
    BuiltIn,
    External,
}

impl DisplayKind {
    pub fn label(self) -> &'static str {
        match self {
            DisplayKind::BuiltIn => "Built-in",
            DisplayKind::External => "External",
        }
    }
}

/// One attached display. The list is rebuilt whenever the attached-display set is re-read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySpec {
    pub kind: DisplayKind,
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    pub scale_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate_hz: Option<u32>,
    /// Absent means "do not show", never zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppi: Option<u32>,
}

impl DisplaySpec {
    /// "3024 x 1964"
    pub fn resolution_label(&self) -> String {
        format!("{} x {}", self.width, self.height)
    }

    /// "2.0x"
    pub fn scale_label(&self) -> String {
        format!("{:.1}x", self.scale_factor)
    }
}
