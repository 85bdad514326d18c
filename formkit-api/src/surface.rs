//! Surfaces - the rendered layouts delivered to a client.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Image attached to a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source", rename_all = "lowercase")]
pub enum SurfaceImage {
    Url(String),
    Path(String),
}

impl SurfaceImage {
    /// Classify a configured image source. `http(s)://` sources are URLs,
    /// everything else is a resource-pack path.
    pub fn from_source(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            SurfaceImage::Url(source.to_string())
        } else {
            SurfaceImage::Path(source.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceButton {
    pub text: String,
    pub image: Option<SurfaceImage>,
}

/// A vertical list of buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSurface {
    pub title: String,
    pub content: Option<String>,
    pub buttons: Vec<SurfaceButton>,
}

/// A two-choice dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSurface {
    pub title: String,
    pub content: Option<String>,
    pub first: SurfaceButton,
    pub second: SurfaceButton,
}

/// A typed input control on a custom surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Control {
    Input {
        label: String,
        placeholder: String,
        default: String,
    },
    Slider {
        label: String,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    },
    Dropdown {
        label: String,
        options: Vec<String>,
        default: usize,
    },
    Toggle {
        label: String,
        default: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSurface {
    pub title: String,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum Surface {
    Simple(SimpleSurface),
    Modal(ModalSurface),
    Custom(CustomSurface),
}

impl Surface {
    pub fn title(&self) -> &str {
        match self {
            Surface::Simple(s) => &s.title,
            Surface::Modal(s) => &s.title,
            Surface::Custom(s) => &s.title,
        }
    }
}

/// Value read back from one control, positional with `CustomSurface::controls`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Bool(bool),
    Index(usize),
    Number(f64),
    Text(String),
}

/// What the client answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceResponse {
    /// Index into the delivered button list.
    Simple { clicked: usize },
    /// `true` for the first button.
    Modal { first: bool },
    Custom { values: Vec<ControlValue> },
    Closed,
}

/// Callback invoked by the sender once the client answers.
pub type Responder = Arc<dyn Fn(SurfaceResponse) + Send + Sync>;
