use crate::shared::bbox::BoundingBox;

/// One detected face in a processed frame, with its recognition outcome.
///
/// Never persisted; downstream components either commit the identity or
/// feed the box into a capture session.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// `None` for a face no enrolled identity matched.
    pub identity: Option<String>,
    pub confidence: f64,
}

impl Detection {
    pub fn recognized(bbox: BoundingBox, identity: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            identity: Some(identity.into()),
            confidence,
        }
    }

    pub fn unknown(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            identity: None,
            confidence: 0.0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.identity.is_some()
    }
}
