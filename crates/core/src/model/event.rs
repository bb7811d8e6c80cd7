use serde::{Deserialize, Serialize};

/// A single timed occurrence in a trace — a function call, browser task,
/// paint, or similar.
///
/// Events are supplied to the builders already sorted by `start_time` and
/// properly nested: an event that starts inside another must also end inside
/// it (stack discipline). The builders verify nesting; this type does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Record type name, e.g. `FunctionCall` or `Paint`.
    pub name: String,
    /// Trace timestamp in µs.
    pub start_time: f64,
    /// End timestamp in µs; equals `start_time` for instantaneous events.
    pub end_time: f64,
    /// Category the tracer assigned, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Attributed source URL (script URL, resource URL), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Attributed page frame id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            name: name.into(),
            start_time,
            end_time,
            category: None,
            url: None,
            frame_id: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = Some(frame_id.into());
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// True for zero-duration marker events.
    pub fn is_instant(&self) -> bool {
        self.end_time == self.start_time
    }

    /// Display title used by text filtering.
    pub fn title(&self) -> &str {
        &self.name
    }
}
