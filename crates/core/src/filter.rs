use std::collections::HashSet;

use crate::model::Event;

/// A pure predicate over events. An event survives a [`FilterChain`] only if
/// every filter in it accepts the event.
pub trait EventFilter {
    fn accept(&self, event: &Event) -> bool;
}

/// Drops events whose name is in a fixed denylist. Used to keep generic
/// dispatch records from drowning out the interesting work.
pub struct ExclusiveNameFilter {
    excluded: HashSet<String>,
}

impl ExclusiveNameFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The stock denylist of nonessential container events.
    pub fn nonessential_events() -> Self {
        Self::new(["EventDispatch", "FunctionCall", "TimerFire"])
    }
}

impl EventFilter for ExclusiveNameFilter {
    fn accept(&self, event: &Event) -> bool {
        !self.excluded.contains(&event.name)
    }
}

/// Case-insensitive substring match against the event's display title.
/// An unset or empty query accepts everything.
#[derive(Default)]
pub struct TextFilter {
    query: Option<String>,
}

impl TextFilter {
    pub fn new(query: impl Into<String>) -> Self {
        let mut filter = Self::default();
        filter.set_query(Some(&query.into()));
        filter
    }

    pub fn set_query(&mut self, query: Option<&str>) {
        self.query = query
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
    }
}

impl EventFilter for TextFilter {
    fn accept(&self, event: &Event) -> bool {
        match &self.query {
            None => true,
            Some(query) => event.title().to_lowercase().contains(query),
        }
    }
}

/// Caller-supplied arbitrary predicate.
pub struct CallbackFilter(Box<dyn Fn(&Event) -> bool>);

impl CallbackFilter {
    pub fn new(predicate: impl Fn(&Event) -> bool + 'static) -> Self {
        Self(Box::new(predicate))
    }
}

impl EventFilter for CallbackFilter {
    fn accept(&self, event: &Event) -> bool {
        (self.0)(event)
    }
}

/// Ordered conjunction of filters, evaluated in insertion order with
/// short-circuiting on the first rejection.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn EventFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl EventFilter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: impl EventFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn accepts(&self, event: &Event) -> bool {
        self.filters.iter().all(|f| f.accept(event))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
