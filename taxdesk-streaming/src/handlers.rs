//! Caller-supplied callbacks for stream events.

use std::fmt;
use taxdesk_core::{ChartPayload, Route, StreamEvent};

type TextHandler = Box<dyn FnMut(&str) + Send>;
type RouteHandler = Box<dyn FnMut(&Route, Option<&str>) + Send>;
type ChartHandler = Box<dyn FnMut(&ChartPayload) + Send>;
type DoneHandler = Box<dyn FnMut() + Send>;

/// One optional callback per stream channel.
///
/// Every slot defaults to a no-op: an event whose handler is not set is
/// silently skipped.
///
/// ```rust
/// use taxdesk_core::StreamEvent;
/// use taxdesk_streaming::StreamHandlers;
///
/// let mut handlers = StreamHandlers::new()
///     .on_message(|text| print!("{}", text))
///     .on_done(|| println!());
///
/// handlers.dispatch(&StreamEvent::message("Hello"));
/// handlers.dispatch(&StreamEvent::Done);
/// handlers.dispatch(&StreamEvent::summary("no handler, ignored"));
/// ```
#[derive(Default)]
pub struct StreamHandlers {
    on_message: Option<TextHandler>,
    on_route: Option<RouteHandler>,
    on_chart: Option<ChartHandler>,
    on_summary: Option<TextHandler>,
    on_error: Option<TextHandler>,
    on_done: Option<DoneHandler>,
}

impl StreamHandlers {
    /// Create a set of no-op handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with each message delta.
    #[must_use]
    pub fn on_message(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    /// Called with each route classification and its company.
    #[must_use]
    pub fn on_route(mut self, f: impl FnMut(&Route, Option<&str>) + Send + 'static) -> Self {
        self.on_route = Some(Box::new(f));
        self
    }

    /// Called with each chart payload.
    #[must_use]
    pub fn on_chart(mut self, f: impl FnMut(&ChartPayload) + Send + 'static) -> Self {
        self.on_chart = Some(Box::new(f));
        self
    }

    /// Called with each summary delta.
    #[must_use]
    pub fn on_summary(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_summary = Some(Box::new(f));
        self
    }

    /// Called with the message of a server or transport error.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called when the stream completes.
    #[must_use]
    pub fn on_done(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }

    /// Invoke the handler for the event's channel, if any.
    pub fn dispatch(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Message { content } => {
                if let Some(f) = self.on_message.as_mut() {
                    f(content);
                }
            }
            StreamEvent::Route { route, company } => {
                if let Some(f) = self.on_route.as_mut() {
                    f(route, company.as_deref());
                }
            }
            StreamEvent::Chart { payload } => {
                if let Some(f) = self.on_chart.as_mut() {
                    f(payload);
                }
            }
            StreamEvent::Summary { content } => {
                if let Some(f) = self.on_summary.as_mut() {
                    f(content);
                }
            }
            StreamEvent::Error { message } => {
                if let Some(f) = self.on_error.as_mut() {
                    f(message);
                }
            }
            StreamEvent::Done => {
                if let Some(f) = self.on_done.as_mut() {
                    f();
                }
            }
        }
    }
}

impl fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_message", &self.on_message.is_some())
            .field("on_route", &self.on_route.is_some())
            .field("on_chart", &self.on_chart.is_some())
            .field("on_summary", &self.on_summary.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_done", &self.on_done.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_to_matching_slot() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let mut handlers = StreamHandlers::new()
            .on_message({
                let log = log.clone();
                move |t| log.lock().push(format!("message:{}", t))
            })
            .on_route({
                let log = log.clone();
                move |r, c| log.lock().push(format!("route:{}:{:?}", r, c))
            })
            .on_chart({
                let log = log.clone();
                move |p| log.lock().push(format!("chart:{}", p.title().unwrap_or("-")))
            })
            .on_summary({
                let log = log.clone();
                move |t| log.lock().push(format!("summary:{}", t))
            })
            .on_error({
                let log = log.clone();
                move |m| log.lock().push(format!("error:{}", m))
            })
            .on_done({
                let log = log.clone();
                move || log.lock().push("done".to_string())
            });

        handlers.dispatch(&StreamEvent::message("a"));
        handlers.dispatch(&StreamEvent::route("coze", Some("ACME".into())));
        handlers.dispatch(&StreamEvent::chart(json!({"title": "t"})));
        handlers.dispatch(&StreamEvent::summary("s"));
        handlers.dispatch(&StreamEvent::error("e"));
        handlers.dispatch(&StreamEvent::Done);

        assert_eq!(
            *log.lock(),
            vec![
                "message:a",
                "route:coze:Some(\"ACME\")",
                "chart:t",
                "summary:s",
                "error:e",
                "done",
            ]
        );
    }

    #[test]
    fn test_missing_handlers_are_noops() {
        let mut handlers = StreamHandlers::new();
        handlers.dispatch(&StreamEvent::message("a"));
        handlers.dispatch(&StreamEvent::error("e"));
        handlers.dispatch(&StreamEvent::Done);
    }

    #[test]
    fn test_debug_shows_set_slots() {
        let handlers = StreamHandlers::new().on_done(|| {});
        let debug = format!("{:?}", handlers);
        assert!(debug.contains("on_done: true"));
        assert!(debug.contains("on_message: false"));
    }
}
