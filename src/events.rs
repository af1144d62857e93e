//! Progress and interception events.
//!
//! A run publishes a fixed, closed set of [`Event`]s. Each generation stage
//! emits a `*Start` event carrying a progress message, one `*Gen` event per
//! asset carrying a mutable [`PendingAsset`], and a payload-less `*End` event.
//! The whole run is bracketed by [`Event::Start`] and [`Event::End`].
//!
//! ## Delivery
//!
//! [`EventBus::emit`] dispatches synchronously to the listeners registered
//! at call time. Wildcard listeners ([`Subscription::All`]) run first and
//! receive the event tag so they can dispatch on it; listeners subscribed to
//! the exact event run after them. Within each group, listeners run in
//! registration order. Nothing is buffered: a listener added later never
//! sees earlier events.
//!
//! ## Interception
//!
//! A `*Gen` listener may call [`PendingAsset::set_filename`] to force an
//! output name (skipping fingerprinting) or
//! [`PendingAsset::replace_content`] to substitute the bytes. The pipeline
//! reads both back after the emit returns.

use std::fmt;

/// A generation stage, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DefaultIcons,
    Favicon,
    AppleTouchIcon,
    MsTile,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::DefaultIcons,
        Stage::Favicon,
        Stage::AppleTouchIcon,
        Stage::MsTile,
    ];

    pub fn start_event(self) -> Event {
        match self {
            Stage::DefaultIcons => Event::DefaultIconsStart,
            Stage::Favicon => Event::FaviconStart,
            Stage::AppleTouchIcon => Event::AppleTouchIconStart,
            Stage::MsTile => Event::MsTileStart,
        }
    }

    pub fn gen_event(self) -> Event {
        match self {
            Stage::DefaultIcons => Event::DefaultIconsGen,
            Stage::Favicon => Event::FaviconGen,
            Stage::AppleTouchIcon => Event::AppleTouchIconGen,
            Stage::MsTile => Event::MsTileGen,
        }
    }

    pub fn end_event(self) -> Event {
        match self {
            Stage::DefaultIcons => Event::DefaultIconsEnd,
            Stage::Favicon => Event::FaviconEnd,
            Stage::AppleTouchIcon => Event::AppleTouchIconEnd,
            Stage::MsTile => Event::MsTileEnd,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::DefaultIcons => "icon",
            Stage::Favicon => "favicon",
            Stage::AppleTouchIcon => "Apple Touch Icon",
            Stage::MsTile => "Microsoft Tile Icon",
        })
    }
}

/// Every event a run can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Start,
    DefaultIconsStart,
    DefaultIconsGen,
    DefaultIconsEnd,
    FaviconStart,
    FaviconGen,
    FaviconEnd,
    AppleTouchIconStart,
    AppleTouchIconGen,
    AppleTouchIconEnd,
    MsTileStart,
    MsTileGen,
    MsTileEnd,
    End,
}

impl Event {
    pub const ALL: [Event; 14] = [
        Event::Start,
        Event::DefaultIconsStart,
        Event::DefaultIconsGen,
        Event::DefaultIconsEnd,
        Event::FaviconStart,
        Event::FaviconGen,
        Event::FaviconEnd,
        Event::AppleTouchIconStart,
        Event::AppleTouchIconGen,
        Event::AppleTouchIconEnd,
        Event::MsTileStart,
        Event::MsTileGen,
        Event::MsTileEnd,
        Event::End,
    ];

    /// The wire name hosts use to refer to the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::DefaultIconsStart => "defaultIconsStart",
            Event::DefaultIconsGen => "defaultIconsGen",
            Event::DefaultIconsEnd => "defaultIconsEnd",
            Event::FaviconStart => "faviconStart",
            Event::FaviconGen => "faviconGen",
            Event::FaviconEnd => "faviconEnd",
            Event::AppleTouchIconStart => "appleTouchIconStart",
            Event::AppleTouchIconGen => "appleTouchIconGen",
            Event::AppleTouchIconEnd => "appleTouchIconEnd",
            Event::MsTileStart => "msTileStart",
            Event::MsTileGen => "msTileGen",
            Event::MsTileEnd => "msTileEnd",
            Event::End => "end",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }

    /// The stage this event belongs to; `None` for `start` and `end`.
    pub fn stage(self) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| {
            s.start_event() == self || s.gen_event() == self || s.end_event() == self
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded asset awaiting its final name.
///
/// Created by a stage right after encoding, published once on the stage's
/// `*Gen` event, then consumed by the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    name: String,
    content: Vec<u8>,
    filename: Option<String>,
}

impl PendingAsset {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
            filename: None,
        }
    }

    /// The unfingerprinted name the stage would use, e.g. `favicon-32x32.png`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Listener-forced output name, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Force the output name. The name is used verbatim.
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    pub fn replace_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    pub fn into_parts(self) -> (Vec<u8>, Option<String>) {
        (self.content, self.filename)
    }
}

/// Data carried by an event.
#[derive(Debug)]
pub enum Payload<'a> {
    /// `start`, `end` and every `*End` event.
    None,
    /// `*Start` events: a human-readable progress message.
    Message(&'a str),
    /// `*Gen` events: the asset being generated.
    Asset(&'a mut PendingAsset),
}

impl Payload<'_> {
    pub fn message(&self) -> Option<&str> {
        match self {
            Payload::Message(msg) => Some(*msg),
            _ => None,
        }
    }

    pub fn asset(&mut self) -> Option<&mut PendingAsset> {
        match self {
            Payload::Asset(asset) => Some(&mut **asset),
            _ => None,
        }
    }
}

/// Which events a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    All,
    Only(Event),
}

impl From<Event> for Subscription {
    fn from(event: Event) -> Self {
        Subscription::Only(event)
    }
}

type Listener = Box<dyn FnMut(Event, &mut Payload<'_>) + Send>;

/// Synchronous publish/subscribe over [`Event`].
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(Subscription, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `self` for chaining.
    pub fn on<F>(&mut self, subscription: impl Into<Subscription>, listener: F) -> &mut Self
    where
        F: FnMut(Event, &mut Payload<'_>) + Send + 'static,
    {
        self.listeners
            .push((subscription.into(), Box::new(listener)));
        self
    }

    /// Register a listener for one stage's `*Gen` events.
    pub fn on_asset<F>(&mut self, stage: Stage, mut listener: F) -> &mut Self
    where
        F: FnMut(&mut PendingAsset) + Send + 'static,
    {
        self.on(stage.gen_event(), move |_, payload| {
            if let Some(asset) = payload.asset() {
                listener(asset);
            }
        })
    }

    /// Deliver `event` to wildcard listeners, then to its own listeners.
    ///
    /// Returns whether any listener ran.
    pub fn emit(&mut self, event: Event, mut payload: Payload<'_>) -> bool {
        let mut delivered = false;
        for (subscription, listener) in &mut self.listeners {
            if *subscription == Subscription::All {
                listener(event, &mut payload);
                delivered = true;
            }
        }
        for (subscription, listener) in &mut self.listeners {
            if *subscription == Subscription::Only(event) {
                listener(event, &mut payload);
                delivered = true;
            }
        }
        delivered
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
