//! Cross-gesture selection with start/update/end lifecycle.
//!
//! Each frame the arbiter smooths the hands, runs the classifiers, keeps the
//! results that clear the confidence threshold and ranks them by confidence,
//! breaking ties by `GestureKind` declaration order. The top candidate is the
//! primary gesture; gestures that fall out of the candidate set end.

use std::{
    collections::{BTreeMap, HashMap},
    time::Instant,
};

use crossbeam_channel::Sender;

use crate::{
    config::GestureConfig,
    error::Result,
    gesture::GestureClassifier,
    smoothing::LandmarkSmoother,
    types::{
        Frame, GestureEvent, GestureEventKind, GestureKind, GestureResult, Hand, MAX_HANDS,
    },
};

/// Receives lifecycle events: exactly one start, any number of updates and
/// exactly one end per activation.
pub trait GestureListener {
    fn on_event(&mut self, event: &GestureEvent);
}

impl GestureListener for Sender<GestureEvent> {
    fn on_event(&mut self, event: &GestureEvent) {
        if let Err(err) = self.try_send(*event) {
            log::warn!(
                "dropped {:?} event for {}: {err}",
                event.kind,
                event.gesture
            );
        }
    }
}

/// Adapts a closure into a listener.
pub struct CallbackListener<F>(pub F);

impl<F> GestureListener for CallbackListener<F>
where
    F: FnMut(&GestureEvent),
{
    fn on_event(&mut self, event: &GestureEvent) {
        (self.0)(event)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveGestureRecord {
    pub gesture: GestureKind,
    pub start_time: Instant,
    pub last_confidence: f32,
    pub last_result: GestureResult,
}

#[derive(Clone, Debug, Default)]
pub struct FrameAnalysis {
    /// Every classifier result of the frame, whether or not it won.
    pub gestures: BTreeMap<GestureKind, GestureResult>,
    pub primary: Option<GestureKind>,
    pub primary_confidence: f32,
    pub events: Vec<GestureEvent>,
    /// Smoothed hands the classifiers saw.
    pub hands: Vec<Hand>,
}

impl FrameAnalysis {
    pub fn gesture(&self, kind: GestureKind) -> Option<&GestureResult> {
        self.gestures.get(&kind)
    }

    /// Confidence of `kind` this frame, zero when it was not evaluated.
    pub fn confidence(&self, kind: GestureKind) -> f32 {
        self.gesture(kind).map(|g| g.confidence).unwrap_or(0.0)
    }

    pub fn primary_result(&self) -> Option<&GestureResult> {
        self.primary.and_then(|kind| self.gestures.get(&kind))
    }
}

/// Whether `confidence` clears `threshold` under the configured inclusivity.
pub fn passes_threshold(confidence: f32, threshold: f32, inclusive: bool) -> bool {
    if inclusive {
        confidence >= threshold
    } else {
        confidence > threshold
    }
}

/// Thresholds and ranks results; ties keep declaration order.
pub fn rank_candidates(
    results: impl IntoIterator<Item = GestureResult>,
    threshold: f32,
    inclusive: bool,
) -> Vec<GestureResult> {
    let mut candidates: Vec<GestureResult> = results
        .into_iter()
        .filter(|r| r.is_active && passes_threshold(r.confidence, threshold, inclusive))
        .collect();
    candidates.sort_by_key(|r| r.kind().priority());
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates
}

pub struct GestureArbiter {
    classifier: GestureClassifier,
    smoother: LandmarkSmoother,
    previous: Vec<Hand>,
    active: HashMap<GestureKind, ActiveGestureRecord>,
    listeners: Vec<Box<dyn GestureListener + Send>>,
}

impl GestureArbiter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            smoother: LandmarkSmoother::new(config.smoothing_factor),
            classifier: GestureClassifier::new(config),
            previous: Vec::new(),
            active: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: GestureListener + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn config(&self) -> &GestureConfig {
        self.classifier.config()
    }

    pub fn smoother(&self) -> &LandmarkSmoother {
        &self.smoother
    }

    pub fn active(&self) -> &HashMap<GestureKind, ActiveGestureRecord> {
        &self.active
    }

    pub fn is_active(&self, kind: GestureKind) -> bool {
        self.active.contains_key(&kind)
    }

    /// Runs one frame through smoothing, classification and arbitration.
    ///
    /// A malformed hand rejects the whole frame before any state changes.
    pub fn analyze(&mut self, frame: &Frame) -> Result<FrameAnalysis> {
        if frame.hands.len() > MAX_HANDS {
            log::debug!(
                "ignoring {} hands beyond the first {MAX_HANDS}",
                frame.hands.len() - MAX_HANDS
            );
        }
        let raw = frame
            .hands
            .iter()
            .take(MAX_HANDS)
            .enumerate()
            .map(|(slot, landmarks)| Hand::from_slice(slot, landmarks))
            .collect::<Result<Vec<Hand>>>()?;

        let now = frame.timestamp;
        let mut analysis = FrameAnalysis::default();

        if raw.is_empty() {
            self.smoother.reset();
            self.previous.clear();
            self.end_all(now, &mut analysis.events);
            self.dispatch(&analysis.events);
            return Ok(analysis);
        }

        self.smoother.update(&raw, now);
        let hands = self.smoother.hands();

        let mut results = self
            .classifier
            .classify_hand(&hands[0], self.previous.first());
        if let [first, second] = hands.as_slice() {
            let previous = match self.previous.as_slice() {
                [a, b] => Some([a, b]),
                _ => None,
            };
            results.extend(self.classifier.classify_pair([first, second], previous));
        }

        let config = self.classifier.config();
        let candidates = rank_candidates(
            results.iter().copied(),
            config.confidence_threshold,
            config.inclusive_threshold,
        );

        if let Some(top) = candidates.first() {
            let kind = top.kind();
            analysis.primary = Some(kind);
            analysis.primary_confidence = top.confidence;

            match self.active.get_mut(&kind) {
                Some(record) => {
                    record.last_confidence = top.confidence;
                    record.last_result = *top;
                    analysis.events.push(GestureEvent {
                        kind: GestureEventKind::Update,
                        gesture: kind,
                        data: *top,
                    });
                }
                None => {
                    log::info!("gesture start: {}", top.display_text());
                    self.active.insert(
                        kind,
                        ActiveGestureRecord {
                            gesture: kind,
                            start_time: now,
                            last_confidence: top.confidence,
                            last_result: *top,
                        },
                    );
                    analysis.events.push(GestureEvent {
                        kind: GestureEventKind::Start,
                        gesture: kind,
                        data: *top,
                    });
                }
            }
        }

        let mut ended: Vec<GestureKind> = self
            .active
            .keys()
            .filter(|kind| !candidates.iter().any(|c| c.kind() == **kind))
            .copied()
            .collect();
        ended.sort();
        for kind in ended {
            if let Some(record) = self.active.remove(&kind) {
                analysis.events.push(end_event(&record, now));
            }
        }

        self.dispatch(&analysis.events);

        analysis.gestures = results.into_iter().map(|r| (r.kind(), r)).collect();
        analysis.hands = hands.clone();
        self.previous = hands;
        Ok(analysis)
    }

    /// Ends every active gesture and forgets all per-hand history.
    pub fn reset(&mut self) -> Vec<GestureEvent> {
        self.smoother.reset();
        self.previous.clear();
        let mut events = Vec::new();
        self.end_all(Instant::now(), &mut events);
        self.dispatch(&events);
        events
    }

    fn end_all(&mut self, now: Instant, events: &mut Vec<GestureEvent>) {
        let mut records: Vec<ActiveGestureRecord> =
            self.active.drain().map(|(_, record)| record).collect();
        records.sort_by_key(|r| r.gesture);
        events.extend(records.iter().map(|r| end_event(r, now)));
    }

    fn dispatch(&mut self, events: &[GestureEvent]) {
        for event in events {
            for listener in self.listeners.iter_mut() {
                listener.on_event(event);
            }
        }
    }
}

fn end_event(record: &ActiveGestureRecord, now: Instant) -> GestureEvent {
    let held = now.saturating_duration_since(record.start_time);
    log::info!(
        "gesture end: {} after {:?} (last {:.0}%)",
        record.gesture,
        held,
        record.last_confidence * 100.0
    );
    let mut data = record.last_result;
    data.confidence = record.last_confidence;
    GestureEvent {
        kind: GestureEventKind::End,
        gesture: record.gesture,
        data,
    }
}
