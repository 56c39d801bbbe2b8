//! In-process reference engine.
//!
//! [`PlfEngine`] stands in for the foreign numeric engine in tests and
//! headless tools. It keeps every object it hands out in a heap keyed by
//! handle id, so tests can assert that nothing leaks and nothing is released
//! twice. Curves use the RTC-toolbox segment notation
//! `[(x, y, slope), ...], length`.
//!
//! Evaluation is exact only at breakpoints; it is good enough to drive the
//! visualizer, not a replacement for a real min-plus algebra library.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::bridge::NativeValue;
use crate::engine::{CurveHandle, NumericEngine, ProfileHandle};
use crate::error::{EngineError, EngineResult};
use crate::foreign::{ForeignHandle, ForeignItem, ForeignNode, ForeignRuntime};
use crate::kind::TransformKind;

/// Padding added around the profile bounding box.
const PROFILE_PADDING: f64 = 0.5;
/// Uniform samples used for the full result curve.
const RESULT_STEPS: usize = 200;

/// Piecewise-linear function as ordered breakpoints.
///
/// Two consecutive points may share an x coordinate to express a jump.
#[derive(Clone, Debug, PartialEq)]
pub struct Plf {
    points: Vec<(f64, f64)>,
}

impl Plf {
    pub fn from_points(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Parse `[(x, y, slope), ...], length`.
    pub fn parse_rtc(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let rest = text
            .strip_prefix('[')
            .ok_or_else(|| "expected '[' at start of segment list".to_string())?;
        let close = rest
            .find(']')
            .ok_or_else(|| "unbalanced '[' in segment list".to_string())?;
        let (mut body, tail) = (rest[..close].trim(), &rest[close + 1..]);

        let length_text = tail
            .trim()
            .strip_prefix(',')
            .ok_or_else(|| "expected ', length' after segment list".to_string())?
            .trim();
        let length: f64 = length_text
            .parse()
            .map_err(|_| format!("invalid length {length_text:?}"))?;

        let mut segments = Vec::new();
        while !body.is_empty() {
            let inner = body
                .strip_prefix('(')
                .ok_or_else(|| format!("expected '(' at {body:?}"))?;
            let close = inner
                .find(')')
                .ok_or_else(|| "unbalanced '(' in segment".to_string())?;
            let numbers = inner[..close]
                .split(',')
                .map(|s| s.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("invalid number in segment: {e}"))?;
            let [x, y, slope] = numbers[..] else {
                return Err("segments must be (x, y, slope)".to_string());
            };
            segments.push((x, y, slope));

            body = inner[close + 1..].trim_start();
            if let Some(next) = body.strip_prefix(',') {
                body = next.trim_start();
            } else if !body.is_empty() {
                return Err(format!("expected ',' between segments at {body:?}"));
            }
        }

        Self::from_segments(&segments, length)
    }

    fn from_segments(segments: &[(f64, f64, f64)], length: f64) -> Result<Self, String> {
        if segments.is_empty() {
            return Err("at least one segment is required".to_string());
        }
        let finite = segments
            .iter()
            .all(|(x, y, s)| x.is_finite() && y.is_finite() && s.is_finite());
        if !finite || !length.is_finite() {
            return Err("segment values must be finite".to_string());
        }
        if segments.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err("segment start positions must increase".to_string());
        }
        let last_x = segments[segments.len() - 1].0;
        if length <= last_x {
            return Err(format!("length {length} must exceed last segment start {last_x}"));
        }

        let mut points: Vec<(f64, f64)> = Vec::with_capacity(segments.len() * 2);
        for (i, &(x, y, slope)) in segments.iter().enumerate() {
            let end = segments.get(i + 1).map_or(length, |next| next.0);
            if points.last() != Some(&(x, y)) {
                points.push((x, y));
            }
            points.push((end, y + slope * (end - x)));
        }
        Ok(Self { points })
    }

    pub fn start(&self) -> f64 {
        self.points.first().map_or(0.0, |p| p.0)
    }

    pub fn end(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.0)
    }

    pub fn min_y(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min)
    }

    pub fn max_y(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.1)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Value at `x`; at a jump the left value wins.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        if let [(x0, y0)] = self.points[..] {
            return (x == x0).then_some(y0);
        }
        for w in self.points.windows(2) {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            if x < x0 || x > x1 {
                continue;
            }
            if x1 == x0 {
                return Some(y0);
            }
            return Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0));
        }
        None
    }

    fn mirrored_shifted(&self, offset: f64) -> Self {
        Self {
            points: self.points.iter().rev().map(|&(x, y)| (offset - x, y)).collect(),
        }
    }

    fn shifted(&self, offset: f64) -> Self {
        Self {
            points: self.points.iter().map(|&(x, y)| (x + offset, y)).collect(),
        }
    }

    fn to_series(&self) -> Value {
        series(
            self.points.iter().map(|p| p.0).collect(),
            self.points.iter().map(|p| p.1).collect(),
        )
    }
}

/// One evaluated position.
#[derive(Clone, Debug, PartialEq)]
pub struct Construction {
    pub transformed_a: Plf,
    pub sum: Plf,
    pub result: (f64, f64),
}

/// Build the transform's construction at `delta`.
pub fn construct(a: &Plf, b: &Plf, delta: f64, kind: TransformKind) -> Result<Construction, String> {
    let deconv = kind.is_deconvolution();
    let transformed_a = if deconv {
        a.shifted(-delta)
    } else {
        a.mirrored_shifted(delta)
    };

    let lo = transformed_a.start().max(b.start()).max(0.0);
    let mut hi = transformed_a.end().min(b.end());
    if !deconv {
        hi = hi.min(delta);
    }
    if !(lo <= hi) {
        // Nothing left after truncation: an empty sum whose extremum is 0.
        return Ok(Construction {
            transformed_a,
            sum: Plf::from_points(Vec::new()),
            result: (delta, 0.0),
        });
    }

    let mut grid: Vec<f64> = transformed_a
        .points
        .iter()
        .chain(b.points.iter())
        .map(|p| p.0)
        .filter(|x| *x >= lo && *x <= hi)
        .chain([lo, hi])
        .collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();

    let mut sum = Vec::with_capacity(grid.len());
    for x in grid {
        let (Some(ta), Some(vb)) = (transformed_a.value_at(x), b.value_at(x)) else {
            return Err(format!("curve undefined at {x}"));
        };
        sum.push((x, if deconv { ta - vb } else { ta + vb }));
    }

    let pick = |best: (f64, f64), p: (f64, f64)| {
        let better = if kind.takes_minimum() {
            p.1 < best.1
        } else {
            p.1 > best.1
        };
        if better { p } else { best }
    };
    let result = sum[1..].iter().copied().fold(sum[0], pick);

    Ok(Construction {
        transformed_a,
        sum: Plf::from_points(sum),
        result,
    })
}

/// Global transform properties computed once per (a, b, kind).
#[derive(Clone, Debug)]
struct Profile {
    kind: TransformKind,
    a: Plf,
    b: Plf,
    min_position: f64,
    max_position: f64,
    bounds: [f64; 4],
    result: Vec<(f64, f64)>,
}

impl Profile {
    fn compute(a: &Plf, b: &Plf, kind: TransformKind) -> Self {
        let (max_position, conv_min_x, conv_max_x) = if kind.is_deconvolution() {
            (
                a.end() - b.start(),
                (a.start() - a.end()) + b.start(),
                a.end().max(b.end()),
            )
        } else {
            (
                b.end() + a.end(),
                (-a.end()).min(b.start()),
                b.end() + (a.end() - a.start()),
            )
        };
        let min_position = 0.0;

        let mut result = Vec::with_capacity(RESULT_STEPS + 1);
        let (mut conv_min_y, mut conv_max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        if max_position >= min_position {
            for i in 0..=RESULT_STEPS {
                let p = min_position + (max_position - min_position) * i as f64 / RESULT_STEPS as f64;
                for k in [kind, counterpart(kind)] {
                    if let Ok(c) = construct(a, b, p, k) {
                        conv_min_y = conv_min_y.min(c.result.1);
                        conv_max_y = conv_max_y.max(c.result.1);
                        if k == kind {
                            result.push((p, c.result.1));
                        }
                    }
                }
            }
        }

        let min_y = a.min_y().min(b.min_y()).min(conv_min_y);
        let max_y = a.max_y().max(b.max_y()).max(conv_max_y);
        Self {
            kind,
            a: a.clone(),
            b: b.clone(),
            min_position,
            max_position,
            bounds: [
                conv_min_x - PROFILE_PADDING,
                conv_max_x + PROFILE_PADDING,
                min_y - PROFILE_PADDING,
                max_y + PROFILE_PADDING,
            ],
            result,
        }
    }

    fn value_at(&self, x: f64) -> Result<f64, String> {
        construct(&self.a, &self.b, x, self.kind).map(|c| c.result.1)
    }
}

/// The kind sharing the same construction but the opposite extremum.
fn counterpart(kind: TransformKind) -> TransformKind {
    match kind {
        TransformKind::MinPlusConv => TransformKind::MaxPlusConv,
        TransformKind::MaxPlusConv => TransformKind::MinPlusConv,
        TransformKind::MinPlusDeconv => TransformKind::MaxPlusDeconv,
        TransformKind::MaxPlusDeconv => TransformKind::MinPlusDeconv,
    }
}

/// Value tree used to build foreign containers.
enum Value {
    Number(f64),
    List(Vec<Value>),
    Record(Vec<(&'static str, Value)>),
}

fn series(x: Vec<f64>, y: Vec<f64>) -> Value {
    Value::Record(vec![
        ("x", Value::List(x.into_iter().map(Value::Number).collect())),
        ("y", Value::List(y.into_iter().map(Value::Number).collect())),
    ])
}

enum Entry {
    Number(f64),
    Nested(u64),
}

enum Object {
    Curve(Plf),
    Profile(Box<Profile>),
    List(Vec<Entry>),
    Record(Vec<(&'static str, Entry)>),
}

#[derive(Default)]
struct Heap {
    next_id: u64,
    objects: HashMap<u64, Object>,
    released: u64,
    double_releases: u64,
}

impl Heap {
    fn insert(&mut self, object: Object) -> u64 {
        self.next_id += 1;
        self.objects.insert(self.next_id, object);
        self.next_id
    }

    fn alloc(&mut self, value: Value) -> u64 {
        let object = match value {
            Value::Number(v) => Object::List(vec![Entry::Number(v)]),
            Value::List(items) => {
                Object::List(items.into_iter().map(|v| self.entry(v)).collect())
            }
            Value::Record(fields) => Object::Record(
                fields
                    .into_iter()
                    .map(|(name, v)| (name, self.entry(v)))
                    .collect(),
            ),
        };
        self.insert(object)
    }

    fn entry(&mut self, value: Value) -> Entry {
        match value {
            Value::Number(v) => Entry::Number(v),
            other => Entry::Nested(self.alloc(other)),
        }
    }
}

/// Reference engine with leak accounting.
#[derive(Default)]
pub struct PlfEngine {
    heap: RefCell<Heap>,
    fail_evaluations: Cell<bool>,
}

impl PlfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects allocated and not yet released.
    pub fn live_objects(&self) -> usize {
        self.heap.borrow().objects.len()
    }

    pub fn released_count(&self) -> u64 {
        self.heap.borrow().released
    }

    /// Releases of handles that were already gone.
    pub fn double_releases(&self) -> u64 {
        self.heap.borrow().double_releases
    }

    /// Make every following evaluation raise, as a broken engine state would.
    pub fn set_failing(&self, failing: bool) {
        self.fail_evaluations.set(failing);
    }

    fn check_failing(&self) -> EngineResult<()> {
        if self.fail_evaluations.get() {
            return Err(EngineError::Foreign {
                message: "engine raised during evaluation".to_string(),
            });
        }
        Ok(())
    }

    fn curve(&self, handle: &CurveHandle) -> EngineResult<Plf> {
        match self.heap.borrow().objects.get(&handle.raw()) {
            Some(Object::Curve(plf)) => Ok(plf.clone()),
            _ => Err(EngineError::StaleHandle { id: handle.raw() }),
        }
    }

    fn with_profile<T>(
        &self,
        handle: &ProfileHandle,
        f: impl FnOnce(&Profile) -> T,
    ) -> EngineResult<T> {
        match self.heap.borrow().objects.get(&handle.raw()) {
            Some(Object::Profile(profile)) => Ok(f(profile)),
            _ => Err(EngineError::StaleHandle { id: handle.raw() }),
        }
    }

    fn alloc(&self, value: Value) -> ForeignHandle {
        ForeignHandle::from_raw(self.heap.borrow_mut().alloc(value))
    }
}

impl ForeignRuntime for PlfEngine {
    fn inspect(&self, handle: &ForeignHandle) -> EngineResult<ForeignNode> {
        let heap = self.heap.borrow();
        let object = heap
            .objects
            .get(&handle.raw())
            .ok_or(EngineError::StaleHandle { id: handle.raw() })?;
        let item = |entry: &Entry| match *entry {
            Entry::Number(v) => ForeignItem::Immediate(NativeValue::Number(v)),
            Entry::Nested(id) => ForeignItem::Object(ForeignHandle::from_raw(id)),
        };
        Ok(match object {
            Object::Curve(plf) => ForeignNode::Scalar(NativeValue::Text(format!("{plf:?}"))),
            Object::Profile(profile) => {
                ForeignNode::Scalar(NativeValue::Text(format!("profile of {}", profile.kind)))
            }
            Object::List(entries) => ForeignNode::List(entries.iter().map(item).collect()),
            Object::Record(fields) => ForeignNode::Record(
                fields
                    .iter()
                    .map(|(name, entry)| (name.to_string(), item(entry)))
                    .collect(),
            ),
        })
    }

    fn release(&self, handle: ForeignHandle) {
        let mut heap = self.heap.borrow_mut();
        if heap.objects.remove(&handle.raw()).is_some() {
            heap.released += 1;
        } else {
            heap.double_releases += 1;
        }
    }
}

impl NumericEngine for PlfEngine {
    type Runtime = Self;

    fn runtime(&self) -> &Self {
        self
    }

    fn parse_curve(&self, text: &str) -> EngineResult<CurveHandle> {
        let plf = Plf::parse_rtc(text).map_err(|message| EngineError::Parse { message })?;
        let id = self.heap.borrow_mut().insert(Object::Curve(plf));
        Ok(CurveHandle::new(ForeignHandle::from_raw(id)))
    }

    fn curve_points(&self, curve: &CurveHandle) -> EngineResult<ForeignHandle> {
        let plf = self.curve(curve)?;
        Ok(self.alloc(plf.to_series()))
    }

    fn evaluate_at(
        &self,
        a: &CurveHandle,
        b: &CurveHandle,
        position: f64,
        kind: TransformKind,
    ) -> EngineResult<ForeignHandle> {
        self.check_failing()?;
        let (a, b) = (self.curve(a)?, self.curve(b)?);
        let c = construct(&a, &b, position, kind).map_err(|message| EngineError::Foreign { message })?;
        Ok(self.alloc(Value::Record(vec![
            ("transformed_a", c.transformed_a.to_series()),
            ("sum", c.sum.to_series()),
            (
                "result",
                Value::Record(vec![
                    ("x", Value::Number(c.result.0)),
                    ("y", Value::Number(c.result.1)),
                ]),
            ),
        ])))
    }

    fn compute_profile(
        &self,
        a: &CurveHandle,
        b: &CurveHandle,
        kind: TransformKind,
    ) -> EngineResult<ProfileHandle> {
        self.check_failing()?;
        let profile = Profile::compute(&self.curve(a)?, &self.curve(b)?, kind);
        let id = self
            .heap
            .borrow_mut()
            .insert(Object::Profile(Box::new(profile)));
        Ok(ProfileHandle::new(ForeignHandle::from_raw(id)))
    }

    fn profile_summary(&self, profile: &ProfileHandle) -> EngineResult<ForeignHandle> {
        let value = self.with_profile(profile, |p| {
            let [min_x, max_x, min_y, max_y] = p.bounds;
            Value::Record(vec![
                ("min_position", Value::Number(p.min_position)),
                ("max_position", Value::Number(p.max_position)),
                ("min_x", Value::Number(min_x)),
                ("max_x", Value::Number(max_x)),
                ("min_y", Value::Number(min_y)),
                ("max_y", Value::Number(max_y)),
                (
                    "result",
                    series(
                        p.result.iter().map(|r| r.0).collect(),
                        p.result.iter().map(|r| r.1).collect(),
                    ),
                ),
            ])
        })?;
        Ok(self.alloc(value))
    }

    fn evaluate_result_at(&self, profile: &ProfileHandle, x: f64) -> EngineResult<f64> {
        self.check_failing()?;
        self.with_profile(profile, |p| p.value_at(x))?
            .map_err(|message| EngineError::Foreign { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineExt;

    const A: &str = "[(0, 0, 0), (1, 1, 0), (2, 2, 0), (3, 3, 0)], 5";
    const B: &str = "[(0, 0, 0), (1, 0, 1)], 4";

    #[test]
    fn parses_staircase_with_jumps() {
        let a = Plf::parse_rtc(A).unwrap();
        assert_eq!(
            a.points(),
            &[
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (3.0, 2.0),
                (3.0, 3.0),
                (5.0, 3.0)
            ]
        );
        let b = Plf::parse_rtc(B).unwrap();
        assert_eq!(b.points(), &[(0.0, 0.0), (1.0, 0.0), (4.0, 3.0)]);
        assert_eq!(b.value_at(2.5), Some(1.5));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "[(0, 0, 0), (1, 1, 0), 5",
            "[(0, 0, 0), (1, 1, 0)",
            "[(0, 0), (1, 1, 0)], 5",
            "[(0, 0, 0), (1, 1, 0], 5",
            "[(1, 0, 0), (0, 1, 0)], 5",
            "[(0, 0, 0)], 0",
            "[], 3",
            "",
        ] {
            assert!(Plf::parse_rtc(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn min_plus_conv_matches_hand_computation() {
        let a = Plf::from_points(vec![(0.0, 2.0), (5.0, 4.5)]);
        let b = Plf::from_points(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 1.0),
            (3.0, 1.0),
            (4.0, 2.0),
            (5.0, 2.0),
        ]);
        let at = |x| construct(&a, &b, x, TransformKind::MinPlusConv).unwrap().result.1;
        assert_eq!(at(0.0), 2.0);
        assert_eq!(at(1.0), 2.0);
        assert_eq!(at(2.0), 2.5);
        assert_eq!(at(3.0), 3.0);
    }

    #[test]
    fn disjoint_curves_give_empty_sum_and_zero() {
        let a = Plf::parse_rtc("[(0, 0, 1)], 1").unwrap();
        let b = Plf::parse_rtc("[(0, 0, 0)], 1").unwrap();
        let c = construct(&a, &b, 3.0, TransformKind::MinPlusDeconv).unwrap();
        assert!(c.sum.points().is_empty());
        assert_eq!(c.result, (3.0, 0.0));

        let late = Plf::parse_rtc("[(2, 5, 1)], 4").unwrap();
        let c = construct(&late, &b, 0.0, TransformKind::MinPlusConv).unwrap();
        assert!(c.sum.points().is_empty());
        assert_eq!(c.result.1, 0.0);
    }

    #[test]
    fn typed_calls_release_transient_values() {
        let engine = PlfEngine::new();
        let a = engine.parse_curve(A).unwrap();
        let b = engine.parse_curve(B).unwrap();
        let profile = engine
            .compute_profile(&a, &b, TransformKind::MinPlusConv)
            .unwrap();
        let baseline = engine.live_objects();
        let released = engine.released_count();

        let summary = engine.summarize(&profile).unwrap();
        assert_eq!(summary.min_position, 0.0);
        assert_eq!(summary.max_position, 9.0);
        let sample = engine
            .sample_at(&a, &b, 0.0, TransformKind::MinPlusConv)
            .unwrap();
        assert_eq!(sample.result.y, 0.0);
        let _ = engine.curve_series(&a).unwrap();

        assert_eq!(engine.live_objects(), baseline);
        assert_eq!(engine.double_releases(), 0);
        let transient = engine.released_count() - released;
        assert!(transient > 0);

        engine.release_profile(profile);
        engine.release_curve(a);
        engine.release_curve(b);
        assert_eq!(engine.live_objects(), 0);
        assert_eq!(engine.released_count(), released + transient + 3);
    }

    #[test]
    fn failing_engine_raises_foreign_errors() {
        let engine = PlfEngine::new();
        let a = engine.parse_curve(A).unwrap();
        let b = engine.parse_curve(B).unwrap();
        engine.set_failing(true);
        let err = engine
            .compute_profile(&a, &b, TransformKind::MinPlusConv)
            .unwrap_err();
        assert!(matches!(err, EngineError::Foreign { .. }));
    }
}
