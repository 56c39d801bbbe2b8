//! Query-string encoding of [`SharedState`].

use std::collections::HashMap;

use cv_core::SlotVisibilities;
use cv_engine::TransformKind;
use tracing::debug;

use crate::ShareError;
use crate::field::decode_field;
use crate::state::SharedState;

pub const PARAM_CURVE_A: &str = "curveA";
pub const PARAM_CURVE_B: &str = "curveB";
pub const PARAM_TRANSFORM_KIND: &str = "transformKind";
pub const PARAM_POSITION: &str = "currentPosition";
pub const PARAM_VISIBILITIES: &str = "visibilities";

const KNOWN_PARAMS: [&str; 5] = [
    PARAM_CURVE_A,
    PARAM_CURVE_B,
    PARAM_TRANSFORM_KIND,
    PARAM_POSITION,
    PARAM_VISIBILITIES,
];

/// Result of decoding: a complete state plus one warning per unusable field.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub state: SharedState,
    pub warnings: Vec<ShareError>,
}

impl Decoded {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub fn encode(state: &SharedState) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(PARAM_CURVE_A, &state.curve_a)
        .append_pair(PARAM_CURVE_B, &state.curve_b)
        .append_pair(PARAM_TRANSFORM_KIND, &state.kind.ordinal().to_string())
        // Display for f64 is the shortest string that parses back to the same value.
        .append_pair(PARAM_POSITION, &state.position.to_string())
        .append_pair(PARAM_VISIBILITIES, &state.visibilities.to_bitstring())
        .finish()
}

/// Decode a query string (with or without the leading `?`).
///
/// A query carrying none of the known parameters is a plain page load and
/// yields `defaults` without warnings.
pub fn decode(query: &str, defaults: &SharedState) -> Decoded {
    let query = query.strip_prefix('?').unwrap_or(query);
    let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    if !KNOWN_PARAMS.iter().any(|p| params.contains_key(*p)) {
        debug!("no share parameters present");
        return Decoded {
            state: defaults.clone(),
            warnings: Vec::new(),
        };
    }

    let get = |name: &str| params.get(name).map(String::as_str);
    let mut warnings = Vec::new();

    let curve_a = keep(
        &mut warnings,
        decode_field(
            PARAM_CURVE_A,
            get(PARAM_CURVE_A),
            defaults.curve_a.clone(),
            parse_curve_text,
        ),
    );
    let curve_b = keep(
        &mut warnings,
        decode_field(
            PARAM_CURVE_B,
            get(PARAM_CURVE_B),
            defaults.curve_b.clone(),
            parse_curve_text,
        ),
    );
    let kind = keep(
        &mut warnings,
        decode_field(
            PARAM_TRANSFORM_KIND,
            get(PARAM_TRANSFORM_KIND),
            defaults.kind,
            parse_kind,
        ),
    );
    let position = keep(
        &mut warnings,
        decode_field(
            PARAM_POSITION,
            get(PARAM_POSITION),
            defaults.position,
            parse_position,
        ),
    );
    let visibilities = keep(
        &mut warnings,
        decode_field(
            PARAM_VISIBILITIES,
            get(PARAM_VISIBILITIES),
            defaults.visibilities,
            parse_visibilities,
        ),
    );

    Decoded {
        state: SharedState {
            curve_a,
            curve_b,
            kind,
            position,
            visibilities,
        },
        warnings,
    }
}

/// `base` with its query and fragment replaced by the encoded state.
pub fn share_link(base: &str, state: &SharedState) -> String {
    let end = base.find(['?', '#']).unwrap_or(base.len());
    format!("{}?{}", &base[..end], encode(state))
}

/// The query part of a full link, or the input itself when it has no `?`.
pub fn query_of(link: &str) -> &str {
    let without_fragment = link.split('#').next().unwrap_or(link);
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    }
}

fn keep<T>(warnings: &mut Vec<ShareError>, (value, warning): (T, Option<ShareError>)) -> T {
    warnings.extend(warning);
    value
}

fn parse_curve_text(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("curve definition is empty".to_string());
    }
    Ok(raw.to_string())
}

fn parse_kind(raw: &str) -> Result<TransformKind, String> {
    let ordinal: usize = raw
        .trim()
        .parse()
        .map_err(|e| format!("not an ordinal: {e}"))?;
    TransformKind::from_ordinal(ordinal).map_err(|e| e.to_string())
}

fn parse_position(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if !value.is_finite() {
        return Err("position must be finite".to_string());
    }
    Ok(value)
}

fn parse_visibilities(raw: &str) -> Result<SlotVisibilities, String> {
    SlotVisibilities::from_bitstring(raw.trim()).map_err(|e| e.to_string())
}
