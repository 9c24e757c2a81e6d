//! Transformation parameters and their normalization.
//!
//! Callers hand over loosely-typed option bags (`ResizeOptions`) using either
//! the CDN's short keys (`w`, `q`, `fit`) or long aliases (`width`,
//! `quality`). Normalization keeps only recognized keys whose values pass
//! validation; everything else is dropped without an error. The drop list is
//! available through [`normalize_with_report`] for callers that want to see it.

use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use super::cdn;

/// A loosely-typed option or payload value.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Leading-integer coercion: `"300px"` is 300 and `12.7` is 12.
    /// Booleans, lists and text without leading digits are not coercible.
    pub fn to_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            ParamValue::Float(value) => {
                (value.is_finite() && value.abs() < i64::MAX as f64).then(|| value.trunc() as i64)
            }
            ParamValue::Str(text) => leading_integer(text),
            ParamValue::Bool(_) | ParamValue::List(_) => None,
        }
    }

    /// Scalar rendering. Lists have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            ParamValue::Bool(value) => Some(value.to_string()),
            ParamValue::Int(value) => Some(value.to_string()),
            ParamValue::Float(value) => Some(value.to_string()),
            ParamValue::Str(text) => Some(text.clone()),
            ParamValue::List(_) => None,
        }
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    format!("{sign}{digits}").parse().ok()
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Canonical short-form keys understood by the CDN.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Width,
    Height,
    Quality,
    Format,
    Blur,
    Brightness,
    Contrast,
    Rotation,
    Fit,
    Crop,
}

impl ParamKey {
    pub const ALL: [ParamKey; 10] = [
        ParamKey::Width,
        ParamKey::Height,
        ParamKey::Quality,
        ParamKey::Format,
        ParamKey::Blur,
        ParamKey::Brightness,
        ParamKey::Contrast,
        ParamKey::Rotation,
        ParamKey::Fit,
        ParamKey::Crop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Width => "w",
            ParamKey::Height => "h",
            ParamKey::Quality => "q",
            ParamKey::Format => "f",
            ParamKey::Blur => "b",
            ParamKey::Brightness => "br",
            ParamKey::Contrast => "c",
            ParamKey::Rotation => "r",
            ParamKey::Fit => "fit",
            ParamKey::Crop => "crop",
        }
    }

    fn long_alias(&self) -> Option<&'static str> {
        match self {
            ParamKey::Width => Some("width"),
            ParamKey::Height => Some("height"),
            ParamKey::Quality => Some("quality"),
            ParamKey::Format => Some("format"),
            ParamKey::Blur => Some("blur"),
            ParamKey::Brightness => Some("brightness"),
            ParamKey::Contrast => Some("contrast"),
            ParamKey::Rotation => Some("rotation"),
            ParamKey::Fit | ParamKey::Crop => None,
        }
    }

    /// Resolves a short key or a long alias.
    pub fn from_alias(key: &str) -> Option<ParamKey> {
        ParamKey::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == key || candidate.long_alias() == Some(key))
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied transformation options in insertion order.
///
/// Setting a key that is already present replaces its value in place, so a
/// later alias (`q` after `quality`) still wins during normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResizeOptions(Vec<(String, ParamValue)>);

impl ResizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// A copy of `self` with every entry of `overrides` applied on top.
    pub fn merged(&self, overrides: &ResizeOptions) -> ResizeOptions {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            merged.set(key.clone(), value.clone());
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ResizeOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = ResizeOptions::new();
        for (key, value) in iter {
            options.set(key, value);
        }
        options
    }
}

/// Validated parameters keyed by their canonical short form.
///
/// Storage is unordered; [`TransformationParams::canonical_query`] is the only
/// place an order is imposed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformationParams(HashMap<ParamKey, String>);

impl TransformationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn insert(&mut self, key: ParamKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlays `overrides`; its values win on shared keys.
    pub fn merge(&mut self, overrides: TransformationParams) {
        self.0.extend(overrides.0);
    }

    /// Entries sorted lexicographically by short key.
    pub fn sorted(&self) -> Vec<(ParamKey, &str)> {
        self.0
            .iter()
            .sorted_by_key(|(key, _)| key.as_str())
            .map(|(key, value)| (*key, value.as_str()))
            .collect()
    }

    /// `key=value` pairs sorted by key and joined with `&`, unescaped.
    pub fn canonical_query(&self) -> String {
        self.sorted()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .join("&")
    }

    /// Feeds the parameters back into option form.
    pub fn to_options(&self) -> ResizeOptions {
        self.sorted()
            .into_iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }
}

impl<V: Into<String>> FromIterator<(ParamKey, V)> for TransformationParams {
    fn from_iter<I: IntoIterator<Item = (ParamKey, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    UnknownKey,
    InvalidValue,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::UnknownKey => "unknown_key",
            DropReason::InvalidValue => "invalid_value",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedParam {
    pub key: String,
    pub reason: DropReason,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Normalized {
    pub params: TransformationParams,
    pub dropped: Vec<DroppedParam>,
}

pub fn normalize(options: &ResizeOptions) -> TransformationParams {
    normalize_with_report(options).params
}

pub fn normalize_with_report(options: &ResizeOptions) -> Normalized {
    let mut normalized = Normalized::default();
    for (key, value) in options.iter() {
        let Some(param_key) = ParamKey::from_alias(key) else {
            normalized.dropped.push(DroppedParam {
                key: key.clone(),
                reason: DropReason::UnknownKey,
            });
            continue;
        };
        match normalize_value(param_key, value) {
            Some(normalized_value) => normalized.params.insert(param_key, normalized_value),
            None => normalized.dropped.push(DroppedParam {
                key: key.clone(),
                reason: DropReason::InvalidValue,
            }),
        }
    }
    normalized
}

/// Validates one value for `key`, returning its canonical text.
///
/// Besides the CDN's scalar keys this accepts `crop`, as a four-element list or
/// `"x,y,w,h"` text of integers, so variant crops survive renormalization.
pub fn normalize_value(key: ParamKey, value: &ParamValue) -> Option<String> {
    match key {
        ParamKey::Width
        | ParamKey::Height
        | ParamKey::Blur
        | ParamKey::Brightness
        | ParamKey::Contrast
        | ParamKey::Rotation => positive_integer(value),
        ParamKey::Quality => quality(value),
        ParamKey::Format => {
            let format = value.to_text()?.to_lowercase();
            cdn::VALID_FORMATS.contains(&format.as_str()).then_some(format)
        }
        ParamKey::Fit => {
            let fit = value.to_text()?.to_lowercase().replace('_', "-");
            cdn::VALID_FITS.contains(&fit.as_str()).then_some(fit)
        }
        ParamKey::Crop => match value {
            ParamValue::List(items) => crop_region(items),
            other => {
                let text = other.to_text()?;
                let items: Vec<ParamValue> =
                    text.split(',').map(|part| part.trim().into()).collect();
                crop_region(&items)
            }
        },
    }
}

pub(crate) fn positive_integer(value: &ParamValue) -> Option<String> {
    value
        .to_int()
        .filter(|number| *number > 0)
        .map(|number| number.to_string())
}

pub(crate) fn quality(value: &ParamValue) -> Option<String> {
    value
        .to_int()
        .filter(|q| (cdn::QUALITY_MIN..=cdn::QUALITY_MAX).contains(q))
        .map(|q| q.to_string())
}

/// `x,y,w,h` from exactly four integer components.
fn crop_region(items: &[ParamValue]) -> Option<String> {
    if items.len() != 4 {
        return None;
    }
    let components: Option<Vec<i64>> = items.iter().map(strict_integer).collect();
    Some(components?.iter().join(","))
}

fn strict_integer(value: &ParamValue) -> Option<i64> {
    match value {
        ParamValue::Int(number) => Some(*number),
        ParamValue::Str(text) => text.trim().parse().ok(),
        _ => None,
    }
}
