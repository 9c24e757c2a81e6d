//! Maps a storage-side variant pipeline onto CDN parameters so live variants
//! and ad-hoc resize requests end up in the same vocabulary.

use regex::Regex;
use tracing::instrument;

use super::params::{self, ParamKey, ParamValue, TransformationParams};
use crate::asset::Asset;

const NON_ROTATION_CHARS_PATTERN: &str = r"[^0-9\-]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeMode {
    Limit,
    Fit,
    Fill,
    Pad,
}

impl ResizeMode {
    pub fn from_operation(name: &str) -> Option<ResizeMode> {
        match name {
            "resize_to_limit" => Some(ResizeMode::Limit),
            "resize_to_fit" => Some(ResizeMode::Fit),
            "resize_to_fill" => Some(ResizeMode::Fill),
            "resize_and_pad" => Some(ResizeMode::Pad),
            _ => None,
        }
    }

    pub fn fit(&self) -> &'static str {
        match self {
            ResizeMode::Limit => "scale-down",
            ResizeMode::Fit => "contain",
            ResizeMode::Fill => "cover",
            ResizeMode::Pad => "pad",
        }
    }
}

/// One step of a variant's transformation pipeline.
///
/// Payloads stay loosely typed; their shape is checked when the pipeline is
/// transformed, not when it is built.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Resize {
        mode: ResizeMode,
        dimensions: Vec<ParamValue>,
    },
    Quality(ParamValue),
    Format(ParamValue),
    Rotate(ParamValue),
    Crop(Vec<ParamValue>),
    Other(String),
}

impl Operation {
    /// Builds an operation from the storage layer's `name => payload` form.
    pub fn parse(name: &str, payload: ParamValue) -> Operation {
        if let Some(mode) = ResizeMode::from_operation(name) {
            return Operation::Resize {
                mode,
                dimensions: list_payload(payload),
            };
        }
        match name {
            "quality" => Operation::Quality(payload),
            "format" => Operation::Format(payload),
            "rotate" => Operation::Rotate(payload),
            "crop" => Operation::Crop(list_payload(payload)),
            other => Operation::Other(other.to_string()),
        }
    }

    pub fn resize(
        mode: ResizeMode,
        width: impl Into<ParamValue>,
        height: impl Into<ParamValue>,
    ) -> Operation {
        Operation::Resize {
            mode,
            dimensions: vec![width.into(), height.into()],
        }
    }
}

fn list_payload(payload: ParamValue) -> Vec<ParamValue> {
    match payload {
        ParamValue::List(items) => items,
        scalar => vec![scalar],
    }
}

/// Parameters derived from an asset. Only variants carry a pipeline; every
/// other asset yields an empty set.
pub fn transform_asset(asset: &Asset) -> TransformationParams {
    match asset {
        Asset::Variant(variant) => transform(&variant.operations),
        _ => TransformationParams::new(),
    }
}

#[instrument(skip_all, level = tracing::Level::DEBUG)]
pub fn transform(operations: &[Operation]) -> TransformationParams {
    let mut params = TransformationParams::new();
    for operation in operations {
        match operation {
            Operation::Resize { mode, dimensions } => {
                let [width, height, ..] = dimensions.as_slice() else {
                    continue;
                };
                if let Some(width) = params::positive_integer(width) {
                    params.insert(ParamKey::Width, width);
                }
                if let Some(height) = params::positive_integer(height) {
                    params.insert(ParamKey::Height, height);
                }
                params.insert(ParamKey::Fit, mode.fit());
            }
            Operation::Quality(value) => {
                if let Some(quality) = params::quality(value) {
                    params.insert(ParamKey::Quality, quality);
                }
            }
            Operation::Format(value) => {
                if let Some(format) = variant_format(value) {
                    params.insert(ParamKey::Format, format);
                }
            }
            Operation::Rotate(value) => {
                if let Some(rotation) = rotation(value) {
                    params.insert(ParamKey::Rotation, rotation);
                }
            }
            Operation::Crop(region) => {
                if let Some(crop) = crop_region(region) {
                    params.insert(ParamKey::Crop, crop);
                }
            }
            Operation::Other(name) => {
                tracing::debug!(operation = %name, "Ignoring unsupported variant operation.");
            }
        }
    }
    params
}

fn variant_format(value: &ParamValue) -> Option<String> {
    let format = value.to_text()?.to_lowercase();
    match format.as_str() {
        "jpg" | "jpeg" => Some("jpg".to_string()),
        "png" | "webp" | "avif" | "gif" => Some(format),
        _ => None,
    }
}

// Any four scalars are joined as given; only the shape is checked.
fn crop_region(region: &[ParamValue]) -> Option<String> {
    if region.len() != 4 {
        return None;
    }
    let components: Option<Vec<String>> = region.iter().map(ParamValue::to_text).collect();
    Some(components?.join(","))
}

// Unit suffixes and function wrappers are stripped: "-90deg" and
// "rotate(180)" become "-90" and "180".
fn rotation(value: &ParamValue) -> Option<String> {
    let text = value.to_text()?;
    let regex = Regex::new(NON_ROTATION_CHARS_PATTERN).ok()?;
    let rotation = regex.replace_all(&text, "").into_owned();
    (!rotation.is_empty()).then_some(rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{BlobRef, VariantRef};
    use rstest::rstest;

    fn single(operation: Operation) -> TransformationParams {
        transform(&[operation])
    }

    #[rstest]
    #[case("resize_to_limit", 100, 100, "scale-down")]
    #[case("resize_to_fit", 200, 150, "contain")]
    #[case("resize_to_fill", 300, 200, "cover")]
    #[case("resize_and_pad", 640, 480, "pad")]
    fn resize_operations_set_dimensions_and_fit(
        #[case] name: &str,
        #[case] width: i64,
        #[case] height: i64,
        #[case] fit: &str,
    ) {
        let params = single(Operation::parse(name, vec![width, height].into()));

        assert_eq!(params.get(ParamKey::Width), Some(width.to_string().as_str()));
        assert_eq!(params.get(ParamKey::Height), Some(height.to_string().as_str()));
        assert_eq!(params.get(ParamKey::Fit), Some(fit));
    }

    #[test]
    fn resize_skips_missing_dimension_but_keeps_fit() {
        let params = single(Operation::Resize {
            mode: ResizeMode::Limit,
            dimensions: vec![ParamValue::Int(0), ParamValue::Int(300)],
        });

        assert!(!params.contains(ParamKey::Width));
        assert_eq!(params.get(ParamKey::Height), Some("300"));
        assert_eq!(params.get(ParamKey::Fit), Some("scale-down"));
    }

    #[test]
    fn resize_with_one_dimension_is_ignored() {
        let params = single(Operation::parse("resize_to_fill", 300.into()));
        assert!(params.is_empty());
    }

    #[rstest]
    #[case(85, Some("85"))]
    #[case(0, None)]
    #[case(-10, None)]
    #[case(150, None)]
    fn quality_is_range_checked(#[case] quality: i64, #[case] expected: Option<&str>) {
        let params = single(Operation::Quality(quality.into()));
        assert_eq!(params.get(ParamKey::Quality), expected);
    }

    #[rstest]
    #[case("webp", Some("webp"))]
    #[case("jpeg", Some("jpg"))]
    #[case("JPEG", Some("jpg"))]
    #[case("invalid", None)]
    #[case("unknown", None)]
    fn format_normalizes_jpeg(#[case] format: &str, #[case] expected: Option<&str>) {
        let params = single(Operation::Format(format.into()));
        assert_eq!(params.get(ParamKey::Format), expected);
    }

    #[rstest]
    #[case(ParamValue::from("-90"), Some("-90"))]
    #[case(ParamValue::from("-90deg"), Some("-90"))]
    #[case(ParamValue::from("rotate(180)"), Some("180"))]
    #[case(ParamValue::from(-90), Some("-90"))]
    #[case(ParamValue::from("none"), None)]
    fn rotation_strips_units_and_wrappers(
        #[case] value: ParamValue,
        #[case] expected: Option<&str>,
    ) {
        let params = single(Operation::Rotate(value));
        assert_eq!(params.get(ParamKey::Rotation), expected);
    }

    #[test]
    fn crop_emits_region_for_four_elements() {
        let params = single(Operation::parse("crop", vec![10, 20, 300, 400].into()));
        assert_eq!(params.get(ParamKey::Crop), Some("10,20,300,400"));
    }

    #[test]
    fn crop_with_float_components_is_emitted() {
        let region = ParamValue::List(vec![
            ParamValue::Float(10.5),
            ParamValue::Int(20),
            ParamValue::Int(300),
            ParamValue::Int(400),
        ]);
        let params = single(Operation::parse("crop", region));
        assert_eq!(params.get(ParamKey::Crop), Some("10.5,20,300,400"));
    }

    #[test]
    fn crop_with_nested_list_is_ignored() {
        let region = ParamValue::List(vec![
            ParamValue::Int(10),
            ParamValue::Int(20),
            ParamValue::Int(300),
            ParamValue::from(vec![400, 5]),
        ]);
        let params = single(Operation::parse("crop", region));
        assert!(!params.contains(ParamKey::Crop));
    }

    #[rstest]
    #[case(vec![10, 20, 300])]
    #[case(vec![10, 20, 300, 400, 5])]
    #[case(vec![])]
    fn crop_with_other_shapes_is_ignored(#[case] region: Vec<i64>) {
        let params = single(Operation::parse("crop", region.into()));
        assert!(!params.contains(ParamKey::Crop));
    }

    #[test]
    fn multiple_operations_combine() {
        let params = transform(&[
            Operation::resize(ResizeMode::Limit, 400, 300),
            Operation::Quality(90.into()),
            Operation::Format("webp".into()),
            Operation::Other("saver".to_string()),
        ]);

        assert_eq!(params.get(ParamKey::Width), Some("400"));
        assert_eq!(params.get(ParamKey::Height), Some("300"));
        assert_eq!(params.get(ParamKey::Fit), Some("scale-down"));
        assert_eq!(params.get(ParamKey::Quality), Some("90"));
        assert_eq!(params.get(ParamKey::Format), Some("webp"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn non_variant_assets_yield_nothing() {
        let blob = BlobRef::new("abc123", "photo.jpg");
        assert!(transform_asset(&Asset::Blob(blob.clone())).is_empty());
        assert!(transform_asset(&Asset::unsupported("String")).is_empty());

        let variant = Asset::Variant(VariantRef::new(
            blob,
            vec![Operation::resize(ResizeMode::Fill, 64, 64)],
        ));
        assert_eq!(transform_asset(&variant).get(ParamKey::Fit), Some("cover"));
    }
}
