//! Per-layer shape transitions and parameter counts
//!
//! All spatial divisions floor. A dimension that would come out zero or
//! negative is an error, never a silently propagated shape.

use log::trace;
use serde::Serialize;

use super::error::ShapeError;
use crate::layers::{LayerDescriptor, LayerKind, LayerParams, Shape};

/// Derived dimensions of a single layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerDimensions {
    pub input_shape: Shape,
    pub output_shape: Shape,
    pub param_count: u64,
    /// How `param_count` was obtained, e.g. `3*3*1*32 + 32 = 320`
    pub param_breakdown: String,
}

/// Derived state of a whole architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureSummary {
    pub dimensions: Vec<LayerDimensions>,
    /// Output of the last layer, or the input shape for an empty architecture
    pub output_shape: Shape,
    /// Sum of every layer's `param_count`
    pub total_params: u64,
}

const NO_PARAMS: &str = "no trainable parameters";

/// Infer the dimensions of every layer.
///
/// Pure and deterministic: the same layers and input shape always give the
/// same result. The output has exactly one entry per layer, and each entry's
/// `input_shape` is the previous entry's `output_shape`.
pub fn infer(
    layers: &[LayerDescriptor],
    input_shape: &Shape,
) -> std::result::Result<Vec<LayerDimensions>, ShapeError> {
    let mut current = input_shape.clone();
    let mut dimensions = Vec::with_capacity(layers.len());

    for (index, layer) in layers.iter().enumerate() {
        let step = Step {
            index,
            kind: layer.kind,
            params: &layer.params,
        };
        let (output_shape, param_count, param_breakdown) = step.apply(&current)?;

        trace!(
            "layer {} ({}): {} -> {}, {} params",
            index,
            layer.kind,
            current,
            output_shape,
            param_count
        );

        dimensions.push(LayerDimensions {
            input_shape: current,
            output_shape: output_shape.clone(),
            param_count,
            param_breakdown,
        });
        current = output_shape;
    }

    Ok(dimensions)
}

/// Infer every layer and total the parameter counts.
///
/// The total is always recomputed from the per-layer counts.
pub fn summarize(
    layers: &[LayerDescriptor],
    input_shape: &Shape,
) -> std::result::Result<ArchitectureSummary, ShapeError> {
    let dimensions = infer(layers, input_shape)?;

    let mut total_params: u64 = 0;
    for (index, (dims, layer)) in dimensions.iter().zip(layers).enumerate() {
        total_params = total_params
            .checked_add(dims.param_count)
            .ok_or(ShapeError::Overflow {
                index,
                kind: layer.kind,
            })?;
    }

    let output_shape = dimensions
        .last()
        .map(|d| d.output_shape.clone())
        .unwrap_or_else(|| input_shape.clone());

    Ok(ArchitectureSummary {
        dimensions,
        output_shape,
        total_params,
    })
}

/// One layer being inferred, with its position for error reporting
struct Step<'a> {
    index: usize,
    kind: LayerKind,
    params: &'a LayerParams,
}

type Transition = (Shape, u64, String);

impl Step<'_> {
    fn apply(&self, input: &Shape) -> std::result::Result<Transition, ShapeError> {
        match self.kind {
            LayerKind::Conv2D => {
                let (c, h, w) = self.spatial(input)?;
                let filters = self.uint("filters")?;
                let kernel = self.at_least_one("kernelSize")?;
                let stride = self.stride()?;
                let padding = self.uint("padding")?;

                let out_h = self.conv_extent("height", h, kernel, stride, padding)?;
                let out_w = self.conv_extent("width", w, kernel, stride, padding)?;
                let out_c = self.positive("channels", filters as i128)?;

                let weights = self.product(&[kernel, kernel, c, filters])?;
                let count = self.add(weights, filters as u64)?;
                Ok((
                    Shape::spatial(out_c, out_h, out_w),
                    count,
                    format!("{k}*{k}*{c}*{f} + {f} = {count}", k = kernel, f = filters),
                ))
            }
            LayerKind::Conv1x1 => {
                let (c, h, w) = self.spatial(input)?;
                let filters = self.uint("filters")?;
                let out_c = self.positive("channels", filters as i128)?;

                let weights = self.product(&[c, filters])?;
                let count = self.add(weights, filters as u64)?;
                Ok((
                    Shape::spatial(out_c, h, w),
                    count,
                    format!("{c}*{f} + {f} = {count}", f = filters),
                ))
            }
            LayerKind::BatchNorm => {
                let c = input.channels().unwrap_or(0);
                let count = self.product(&[4, c])?;
                Ok((
                    input.clone(),
                    count,
                    format!("4*{c} = {count} (scale, shift, running mean, running variance)"),
                ))
            }
            LayerKind::MaxPool => {
                // Only the stride drives the reduction. poolSize is not part of the formula,
                // which may not be intended; kept as documented.
                let (c, h, w) = self.spatial(input)?;
                let stride = self.stride()?;
                let out_h = self.positive("height", (h / stride) as i128)?;
                let out_w = self.positive("width", (w / stride) as i128)?;
                Ok((Shape::spatial(c, out_h, out_w), 0, NO_PARAMS.to_string()))
            }
            LayerKind::GlobalAvgPool => {
                let (c, _, _) = self.spatial(input)?;
                Ok((Shape::spatial(c, 1, 1), 0, NO_PARAMS.to_string()))
            }
            LayerKind::Flatten => {
                let features = self.element_count(input)?;
                Ok((Shape::flat(features), 0, NO_PARAMS.to_string()))
            }
            LayerKind::Dropout => Ok((input.clone(), 0, NO_PARAMS.to_string())),
            LayerKind::Dense => {
                // Implicitly flattens whatever arrives.
                let in_features = self.element_count(input)?;
                let units = self.uint("units")?;
                let out = self.positive("units", units as i128)?;

                let weights = self.product(&[in_features, units])?;
                let count = self.add(weights, units as u64)?;
                Ok((
                    Shape::flat(out),
                    count,
                    format!("{in_features}*{units} + {units} = {count}"),
                ))
            }
        }
    }

    fn spatial(&self, input: &Shape) -> std::result::Result<(usize, usize, usize), ShapeError> {
        input.as_spatial().ok_or_else(|| ShapeError::ExpectsSpatial {
            index: self.index,
            kind: self.kind,
            shape: input.clone(),
        })
    }

    fn uint(&self, name: &str) -> std::result::Result<usize, ShapeError> {
        self.params
            .require_uint(name)
            .map_err(|reason| self.invalid(name, reason))
    }

    fn stride(&self) -> std::result::Result<usize, ShapeError> {
        self.at_least_one("stride")
    }

    fn at_least_one(&self, name: &str) -> std::result::Result<usize, ShapeError> {
        match self.uint(name)? {
            0 => Err(self.invalid(name, "must be at least 1".to_string())),
            value => Ok(value),
        }
    }

    /// `floor((extent + 2*padding - kernel) / stride) + 1`
    fn conv_extent(
        &self,
        dimension: &'static str,
        extent: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
    ) -> std::result::Result<usize, ShapeError> {
        let numerator = extent as i128 + 2 * padding as i128 - kernel as i128;
        let value = numerator.div_euclid(stride as i128) + 1;
        self.positive(dimension, value)
    }

    fn positive(
        &self,
        dimension: &'static str,
        value: i128,
    ) -> std::result::Result<usize, ShapeError> {
        if value <= 0 {
            return Err(ShapeError::NonPositive {
                index: self.index,
                kind: self.kind,
                dimension,
                value,
            });
        }
        usize::try_from(value).map_err(|_| self.overflow())
    }

    fn element_count(&self, input: &Shape) -> std::result::Result<usize, ShapeError> {
        input.element_count().ok_or_else(|| self.overflow())
    }

    fn product(&self, factors: &[usize]) -> std::result::Result<u64, ShapeError> {
        factors
            .iter()
            .try_fold(1u64, |acc, &f| acc.checked_mul(f as u64))
            .ok_or_else(|| self.overflow())
    }

    fn add(&self, a: u64, b: u64) -> std::result::Result<u64, ShapeError> {
        a.checked_add(b).ok_or_else(|| self.overflow())
    }

    fn invalid(&self, param: &str, reason: String) -> ShapeError {
        ShapeError::InvalidParameter {
            index: self.index,
            kind: self.kind,
            param: param.to_string(),
            reason,
        }
    }

    fn overflow(&self) -> ShapeError {
        ShapeError::Overflow {
            index: self.index,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{default_params, instantiate};
    use test_case::test_case;

    fn layer(kind: LayerKind, params: LayerParams) -> LayerDescriptor {
        LayerDescriptor::new(kind, params)
    }

    fn conv(filters: i64, kernel: i64, stride: i64, padding: i64) -> LayerDescriptor {
        layer(
            LayerKind::Conv2D,
            LayerParams::new()
                .with("filters", filters)
                .with("kernelSize", kernel)
                .with("stride", stride)
                .with("padding", padding)
                .with("activation", "relu"),
        )
    }

    fn pool(size: i64, stride: i64) -> LayerDescriptor {
        layer(
            LayerKind::MaxPool,
            LayerParams::new().with("poolSize", size).with("stride", stride),
        )
    }

    fn dense(units: i64) -> LayerDescriptor {
        layer(
            LayerKind::Dense,
            LayerParams::new().with("units", units).with("activation", "relu"),
        )
    }

    #[test]
    fn test_conv2d_same_padding() {
        let dims = infer(&[conv(32, 3, 1, 1)], &Shape::spatial(1, 28, 28)).unwrap();

        assert_eq!(dims[0].input_shape, Shape::spatial(1, 28, 28));
        assert_eq!(dims[0].output_shape, Shape::spatial(32, 28, 28));
        assert_eq!(dims[0].param_count, 320);
        assert_eq!(dims[0].param_breakdown, "3*3*1*32 + 32 = 320");
    }

    #[test_case(28, 3, 1, 0 => 26 ; "valid padding")]
    #[test_case(28, 5, 2, 2 => 14 ; "strided")]
    #[test_case(7, 3, 2, 0 => 3 ; "floors")]
    #[test_case(3, 3, 1, 0 => 1 ; "kernel equals input")]
    fn test_conv2d_extent(extent: usize, kernel: i64, stride: i64, padding: i64) -> usize {
        let dims = infer(
            &[conv(8, kernel, stride, padding)],
            &Shape::spatial(1, extent, extent),
        )
        .unwrap();
        dims[0].output_shape.dims()[1]
    }

    #[test]
    fn test_maxpool_halves() {
        let dims = infer(&[pool(2, 2)], &Shape::spatial(32, 28, 28)).unwrap();
        assert_eq!(dims[0].output_shape, Shape::spatial(32, 14, 14));
        assert_eq!(dims[0].param_count, 0);
    }

    #[test]
    fn test_maxpool_ignores_pool_size() {
        let small = infer(&[pool(2, 2)], &Shape::spatial(8, 15, 15)).unwrap();
        let large = infer(&[pool(5, 2)], &Shape::spatial(8, 15, 15)).unwrap();
        assert_eq!(small[0].output_shape, Shape::spatial(8, 7, 7));
        assert_eq!(small[0].output_shape, large[0].output_shape);
    }

    #[test]
    fn test_conv1x1_keeps_plane() {
        let layers = [layer(
            LayerKind::Conv1x1,
            LayerParams::new().with("filters", 16),
        )];
        let dims = infer(&layers, &Shape::spatial(32, 14, 14)).unwrap();
        assert_eq!(dims[0].output_shape, Shape::spatial(16, 14, 14));
        assert_eq!(dims[0].param_count, 32 * 16 + 16);
    }

    #[test]
    fn test_batchnorm_counts_four_per_channel() {
        let layers = [instantiate(LayerKind::BatchNorm)];

        let dims = infer(&layers, &Shape::spatial(32, 14, 14)).unwrap();
        assert_eq!(dims[0].output_shape, Shape::spatial(32, 14, 14));
        assert_eq!(dims[0].param_count, 128);

        let dims = infer(&layers, &Shape::flat(64)).unwrap();
        assert_eq!(dims[0].param_count, 256);
    }

    #[test]
    fn test_reducing_layers() {
        let input = Shape::spatial(64, 7, 7);

        let gap = infer(&[instantiate(LayerKind::GlobalAvgPool)], &input).unwrap();
        assert_eq!(gap[0].output_shape, Shape::spatial(64, 1, 1));

        let flat = infer(&[instantiate(LayerKind::Flatten)], &input).unwrap();
        assert_eq!(flat[0].output_shape, Shape::flat(64 * 7 * 7));
        assert_eq!(flat[0].param_count, 0);
    }

    #[test]
    fn test_dense_flattens_implicitly() {
        let dims = infer(&[dense(10)], &Shape::spatial(32, 7, 7)).unwrap();
        assert_eq!(dims[0].output_shape, Shape::flat(10));
        assert_eq!(dims[0].param_count, 1568 * 10 + 10);

        let dims = infer(&[dense(10)], &Shape::spatial(64, 1, 1)).unwrap();
        assert_eq!(dims[0].param_count, 64 * 10 + 10);
    }

    #[test]
    fn test_dropout_is_identity() {
        let dims = infer(&[instantiate(LayerKind::Dropout)], &Shape::flat(128)).unwrap();
        assert_eq!(dims[0].output_shape, Shape::flat(128));
        assert_eq!(dims[0].param_breakdown, NO_PARAMS);
    }

    #[test]
    fn test_threading_and_total() {
        let layers = vec![
            conv(32, 3, 1, 1),
            pool(2, 2),
            conv(64, 3, 1, 1),
            pool(2, 2),
            instantiate(LayerKind::Flatten),
            dense(128),
            instantiate(LayerKind::Dropout),
            dense(10),
        ];
        let summary = summarize(&layers, &Shape::spatial(1, 28, 28)).unwrap();

        assert_eq!(summary.dimensions.len(), layers.len());
        for pair in summary.dimensions.windows(2) {
            assert_eq!(pair[0].output_shape, pair[1].input_shape);
        }
        assert_eq!(summary.output_shape, Shape::flat(10));

        let expected = 320 + 18_496 + (3136 * 128 + 128) + (128 * 10 + 10);
        assert_eq!(summary.total_params, expected);
        assert_eq!(
            summary.total_params,
            summary.dimensions.iter().map(|d| d.param_count).sum::<u64>()
        );
    }

    #[test]
    fn test_empty_architecture() {
        let summary = summarize(&[], &Shape::spatial(1, 28, 28)).unwrap();
        assert!(summary.dimensions.is_empty());
        assert_eq!(summary.output_shape, Shape::spatial(1, 28, 28));
        assert_eq!(summary.total_params, 0);
    }

    #[test]
    fn test_deterministic() {
        let layers = vec![conv(16, 5, 1, 2), pool(2, 2), dense(10)];
        let input = Shape::spatial(1, 28, 28);
        assert_eq!(infer(&layers, &input), infer(&layers, &input));
    }

    #[test]
    fn test_pool_underflow_is_error() {
        let layers = vec![pool(2, 2), pool(2, 2), pool(2, 2)];
        let err = infer(&layers, &Shape::spatial(1, 4, 4)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::NonPositive {
                index: 2,
                kind: LayerKind::MaxPool,
                dimension: "height",
                value: 0,
            }
        );
    }

    #[test]
    fn test_kernel_larger_than_input_is_error() {
        let err = infer(&[conv(8, 5, 1, 0)], &Shape::spatial(1, 3, 3)).unwrap_err();
        assert!(matches!(err, ShapeError::NonPositive { index: 0, .. }));
    }

    #[test]
    fn test_zero_stride_is_error() {
        let err = infer(&[pool(2, 0)], &Shape::spatial(1, 28, 28)).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::InvalidParameter { ref param, .. } if param == "stride"
        ));
    }

    #[test]
    fn test_zero_kernel_is_error() {
        let err = infer(&[conv(8, 0, 1, 1)], &Shape::spatial(1, 28, 28)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "layer 0 (Convolution 2D): parameter 'kernelSize' must be at least 1"
        );
    }

    #[test]
    fn test_param_count_overflow_is_error() {
        let layers = [
            instantiate(LayerKind::Conv2D),
            layer(LayerKind::Dense, LayerParams::new().with("units", i64::MAX)),
        ];
        let err = infer(&layers, &Shape::spatial(1, 28, 28)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Overflow {
                index: 1,
                kind: LayerKind::Dense,
            }
        );
    }

    #[test]
    fn test_missing_param_is_error() {
        let layers = [layer(LayerKind::Dense, LayerParams::new())];
        let err = infer(&layers, &Shape::flat(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "layer 0 (Fully Connected): parameter 'units' is missing"
        );
    }

    #[test]
    fn test_spatial_layer_after_flatten_is_error() {
        let layers = vec![
            instantiate(LayerKind::Flatten),
            layer(LayerKind::Conv2D, default_params(LayerKind::Conv2D)),
        ];
        let err = infer(&layers, &Shape::spatial(1, 28, 28)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::ExpectsSpatial {
                index: 1,
                kind: LayerKind::Conv2D,
                shape: Shape::flat(784),
            }
        );
    }

    #[test]
    fn test_accepts_float_and_string_params() {
        let layers = [layer(
            LayerKind::Conv2D,
            LayerParams::new()
                .with("filters", "32")
                .with("kernelSize", 3.0)
                .with("stride", 1)
                .with("padding", 1),
        )];
        let dims = infer(&layers, &Shape::spatial(1, 28, 28)).unwrap();
        assert_eq!(dims[0].param_count, 320);
    }
}
