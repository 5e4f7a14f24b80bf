use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Axis-aligned box in image pixel coordinates: `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f32; 4]", from = "[f32; 4]")]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Builds a box from two arbitrary corners, ordering them so that
    /// `x_min <= x_max` and `y_min <= y_max`.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    pub fn width(&self) -> f32 { self.x_max - self.x_min }
    pub fn height(&self) -> f32 { self.y_max - self.y_min }

    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite() && self.y_min.is_finite() && self.x_max.is_finite() && self.y_max.is_finite()
    }

    /// Clips the box to `[0, width] x [0, height]`.
    pub fn clip(self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x_min: self.x_min.clamp(0.0, w),
            y_min: self.y_min.clamp(0.0, h),
            x_max: self.x_max.clamp(0.0, w),
            y_max: self.y_max.clamp(0.0, h),
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self { b.to_array() }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(a: [f32; 4]) -> Self { BoundingBox::from_corners(a[0], a[1], a[2], a[3]) }
}

/// One candidate tumor instance as returned by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    score: f32,
    #[serde(rename = "box")]
    bbox: BoundingBox,
}

impl Detection {
    pub fn new(score: f32, bbox: BoundingBox) -> DomainResult<Self> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(DomainError::InvalidInput(format!("score out of [0,1]: {score}")));
        }
        if !bbox.is_finite() {
            return Err(DomainError::InvalidInput("box has non-finite coordinates".into()));
        }
        if bbox.x_min > bbox.x_max || bbox.y_min > bbox.y_max {
            return Err(DomainError::InvalidInput(format!("box corners out of order: {:?}", bbox.to_array())));
        }
        Ok(Self { score, bbox })
    }

    pub fn score(&self) -> f32 { self.score }
    pub fn bbox(&self) -> BoundingBox { self.bbox }
}

/// Minimum confidence a detection needs to be reported. Always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f32);

impl Threshold {
    pub const ZERO: Threshold = Threshold(0.0);
    pub const ONE: Threshold = Threshold(1.0);

    pub fn new(value: f32) -> DomainResult<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidInput(format!("threshold out of [0,1]: {value}")))
        }
    }

    pub fn value(&self) -> f32 { self.0 }
}

/// Detections of one inference call, in the order the detector produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetectionSet(Vec<Detection>);

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self { Self(detections) }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> { self.0.iter() }

    /// Keeps the detections with `score >= threshold`, preserving order.
    pub fn filter(&self, threshold: Threshold) -> DetectionSet {
        DetectionSet(
            self.0
                .iter()
                .filter(|d| d.score >= threshold.value())
                .copied()
                .collect(),
        )
    }
}

impl FromIterator<Detection> for DetectionSet {
    fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(score: f32, b: [f32; 4]) -> Detection {
        Detection::new(score, b.into()).unwrap()
    }

    fn sample() -> DetectionSet {
        DetectionSet::new(vec![
            det(0.9, [10.0, 10.0, 50.0, 50.0]),
            det(0.3, [5.0, 5.0, 20.0, 20.0]),
            det(0.5, [1.0, 2.0, 3.0, 4.0]),
            det(1.0, [0.0, 0.0, 8.0, 8.0]),
            det(0.0, [7.0, 7.0, 9.0, 9.0]),
            det(0.75, [30.0, 12.0, 44.0, 60.0]),
        ])
    }

    #[test]
    fn filter_is_sound_and_complete() {
        let set = sample();
        for step in 0..=20 {
            let t = Threshold::new(step as f32 / 20.0).unwrap();
            let kept = set.filter(t);
            assert!(kept.iter().all(|d| d.score() >= t.value()));
            let expected: Vec<_> = set.iter().filter(|d| d.score() >= t.value()).copied().collect();
            assert_eq!(kept, DetectionSet::new(expected));
        }
    }

    #[test]
    fn filter_preserves_relative_order() {
        let kept = sample().filter(Threshold::new(0.5).unwrap());
        let scores: Vec<f32> = kept.iter().map(|d| d.score()).collect();
        assert_eq!(scores, vec![0.9, 0.5, 1.0, 0.75]);
    }

    #[test]
    fn filter_is_idempotent() {
        let t = Threshold::new(0.6).unwrap();
        let once = sample().filter(t);
        assert_eq!(once.filter(t), once);
    }

    #[test]
    fn zero_threshold_keeps_everything() {
        let set = sample();
        assert_eq!(set.filter(Threshold::ZERO), set);
    }

    #[test]
    fn unit_threshold_keeps_only_perfect_scores() {
        let kept = sample().filter(Threshold::ONE);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.iter().next().unwrap().score(), 1.0);
    }

    #[test]
    fn comparison_is_inclusive() {
        let set = DetectionSet::new(vec![det(0.5, [0.0, 0.0, 1.0, 1.0])]);
        assert_eq!(set.filter(Threshold::new(0.5).unwrap()).len(), 1);
    }

    #[test]
    fn empty_set_filters_to_empty() {
        assert!(DetectionSet::default().filter(Threshold::new(0.5).unwrap()).is_empty());
    }

    #[test]
    fn rejects_bad_scores_and_boxes() {
        assert!(Detection::new(1.2, [0.0, 0.0, 1.0, 1.0].into()).is_err());
        assert!(Detection::new(f32::NAN, [0.0, 0.0, 1.0, 1.0].into()).is_err());
        let inverted = BoundingBox { x_min: 5.0, y_min: 0.0, x_max: 1.0, y_max: 1.0 };
        assert!(Detection::new(0.5, inverted).is_err());
        assert!(Threshold::new(-0.01).is_err());
        assert!(Threshold::new(1.01).is_err());
    }

    #[test]
    fn corners_are_ordered_and_clipped() {
        let b = BoundingBox::from_corners(40.0, -3.0, 10.0, 120.0).clip(100, 100);
        assert_eq!(b.to_array(), [10.0, 0.0, 40.0, 100.0]);
    }
}
