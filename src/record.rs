//! Run records: the logging artifacts a benchmark produces while an external
//! optimizer drives it.
//!
//! A [`RunRecord`] collects scalar series (always including the `"loss"`
//! series written by the run loop), image frame series, one-off reference
//! images, and the best-so-far state: lowest loss seen, the step it occurred
//! at, and a snapshot of the parameters at that step.

use std::collections::BTreeMap;
#[cfg(feature = "serde")]
use std::path::Path;

use nalgebra::DVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::Image;

/// The scalar series the run loop writes the objective value to.
pub const LOSS_KEY: &str = "loss";

/// Best evaluation seen so far in a run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BestSoFar {
    /// Lowest loss observed.
    pub value: f64,
    /// Step at which it was observed.
    pub step: u64,
    /// Parameter snapshot at that step.
    pub params: Vec<f64>,
}

/// Logging artifacts collected across one optimization run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunRecord {
    scalars: BTreeMap<String, Vec<(u64, f64)>>,
    images: BTreeMap<String, Vec<(u64, Image)>>,
    reference_images: BTreeMap<String, Image>,
    /// Last raw frame per difference-logged key.
    last_frames: BTreeMap<String, Image>,
    best: Option<BestSoFar>,
    num_evals: u64,
}

impl RunRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scalar observation to the named series.
    pub fn log_scalar(&mut self, name: &str, step: u64, value: f64) {
        self.scalars
            .entry(name.to_string())
            .or_default()
            .push((step, value));
    }

    /// Appends an image frame to the named series.
    pub fn log_image(&mut self, name: &str, step: u64, image: Image) {
        self.images
            .entry(name.to_string())
            .or_default()
            .push((step, image));
    }

    /// Appends an image frame and the absolute change since the previous
    /// frame of the same key (logged under `"<name> update"`).
    ///
    /// The first frame of a key has nothing to diff against, so only the
    /// frame itself is logged.
    pub fn log_image_with_difference(&mut self, name: &str, step: u64, image: Image) {
        if let Some(prev) = self.last_frames.get(name) {
            if let Some(diff) = image.abs_diff(prev) {
                self.log_image(&format!("{name} update"), step, diff);
            }
        }
        self.last_frames.insert(name.to_string(), image.clone());
        self.log_image(name, step, image);
    }

    /// Stores a one-off reference image (inputs, known solutions).
    pub fn add_reference_image(&mut self, name: &str, image: Image) {
        self.reference_images.insert(name.to_string(), image);
    }

    /// Records a completed loss evaluation and updates the best-so-far state.
    ///
    /// Non-finite losses are logged but never become the best value.
    pub fn observe_loss(&mut self, step: u64, loss: f64, params: &DVector<f64>) {
        self.num_evals += 1;
        self.log_scalar(LOSS_KEY, step, loss);
        let improved = match &self.best {
            Some(best) => loss < best.value,
            None => true,
        };
        if improved && loss.is_finite() {
            self.best = Some(BestSoFar {
                value: loss,
                step,
                params: params.iter().copied().collect(),
            });
        }
    }

    /// The named scalar series, if any values were logged.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&[(u64, f64)]> {
        self.scalars.get(name).map(Vec::as_slice)
    }

    /// Names of all logged scalar series.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.scalars.keys().map(String::as_str)
    }

    /// The `"loss"` series.
    #[must_use]
    pub fn loss_history(&self) -> &[(u64, f64)] {
        self.scalars.get(LOSS_KEY).map_or(&[], Vec::as_slice)
    }

    /// The named image series, if any frames were logged.
    #[must_use]
    pub fn image_series(&self, name: &str) -> Option<&[(u64, Image)]> {
        self.images.get(name).map(Vec::as_slice)
    }

    /// Names of all logged image series.
    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// All stored reference images.
    #[must_use]
    pub fn reference_images(&self) -> &BTreeMap<String, Image> {
        &self.reference_images
    }

    /// Best evaluation seen so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEvaluations`] before the first finite loss.
    pub fn best(&self) -> Result<&BestSoFar> {
        self.best.as_ref().ok_or(Error::NoEvaluations)
    }

    /// Lowest loss seen so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEvaluations`] before the first finite loss.
    pub fn best_value(&self) -> Result<f64> {
        Ok(self.best()?.value)
    }

    /// Number of recorded loss evaluations.
    #[must_use]
    pub fn num_evals(&self) -> u64 {
        self.num_evals
    }

    /// Frame of `name` logged at the best step, if one exists.
    ///
    /// Benchmarks log frames during `evaluate`, so a series usually has a
    /// frame at the exact step the best loss was recorded.
    #[must_use]
    pub fn frame_at_best(&self, name: &str) -> Option<&Image> {
        let best_step = self.best.as_ref()?.step;
        self.images
            .get(name)?
            .iter()
            .find(|(step, _)| *step == best_step)
            .map(|(_, image)| image)
    }

    /// Saves the record as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the file write fails.
    #[cfg(feature = "serde")]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a record previously written by [`RunRecord::save`].
    ///
    /// # Errors
    ///
    /// Returns an error when the file read or deserialization fails.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn test_best_tracking_monotone() {
        let mut record = RunRecord::new();
        let params = dvector![0.0];
        record.observe_loss(0, 5.0, &params);
        record.observe_loss(1, 7.0, &params);
        record.observe_loss(2, 2.0, &dvector![1.5]);
        record.observe_loss(3, 3.0, &params);

        let best = record.best().unwrap();
        assert_eq!(best.value, 2.0);
        assert_eq!(best.step, 2);
        assert_eq!(best.params, vec![1.5]);
        assert_eq!(record.num_evals(), 4);
    }

    #[test]
    fn test_non_finite_never_best() {
        let mut record = RunRecord::new();
        record.observe_loss(0, f64::NAN, &dvector![0.0]);
        assert!(record.best().is_err());
        record.observe_loss(1, 1.0, &dvector![0.0]);
        record.observe_loss(2, f64::NEG_INFINITY, &dvector![0.0]);
        assert_eq!(record.best_value().unwrap(), 1.0);
        // All three evaluations still land in the loss series.
        assert_eq!(record.loss_history().len(), 3);
    }

    #[test]
    fn test_difference_logging() {
        use crate::image::Image;
        use nalgebra::DMatrix;

        let mut record = RunRecord::new();
        let a = Image::from_matrix(&DMatrix::from_element(2, 2, 1.0));
        let b = Image::from_matrix(&DMatrix::from_element(2, 2, 3.0));
        record.log_image_with_difference("preds", 0, a);
        record.log_image_with_difference("preds", 1, b);

        assert_eq!(record.image_series("preds").unwrap().len(), 2);
        let updates = record.image_series("preds update").unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.get(0, 0, 0), 2.0);
    }
}
