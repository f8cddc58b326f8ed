//! MIRT predictor.
//!
//! Each exercise `e` has a coupling row `w_e` of length `A + 1` (the last
//! entry is the bias). For abilities `a`:
//!
//! ```text
//! P(correct | a, e) = sigmoid(w_e[..A] · a + w_e[A])
//! ```
//!
//! When the parameter file also carries a time model, `ln(time_taken)` for
//! exercise `e` is Gaussian with mean `v_e[..A] · a + v_e[A]` and standard
//! deviation `sigma_e`.
//!
//! Abilities are re-estimated from scratch on every query as the MAP point
//! under a standard normal prior.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use irtroc_core::model::HistoryItem;
use irtroc_core::traits::{AccuracyModel, PredictorFactory};

use crate::error::MirtError;
use crate::params::{load_params, MirtParams};

/// Gradient norm at which ability estimation stops.
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 500;
/// Floor for time-model standard deviations.
const MIN_SIGMA: f64 = 1e-3;

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm_sq(a: &[f64]) -> f64 {
    dot(a, a)
}

#[derive(Debug, Clone)]
struct TimeModel {
    couplings: Vec<f64>,
    sigma: Vec<f64>,
}

/// Reshaped MIRT parameters.
#[derive(Debug, Clone)]
pub struct Theta {
    abilities: usize,
    exercises: usize,
    couplings: Vec<f64>,
    time: Option<TimeModel>,
    rows: HashMap<String, usize>,
    live: Option<HashSet<String>>,
}

impl Theta {
    /// Interpret `theta_flat` using the exercise rows and ability count.
    ///
    /// The flat vector is either the `E x (A+1)` correctness couplings, or
    /// those followed by `E x (A+1)` time couplings and `E` time deviations.
    pub fn from_params(params: &MirtParams) -> Result<Self, MirtError> {
        let mut rows = HashMap::with_capacity(params.exercise_ind_dict.len());
        for (exercise, &row) in &params.exercise_ind_dict {
            let index = usize::try_from(row).map_err(|_| MirtError::InvalidRow {
                exercise: exercise.clone(),
                row,
            })?;
            rows.insert(exercise.clone(), index);
        }

        let too_large = || MirtError::InvalidShape {
            max_row: rows.values().max().copied().unwrap_or(0),
            abilities: params.num_abilities,
        };
        let exercises = match rows.values().max() {
            Some(&m) => m.checked_add(1).ok_or_else(too_large)?,
            None => 0,
        };
        let (couplings_len, with_time_len) = params
            .num_abilities
            .checked_add(1)
            .and_then(|width| exercises.checked_mul(width))
            .and_then(|couplings| {
                let with_time = couplings.checked_mul(2)?.checked_add(exercises)?;
                Some((couplings, with_time))
            })
            .ok_or_else(too_large)?;
        let flat = &params.theta_flat;

        let time = if flat.len() == couplings_len {
            None
        } else if flat.len() == with_time_len {
            Some(TimeModel {
                couplings: flat[couplings_len..2 * couplings_len].to_vec(),
                sigma: flat[2 * couplings_len..]
                    .iter()
                    .map(|s| s.abs().max(MIN_SIGMA))
                    .collect(),
            })
        } else {
            return Err(MirtError::ShapeMismatch {
                len: flat.len(),
                couplings: couplings_len,
                with_time: with_time_len,
                exercises,
                abilities: params.num_abilities,
            });
        };

        Ok(Self {
            abilities: params.num_abilities,
            exercises,
            couplings: flat[..couplings_len].to_vec(),
            time,
            rows,
            live: params
                .live_exercises
                .as_ref()
                .map(|live| live.iter().cloned().collect()),
        })
    }

    pub fn num_abilities(&self) -> usize {
        self.abilities
    }

    pub fn num_exercises(&self) -> usize {
        self.exercises
    }

    pub fn has_time_model(&self) -> bool {
        self.time.is_some()
    }

    pub fn row(&self, exercise: &str) -> Option<usize> {
        self.rows.get(exercise).copied()
    }

    fn width(&self) -> usize {
        self.abilities + 1
    }

    fn coupling_row(&self, row: usize) -> &[f64] {
        let w = self.width();
        &self.couplings[row * w..(row + 1) * w]
    }

    fn is_live(&self, exercise: &str) -> bool {
        self.live.as_ref().map_or(true, |live| live.contains(exercise))
    }

    /// Probability of a correct response on `row` given `abilities`.
    pub fn probability_correct(&self, abilities: &[f64], row: usize) -> f64 {
        let w = self.coupling_row(row);
        let (weights, bias) = w.split_at(self.abilities);
        sigmoid(dot(weights, abilities) + bias[0])
    }

    /// MAP ability estimate from `(row, correct, ln time)` observations.
    pub fn estimate_abilities(&self, evidence: &[Evidence]) -> Vec<f64> {
        let dims = self.abilities;
        let mut abilities = vec![0.0; dims];
        if dims == 0 || evidence.is_empty() {
            return abilities;
        }

        // Step of 1/L for the Lipschitz bound of the log-posterior gradient.
        let mut curvature = 1.0;
        for obs in evidence {
            curvature += norm_sq(&self.coupling_row(obs.row)[..dims]) / 4.0;
            if let (Some(time), Some(_)) = (&self.time, obs.log_time) {
                let sigma = time.sigma[obs.row];
                let v = &time.couplings[obs.row * (dims + 1)..][..dims];
                curvature += norm_sq(v) / sigma.powi(2);
            }
        }
        let step = 1.0 / curvature;

        let mut gradient = vec![0.0; dims];
        for _ in 0..MAX_ITERATIONS {
            for (g, a) in gradient.iter_mut().zip(&abilities) {
                *g = -a;
            }
            for obs in evidence {
                let w = self.coupling_row(obs.row);
                let observed = f64::from(u8::from(obs.correct));
                let residual = observed - self.probability_correct(&abilities, obs.row);
                for (g, wi) in gradient.iter_mut().zip(&w[..dims]) {
                    *g += residual * wi;
                }

                if let (Some(time), Some(log_time)) = (&self.time, obs.log_time) {
                    let v = &time.couplings[obs.row * (dims + 1)..][..dims + 1];
                    let mean = dot(&v[..dims], &abilities) + v[dims];
                    let scale = (log_time - mean) / time.sigma[obs.row].powi(2);
                    for (g, vi) in gradient.iter_mut().zip(&v[..dims]) {
                        *g += scale * vi;
                    }
                }
            }

            if norm_sq(&gradient).sqrt() < TOLERANCE {
                break;
            }
            for (a, g) in abilities.iter_mut().zip(&gradient) {
                *a += step * g;
            }
        }

        abilities
    }
}

/// One usable response, resolved against the model's rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evidence {
    pub row: usize,
    pub correct: bool,
    /// `ln(time_taken)`, when the time is positive.
    pub log_time: Option<f64>,
}

/// Builds a fresh [`MirtModel`] per user from shared parameters.
#[derive(Debug, Clone)]
pub struct MirtEngine {
    theta: Arc<Theta>,
    only_live_exercises: bool,
}

impl MirtEngine {
    /// The live-exercise filter starts enabled, matching production use.
    pub fn new(theta: Theta) -> Self {
        Self {
            theta: Arc::new(theta),
            only_live_exercises: true,
        }
    }

    pub fn from_params(params: &MirtParams) -> Result<Self, MirtError> {
        Ok(Self::new(Theta::from_params(params)?))
    }

    /// Load a parameter file from disk.
    pub fn load(path: &Path) -> Result<Self, MirtError> {
        let file = load_params(path)?;
        let engine = Self::from_params(&file.params)?;
        tracing::info!(
            path = %path.display(),
            exercises = engine.theta.num_exercises(),
            abilities = engine.theta.num_abilities(),
            time_model = engine.theta.has_time_model(),
            "model loaded"
        );
        Ok(engine)
    }

    pub fn with_only_live_exercises(mut self, only_live: bool) -> Self {
        self.only_live_exercises = only_live;
        self
    }

    /// Engine configured for held-out evaluation: predictions cover the full
    /// exercise space, not the production live subset.
    pub fn for_evaluation(self) -> Self {
        self.with_only_live_exercises(false)
    }

    pub fn only_live_exercises(&self) -> bool {
        self.only_live_exercises
    }

    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    /// A model for one user.
    pub fn model(&self) -> MirtModel {
        MirtModel {
            theta: Arc::clone(&self.theta),
            only_live_exercises: self.only_live_exercises,
        }
    }
}

impl PredictorFactory for MirtEngine {
    fn name(&self) -> &str {
        "mirt"
    }

    fn reset_for_new_user(&self) -> anyhow::Result<Box<dyn AccuracyModel>> {
        Ok(Box::new(self.model()))
    }
}

/// Per-user MIRT predictor.
#[derive(Debug, Clone)]
pub struct MirtModel {
    theta: Arc<Theta>,
    only_live_exercises: bool,
}

impl MirtModel {
    fn filters_live(&self, exercise: &str) -> bool {
        self.only_live_exercises && !self.theta.is_live(exercise)
    }

    /// Resolve history items the model can use.
    pub fn evidence(&self, history: &[HistoryItem]) -> Vec<Evidence> {
        history
            .iter()
            .filter_map(|item| {
                let Some(row) = self.theta.row(&item.exercise) else {
                    tracing::debug!(
                        exercise = %item.exercise,
                        "ignoring response to unknown exercise"
                    );
                    return None;
                };
                if self.filters_live(&item.exercise) {
                    return None;
                }
                Some(Evidence {
                    row,
                    correct: item.correct,
                    log_time: (item.time_taken > 0.0).then(|| item.time_taken.ln()),
                })
            })
            .collect()
    }

    /// MAP abilities given `history`.
    pub fn abilities(&self, history: &[HistoryItem]) -> Vec<f64> {
        self.theta.estimate_abilities(&self.evidence(history))
    }

    /// Probability of answering `exercise` correctly given `history`.
    pub fn estimated_exercise_accuracy(
        &self,
        history: &[HistoryItem],
        exercise: &str,
    ) -> Result<f64, MirtError> {
        let row = self
            .theta
            .row(exercise)
            .ok_or_else(|| MirtError::UnknownExercise(exercise.to_string()))?;
        if self.filters_live(exercise) {
            return Err(MirtError::NotLive(exercise.to_string()));
        }
        let abilities = self.abilities(history);
        Ok(self.theta.probability_correct(&abilities, row))
    }
}

impl AccuracyModel for MirtModel {
    fn estimate_accuracy(&self, history: &[HistoryItem], exercise: &str) -> anyhow::Result<f64> {
        Ok(self.estimated_exercise_accuracy(history, exercise)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::Map;

    use super::*;

    fn params(theta_flat: Vec<f64>, abilities: usize, exercises: &[&str]) -> MirtParams {
        MirtParams {
            theta_flat,
            num_abilities: abilities,
            exercise_ind_dict: exercises
                .iter()
                .enumerate()
                .map(|(i, e)| (e.to_string(), i as i64))
                .collect::<BTreeMap<_, _>>(),
            live_exercises: None,
            extra: Map::new(),
        }
    }

    /// Two exercises, one ability: `easy` has bias 1, `hard` has bias -1.
    fn two_exercise_engine() -> MirtEngine {
        MirtEngine::from_params(&params(vec![1.0, 1.0, 1.5, -1.0], 1, &["easy", "hard"]))
            .unwrap()
            .for_evaluation()
    }

    fn item(exercise: &str, correct: bool) -> HistoryItem {
        HistoryItem {
            exercise: exercise.into(),
            correct,
            time_taken: 10.0,
        }
    }

    #[test]
    fn empty_history_uses_prior() {
        let model = two_exercise_engine().model();
        let p = model.estimated_exercise_accuracy(&[], "easy").unwrap();
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
        let p = model.estimated_exercise_accuracy(&[], "hard").unwrap();
        assert!((p - sigmoid(-1.0)).abs() < 1e-12);
    }

    #[test]
    fn correct_answers_raise_prediction() {
        let model = two_exercise_engine().model();
        let prior = model.estimated_exercise_accuracy(&[], "hard").unwrap();
        let good = [item("easy", true), item("easy", true), item("hard", true)];
        let bad = [item("easy", false), item("easy", false), item("hard", false)];
        let up = model.estimated_exercise_accuracy(&good, "hard").unwrap();
        let down = model.estimated_exercise_accuracy(&bad, "hard").unwrap();
        assert!(up > prior, "{up} <= {prior}");
        assert!(down < prior, "{down} >= {prior}");
        assert!((0.0..=1.0).contains(&up));
        assert!((0.0..=1.0).contains(&down));
    }

    #[test]
    fn map_estimate_has_zero_gradient() {
        let engine = two_exercise_engine();
        let theta = engine.theta();
        let history = [item("easy", true), item("hard", false), item("hard", true)];
        let evidence = engine.model().evidence(&history);
        let a = theta.estimate_abilities(&evidence);
        // d/da log posterior = -a + sum (y - p) w
        let mut gradient = -a[0];
        for obs in &evidence {
            let w = theta.coupling_row(obs.row)[0];
            let observed = f64::from(u8::from(obs.correct));
            gradient += (observed - theta.probability_correct(&a, obs.row)) * w;
        }
        assert!(gradient.abs() < 1e-5, "gradient {gradient}");
    }

    #[test]
    fn prediction_depends_only_on_history_contents() {
        let engine = two_exercise_engine();
        let history = [item("easy", true), item("hard", false)];
        let a = engine.model().estimated_exercise_accuracy(&history, "hard").unwrap();
        let b = engine.model().estimated_exercise_accuracy(&history, "hard").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_history_items_are_ignored() {
        let model = two_exercise_engine().model();
        let with_unknown = [item("mystery", true), item("easy", false)];
        let without = [item("easy", false)];
        assert_eq!(
            model.estimated_exercise_accuracy(&with_unknown, "hard").unwrap(),
            model.estimated_exercise_accuracy(&without, "hard").unwrap()
        );
    }

    #[test]
    fn unknown_target_is_an_error() {
        let model = two_exercise_engine().model();
        let err = model.estimated_exercise_accuracy(&[], "mystery").unwrap_err();
        assert!(matches!(err, MirtError::UnknownExercise(e) if e == "mystery"));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = Theta::from_params(&params(vec![1.0; 5], 1, &["a", "b"])).unwrap_err();
        assert!(matches!(
            err,
            MirtError::ShapeMismatch {
                len: 5,
                couplings: 4,
                with_time: 10,
                ..
            }
        ));
    }

    #[test]
    fn load_reads_shape_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{"params": {"theta_flat": [1.0, 0.5, 1.2, -0.5], "num_abilities": 1,
                "exercise_ind_dict": {"e1": 0, "e2": 1}}}"#,
        )
        .unwrap();
        let engine = MirtEngine::load(&path).unwrap();
        assert_eq!(engine.theta().num_exercises(), 2);
        assert_eq!(engine.theta().num_abilities(), 1);
        assert!(!engine.theta().has_time_model());
    }

    #[test]
    fn huge_ability_count_is_an_error() {
        let mut p = params(vec![], 1, &["e"]);
        p.num_abilities = usize::MAX;
        assert!(matches!(
            Theta::from_params(&p),
            Err(MirtError::InvalidShape { abilities: usize::MAX, .. })
        ));

        p.num_abilities = usize::MAX / 2;
        assert!(matches!(
            Theta::from_params(&p),
            Err(MirtError::InvalidShape { .. })
        ));
    }

    #[test]
    fn huge_row_is_an_error() {
        let mut p = params(vec![0.0; 2], 1, &["a"]);
        p.exercise_ind_dict.insert("e".into(), i64::MAX);
        assert!(Theta::from_params(&p).is_err());

        // Couplings fit; couplings plus time parameters do not.
        p.exercise_ind_dict.insert("e".into(), 1 << 62);
        assert!(Theta::from_params(&p).is_err());
    }

    #[test]
    fn negative_row_is_rejected() {
        let mut p = params(vec![0.0; 2], 1, &["a"]);
        p.exercise_ind_dict.insert("a".into(), -1);
        assert!(matches!(
            Theta::from_params(&p),
            Err(MirtError::InvalidRow { row: -1, .. })
        ));
    }

    #[test]
    fn time_model_is_detected_and_used() {
        // One exercise, one ability. Time couplings make fast answers signal
        // higher ability: mean ln(t) = -1 * a + ln(10).
        let flat = vec![1.0, 0.0, -1.0, 10f64.ln(), 0.5];
        let theta = Theta::from_params(&params(flat, 1, &["e"])).unwrap();
        assert!(theta.has_time_model());
        let engine = MirtEngine::new(theta).for_evaluation();
        let model = engine.model();

        let fast = [HistoryItem {
            exercise: "e".into(),
            correct: true,
            time_taken: 2.0,
        }];
        let slow = [HistoryItem {
            exercise: "e".into(),
            correct: true,
            time_taken: 50.0,
        }];
        let p_fast = model.estimated_exercise_accuracy(&fast, "e").unwrap();
        let p_slow = model.estimated_exercise_accuracy(&slow, "e").unwrap();
        assert!(p_fast > p_slow, "{p_fast} <= {p_slow}");
    }

    #[test]
    fn zero_time_skips_time_evidence() {
        let flat = vec![1.0, 0.0, -1.0, 0.0, 0.5];
        let engine = MirtEngine::from_params(&params(flat, 1, &["e"]))
            .unwrap()
            .for_evaluation();
        let evidence = engine.model().evidence(&[HistoryItem {
            exercise: "e".into(),
            correct: true,
            time_taken: 0.0,
        }]);
        assert_eq!(evidence[0].log_time, None);
    }

    #[test]
    fn live_filter_restricts_exercises_until_disabled() {
        let mut p = params(vec![1.0, 1.0, 1.5, -1.0], 1, &["easy", "hard"]);
        p.live_exercises = Some(vec!["easy".into()]);

        let production = MirtEngine::from_params(&p).unwrap();
        assert!(production.only_live_exercises());
        let err = production
            .model()
            .estimated_exercise_accuracy(&[], "hard")
            .unwrap_err();
        assert!(matches!(err, MirtError::NotLive(_)));
        assert!(production.model().evidence(&[item("hard", true)]).is_empty());

        let evaluation = production.for_evaluation();
        assert!(!evaluation.only_live_exercises());
        assert!(evaluation
            .model()
            .estimated_exercise_accuracy(&[item("hard", true)], "hard")
            .is_ok());
    }

    #[test]
    fn factory_hands_out_independent_models() {
        let engine = two_exercise_engine();
        let a = engine.reset_for_new_user().unwrap();
        let b = engine.reset_for_new_user().unwrap();
        let history = [item("easy", false)];
        assert_eq!(
            a.estimate_accuracy(&history, "easy").unwrap(),
            b.estimate_accuracy(&history, "easy").unwrap()
        );
        assert_eq!(engine.name(), "mirt");
    }

    #[test]
    fn multidimensional_abilities() {
        // Two abilities; exercise rows load on different dimensions.
        let flat = vec![
            2.0, 0.0, 0.0, // alg
            0.0, 2.0, 0.0, // geo
        ];
        let engine = MirtEngine::from_params(&params(flat, 2, &["alg", "geo"]))
            .unwrap()
            .for_evaluation();
        let model = engine.model();
        let history = [item("alg", true), item("alg", true), item("alg", true)];
        let abilities = model.abilities(&history);
        assert!(abilities[0] > 0.0);
        assert!(abilities[1].abs() < 1e-9);
        let p_geo = model.estimated_exercise_accuracy(&history, "geo").unwrap();
        assert!((p_geo - 0.5).abs() < 1e-9);
    }
}
