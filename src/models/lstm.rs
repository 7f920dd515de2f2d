//! Pretrained LSTM regressor for temporal health.
//!
//! Single recurrent layer over a single-channel window followed by a dense
//! unit. Gate blocks are laid out input, forget, cell, output:
//!
//! ```text
//! z   = x_t * W + h_{t-1} * U + b          (4 * units)
//! i   = sigmoid(z_i)    f = sigmoid(z_f)
//! g   = tanh(z_c)       o = sigmoid(z_o)
//! c_t = f * c_{t-1} + i * g
//! h_t = o * tanh(c_t)
//! y   = dense_kernel . h_T + dense_bias
//! ```
//!
//! State starts at zero for every window, so windows are independent and are
//! evaluated in parallel.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::TemporalHealthModel;
use crate::error::InferenceError;

const MODEL_NAME: &str = "temporal health lstm";

/// LSTM + dense weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmRegressor {
    /// Window length the network was trained on.
    pub seq_len: usize,
    /// Hidden units.
    pub units: usize,
    /// Input kernel `[4 * units]`.
    pub kernel: Vec<f64>,
    /// Recurrent kernel, row-major `[units x 4 * units]`.
    pub recurrent_kernel: Vec<f64>,
    /// Gate bias `[4 * units]`.
    pub bias: Vec<f64>,
    /// Dense head `[units]`.
    pub dense_kernel: Vec<f64>,
    pub dense_bias: f64,
}

impl LstmRegressor {
    /// Glorot-uniform weights with unit forget bias, seeded for reproducible
    /// fixtures.
    pub fn init(seq_len: usize, units: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let gates = 4 * units;

        #[allow(clippy::cast_precision_loss)]
        let mut uniform = |fan_in: usize, fan_out: usize, len: usize| -> Vec<f64> {
            let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
            (0..len)
                .map(|_| rng.gen::<f64>() * 2.0 * limit - limit)
                .collect()
        };

        let kernel = uniform(1, gates, gates);
        let recurrent_kernel = uniform(units, gates, units * gates);
        let dense_kernel = uniform(units, 1, units);

        let mut bias = vec![0.0; gates];
        bias[units..2 * units].fill(1.0);

        Self {
            seq_len,
            units,
            kernel,
            recurrent_kernel,
            bias,
            dense_kernel,
            dense_bias: 0.0,
        }
    }

    /// Check weight shapes against `units`.
    pub fn validate(&self) -> Result<(), String> {
        if self.seq_len == 0 {
            return Err("seq_len must be > 0".to_string());
        }
        if self.units == 0 {
            return Err("units must be > 0".to_string());
        }
        let gates = 4 * self.units;
        let shapes = [
            ("kernel", self.kernel.len(), gates),
            ("recurrent_kernel", self.recurrent_kernel.len(), self.units * gates),
            ("bias", self.bias.len(), gates),
            ("dense_kernel", self.dense_kernel.len(), self.units),
        ];
        for (name, found, expected) in shapes {
            if found != expected {
                return Err(format!(
                    "{name} has {found} weights, expected {expected} for {} units",
                    self.units
                ));
            }
        }
        let all_finite = self
            .kernel
            .iter()
            .chain(&self.recurrent_kernel)
            .chain(&self.bias)
            .chain(&self.dense_kernel)
            .chain(std::iter::once(&self.dense_bias))
            .all(|w| w.is_finite());
        if !all_finite {
            return Err("weights must be finite".to_string());
        }
        Ok(())
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.kernel.len()
            + self.recurrent_kernel.len()
            + self.bias.len()
            + self.dense_kernel.len()
            + 1
    }

    /// Run one window through the network from a zero state.
    fn forward(&self, window: &[f64]) -> f64 {
        let u = self.units;
        let gates = 4 * u;
        let mut h = vec![0.0; u];
        let mut c = vec![0.0; u];
        let mut z = vec![0.0; gates];

        for &x in window {
            for k in 0..gates {
                z[k] = x * self.kernel[k] + self.bias[k];
            }
            for (r, &h_r) in h.iter().enumerate() {
                let row = &self.recurrent_kernel[r * gates..(r + 1) * gates];
                for (z_k, w) in z.iter_mut().zip(row) {
                    *z_k += h_r * w;
                }
            }
            for j in 0..u {
                let i_gate = sigmoid(z[j]);
                let f_gate = sigmoid(z[u + j]);
                let g_gate = z[2 * u + j].tanh();
                let o_gate = sigmoid(z[3 * u + j]);
                c[j] = f_gate * c[j] + i_gate * g_gate;
                h[j] = o_gate * c[j].tanh();
            }
        }

        self.dense_bias
            + self
                .dense_kernel
                .iter()
                .zip(&h)
                .map(|(w, h_j)| w * h_j)
                .sum::<f64>()
    }
}

impl TemporalHealthModel for LstmRegressor {
    fn window_len(&self) -> usize {
        self.seq_len
    }

    fn predict(&self, windows: &[&[f64]]) -> Result<Vec<f64>, InferenceError> {
        if let Some(w) = windows.iter().find(|w| w.len() != self.seq_len) {
            return Err(InferenceError::WindowLength {
                model: MODEL_NAME,
                expected: self.seq_len,
                found: w.len(),
            });
        }

        let preds: Vec<f64> = windows.par_iter().map(|w| self.forward(w)).collect();

        if let Some(index) = preds.iter().position(|p| !p.is_finite()) {
            return Err(InferenceError::NonFinite {
                model: MODEL_NAME,
                index,
            });
        }
        Ok(preds)
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
