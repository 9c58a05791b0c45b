use std::f64::consts::PI;

/// Probabilities of the hidden Markov model of Newson & Krumm,
/// "Hidden Markov Map Matching Through Noise and Sparseness" (2009)
#[derive(Debug, Clone, Copy)]
pub struct HmmProbabilities {
    sigma_z: f64,
    beta: f64,
}

impl HmmProbabilities {
    /// `sigma_z`: standard deviation of the GPS noise in meters.
    /// `beta`: scale of the exponential distribution of route deviations.
    pub fn new(sigma_z: f64, beta: f64) -> Self {
        HmmProbabilities { sigma_z, beta }
    }

    /// Log of the Gaussian density of observing a point `distance` meters away from its candidate
    pub fn emission_log_probability(&self, distance: f64) -> f64 {
        let normalized = distance / self.sigma_z;
        -(2.0 * PI).sqrt().ln() - self.sigma_z.ln() - 0.5 * normalized * normalized
    }

    /// Log of the exponential density of the route length deviating from the straight
    /// line between two observations. The deviation is relative to the straight line, so
    /// `beta` holds for sparse and dense traces alike.
    pub fn transition_log_probability(&self, route_length: f64, linear_distance: f64) -> f64 {
        let deviation = (route_length - linear_distance).abs() / linear_distance.max(1.0);
        (1.0 / self.beta).ln() - deviation / self.beta
    }
}
