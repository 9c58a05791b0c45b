#[derive(Debug, Clone, Copy)]
struct ViterbiState {
    score: f64,
    back_pointer: Option<usize>,
}

/// Viterbi decoder over log probabilities, one layer of candidate states per observation
#[derive(Debug, Default)]
pub struct Viterbi {
    layers: Vec<Vec<ViterbiState>>,
}

impl Viterbi {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Drops any previous sequence and starts a new one
    pub fn start(&mut self, emissions: &[f64]) {
        self.layers.clear();
        self.layers.push(
            emissions
                .iter()
                .map(|&score| ViterbiState {
                    score,
                    back_pointer: None,
                })
                .collect(),
        );
    }

    /// Adds a layer. `transition(from, to)` is `NEG_INFINITY` for impossible transitions.
    /// Returns false, leaving the sequence unchanged, when no state of the new layer can
    /// be reached.
    pub fn next_step(&mut self, emissions: &[f64], transition: impl Fn(usize, usize) -> f64) -> bool {
        let Some(previous) = self.layers.last() else {
            self.start(emissions);
            return true;
        };

        let layer: Vec<ViterbiState> = emissions
            .iter()
            .enumerate()
            .map(|(to, &emission)| {
                let mut best = ViterbiState {
                    score: f64::NEG_INFINITY,
                    back_pointer: None,
                };

                for (from, state) in previous.iter().enumerate() {
                    let score = state.score + transition(from, to);
                    if score > best.score {
                        best = ViterbiState {
                            score,
                            back_pointer: Some(from),
                        };
                    }
                }

                best.score += emission;
                best
            })
            .collect();

        if layer.iter().all(|state| state.back_pointer.is_none()) {
            return false;
        }

        self.layers.push(layer);
        true
    }

    /// Index of the chosen state in every layer
    pub fn most_likely_sequence(&self) -> Vec<usize> {
        let Some(last) = self.layers.last() else {
            return Vec::new();
        };

        let mut current = last
            .iter()
            .enumerate()
            .filter(|(_, state)| state.score.is_finite())
            .max_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
            .map(|(index, _)| index)
            .unwrap_or_default();

        let mut sequence = vec![current; self.layers.len()];
        for (position, layer) in self.layers.iter().enumerate().rev() {
            sequence[position] = current;
            if let Some(previous) = layer[current].back_pointer {
                current = previous;
            }
        }

        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_override_emissions() {
        let mut viterbi = Viterbi::new();
        viterbi.start(&[-1.0, -2.0]);

        // State 0 cannot reach the next layer, so the first step must pick state 1
        assert!(viterbi.next_step(&[-1.0], |from, _| if from == 0 { f64::NEG_INFINITY } else { -1.0 }));
        assert!(viterbi.next_step(&[-3.0, -0.5], |_, to| if to == 0 { -0.1 } else { -5.0 }));

        assert_eq!(viterbi.len(), 3);
        assert_eq!(viterbi.most_likely_sequence(), vec![1, 0, 0]);
    }

    #[test]
    fn broken_sequence_is_left_unchanged() {
        let mut viterbi = Viterbi::new();
        viterbi.start(&[-1.0, -2.0]);

        assert!(!viterbi.next_step(&[-1.0, -1.0], |_, _| f64::NEG_INFINITY));
        assert_eq!(viterbi.len(), 1);
        assert_eq!(viterbi.most_likely_sequence(), vec![0]);
    }
}
