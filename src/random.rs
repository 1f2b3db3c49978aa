use rand::Rng;

/// Source of uniform samples in `[0, 1)`.
///
/// Every `rand::Rng` is one; tests can script exact sequences instead.
pub(crate) trait RandomSource {
    fn unit(&mut self) -> f64;

    fn between(&mut self, min: f64, max: f64) -> f64 {
        self.unit() * (max - min) + min
    }

    fn between_rounded(&mut self, (min, max): (f64, f64)) -> f64 {
        self.between(min, max).round()
    }

    fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let i = (self.unit() * items.len() as f64) as usize;
        &items[i.min(items.len() - 1)]
    }
}

impl<R: Rng> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of samples, cycling.
#[cfg(test)]
pub(crate) struct Scripted {
    samples: Vec<f64>,
    at: usize,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(samples: &[f64]) -> Self {
        Self {
            samples: samples.to_vec(),
            at: 0,
        }
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn unit(&mut self) -> f64 {
        let v = self.samples[self.at % self.samples.len()];
        self.at += 1;
        v
    }
}
