use std::f32::consts::TAU;

use super::frame::StereoFrame;

pub const MIN_CUTOFF_HZ: f32 = 40.0;
pub const MIN_Q: f32 = 0.0001;
pub const MAX_Q: f32 = 20.0;

pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

// master volume
pub struct Gain {
    gain: f32,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self { gain: gain.clamp(0.0, 1.0) }
    }

    pub fn set(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }
}

impl Effect for Gain {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            *f = f.scaled(self.gain);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    fn run(&mut self, c: &Coefficients, x: f32) -> f32 {
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

#[derive(Clone, Copy, Debug)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

/// Resonant two-pole low-pass (RBJ cookbook biquad).
pub struct LowPass {
    sample_rate: f32,
    cutoff: f32,
    q: f32,
    coeffs: Coefficients,
    left: BiquadState,
    right: BiquadState,
}

impl LowPass {
    pub fn new(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: 0.0,
            q: 0.0,
            coeffs: Coefficients { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 },
            left: BiquadState::default(),
            right: BiquadState::default(),
        };
        filter.set_params(cutoff, q);
        filter
    }

    #[cfg(test)]
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    #[cfg(test)]
    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn set_params(&mut self, cutoff: f32, q: f32) {
        let nyquist = self.sample_rate * 0.5;
        self.cutoff = cutoff.clamp(MIN_CUTOFF_HZ.min(nyquist * 0.5), nyquist * 0.999);
        self.q = q.clamp(MIN_Q, MAX_Q);

        let w0 = TAU * self.cutoff / self.sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * self.q);
        let a0 = 1.0 + alpha;
        self.coeffs = Coefficients {
            b0: (1.0 - cos) * 0.5 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) * 0.5 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        };
    }

    pub fn reset(&mut self) {
        self.left = BiquadState::default();
        self.right = BiquadState::default();
    }
}

impl Effect for LowPass {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let c = self.coeffs;
        for f in buf.iter_mut() {
            f.left = self.left.run(&c, f.left);
            f.right = self.right.run(&c, f.right);
        }
    }
}
