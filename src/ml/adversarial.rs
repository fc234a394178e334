// ============================================================
// Layer 5 — Adversarial Objectives
// ============================================================
// With D(x) ∈ (0, 1) and ε = 1e-12:
//
//   d_loss   = −mean( log(D(real) + ε) + log(1 − D(fake) + ε) )
//   adv_loss = −mean( log(D(fake) + ε) )
//   g_loss   = reconstruction + 1e-3 · adv_loss
//
// ε only keeps log() finite; a saturated discriminator is not
// otherwise recovered from.

use burn::prelude::*;

pub const LOG_EPS: f64 = 1e-12;

/// Weight of the adversarial term in the generator objective.
pub const ADVERSARIAL_WEIGHT: f64 = 1e-3;

pub fn discriminator_loss<B: Backend>(real: Tensor<B, 2>, fake: Tensor<B, 2>) -> Tensor<B, 1> {
    let real_term = real.add_scalar(LOG_EPS).log();
    let fake_term = fake.neg().add_scalar(1.0).add_scalar(LOG_EPS).log();
    (real_term + fake_term).mean().neg()
}

pub fn adversarial_loss<B: Backend>(fake: Tensor<B, 2>) -> Tensor<B, 1> {
    fake.add_scalar(LOG_EPS).log().mean().neg()
}

pub fn generator_objective<B: Backend>(
    reconstruction: Tensor<B, 1>,
    adversarial:    Tensor<B, 1>,
) -> Tensor<B, 1> {
    reconstruction + adversarial.mul_scalar(ADVERSARIAL_WEIGHT)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn scores(values: &[f32]) -> Tensor<TestBackend, 2> {
        Tensor::from_data(TensorData::new(values.to_vec(), [values.len(), 1]), &Default::default())
    }

    fn value(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    #[test]
    fn test_discriminator_loss_at_equilibrium() {
        // D = 0.5 everywhere → −(ln 0.5 + ln 0.5) = 2 ln 2
        let loss = value(discriminator_loss(scores(&[0.5, 0.5]), scores(&[0.5, 0.5])));
        assert!((loss - 2.0 * std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_discriminator_loss_rewards_separation() {
        let good = value(discriminator_loss(scores(&[0.9]), scores(&[0.1])));
        let bad  = value(discriminator_loss(scores(&[0.1]), scores(&[0.9])));
        assert!(good < bad);
    }

    #[test]
    fn test_epsilon_keeps_saturated_scores_finite() {
        let d_loss = value(discriminator_loss(scores(&[0.0]), scores(&[1.0])));
        let a_loss = value(adversarial_loss(scores(&[0.0])));
        assert!(d_loss.is_finite());
        assert!(a_loss.is_finite());
    }

    #[test]
    fn test_adversarial_term_is_down_weighted() {
        let device = Default::default();
        let recon  = Tensor::<TestBackend, 1>::from_floats([0.5], &device);
        let adv    = Tensor::<TestBackend, 1>::from_floats([2.0], &device);
        let total  = value(generator_objective(recon, adv));
        assert!((total - 0.502).abs() < 1e-6);
    }
}
