use approx::assert_abs_diff_eq;
use montecarlo_rs::analyze;
use montecarlo_rs::calibrate;
use montecarlo_rs::config::CalibrationConfig;
use montecarlo_rs::config::EngineConfig;
use montecarlo_rs::rng::SeededRng;
use montecarlo_rs::rng::Stream;
use montecarlo_rs::simulate;
use montecarlo_rs::stats::drawdown::max_drawdown;
use montecarlo_rs::stochastic::model::DiffusionParams;
use montecarlo_rs::stochastic::model::JumpParams;
use montecarlo_rs::stochastic::model::RegimeParams;
use montecarlo_rs::HistoricalSeries;
use montecarlo_rs::ModelParameters;
use montecarlo_rs::ModelType;
use montecarlo_rs::PathEnsemble;
use montecarlo_rs::SimulationEngine;
use montecarlo_rs::SimulationRequest;
use rand_distr::Distribution;
use rand_distr::Poisson;
use rand_distr::StandardNormal;

const DT: f64 = 1.0 / 252.0;

fn diffusion(mu: f64, sigma: f64) -> ModelParameters {
  ModelParameters::Diffusion(DiffusionParams::new(mu, sigma))
}

fn run(model: ModelType, params: &ModelParameters, paths: usize, steps: usize, seed: u64) -> PathEnsemble {
  simulate(model, params, paths, steps, DT, 100.0, seed)
    .unwrap()
    .ensemble
}

#[test]
fn mean_log_return_converges_to_gbm_drift() {
  let (mu, sigma, steps, paths) = (0.1, 0.3, 50, 20_000);
  let ensemble = run(ModelType::Diffusion, &diffusion(mu, sigma), paths, steps, 2024);

  let log_returns: Vec<f64> = ensemble
    .final_prices()
    .iter()
    .map(|p| (p / 100.0).ln())
    .collect();
  let mean = log_returns.iter().sum::<f64>() / paths as f64;
  let horizon = steps as f64 * DT;
  let expected = (mu - 0.5 * sigma * sigma) * horizon;
  let std_err = sigma * horizon.sqrt() / (paths as f64).sqrt();

  assert!(
    (mean - expected).abs() < 5.0 * std_err,
    "mean {mean}, expected {expected} +- {}",
    5.0 * std_err
  );
}

#[test]
fn zero_intensity_jump_model_equals_diffusion() {
  let d = DiffusionParams::new(0.07, 0.22);
  let jump = ModelParameters::Jump {
    diffusion: d,
    jump: JumpParams::new(0.0, -0.1, 0.2),
  };

  let a = run(ModelType::Jump, &jump, 300, 60, 5);
  let b = run(ModelType::Diffusion, &ModelParameters::Diffusion(d), 300, 60, 5);
  assert_eq!(a, b);
}

#[test]
fn static_regimes_with_equal_parameters_equal_jump_model() {
  let d = DiffusionParams::new(0.04, 0.18);
  let jump = JumpParams::new(25.0, -0.04, 0.03);
  let regime = ModelParameters::RegimeCombined(RegimeParams::new(
    d,
    d,
    [[1.0, 0.0], [0.0, 1.0]],
    [0.5, 0.5],
    jump,
  ));

  let a = run(ModelType::RegimeCombined, &regime, 300, 60, 11);
  let b = run(
    ModelType::Jump,
    &ModelParameters::Jump { diffusion: d, jump },
    300,
    60,
    11,
  );
  assert_eq!(a, b);
}

#[test]
fn calibration_is_idempotent() {
  let prices: Vec<f64> = (0..400)
    .map(|i| 100.0 * (1.0 + 0.1 * (i as f64 * 0.37).sin()) * (1.0 + 0.0005 * i as f64))
    .collect();
  let series = HistoricalSeries::from_prices(&prices).unwrap();
  let config = CalibrationConfig::default();

  for model in ModelType::ALL {
    let first = calibrate(&series, model, &config).unwrap();
    let second = calibrate(&series, model, &config).unwrap();
    assert_eq!(first.to_flat_map(), second.to_flat_map());
    assert_eq!(first, second);
  }
}

#[test]
fn var_is_monotone_and_drawdown_bounded() {
  let params = ModelParameters::Jump {
    diffusion: DiffusionParams::new(0.05, 0.35),
    jump: JumpParams::new(8.0, -0.05, 0.1),
  };
  let ensemble = run(ModelType::Jump, &params, 5_000, 126, 3);
  let stats = analyze(&ensemble, 100.0, 0.02).unwrap();

  assert!(stats.var(0.99).unwrap() >= stats.var(0.95).unwrap());
  assert!(stats.cvar(0.95).unwrap() >= stats.var(0.95).unwrap());
  for i in 0..ensemble.paths() {
    let mdd = max_drawdown(ensemble.path(i));
    assert!((0.0..=1.0).contains(&mdd));
  }
  assert!((0.0..=1.0).contains(&stats.max_drawdown_worst));
}

#[test]
fn flat_history_gives_flat_paths() {
  let series = HistoricalSeries::from_prices(&[100.0; 252]).unwrap();
  let params = calibrate(&series, ModelType::Diffusion, &CalibrationConfig::default()).unwrap();
  assert_eq!(params, diffusion(0.0, 0.0));

  let ensemble = run(ModelType::Diffusion, &params, 17, 33, 99);
  assert!(ensemble.view().iter().all(|&p| p == 100.0));

  let stats = analyze(&ensemble, 100.0, 0.0).unwrap();
  assert_eq!(stats.mean_return, 0.0);
  assert_eq!(stats.std_return, 0.0);
  assert!(stats.sharpe_ratio.is_nan());
}

#[test]
fn single_path_single_step_without_noise_is_exact() {
  let out = simulate(ModelType::Diffusion, &diffusion(0.0, 0.0), 1, 1, 1.0, 250.0, 1234).unwrap();
  assert_eq!(out.ensemble.final_prices()[0], 250.0);
}

#[test]
fn certain_jumps_follow_the_seeded_poisson_draws() {
  let seed = 77;
  let (paths, steps) = (3, 15);
  let lambda = 1000.0;
  let unit_jumps = ModelParameters::Jump {
    diffusion: DiffusionParams::new(0.0, 0.0),
    jump: JumpParams::new(lambda, 1.0, 0.0),
  };
  let out = simulate(ModelType::Jump, &unit_jumps, paths, steps, DT, 1.0, seed).unwrap();

  let poisson = Poisson::new(lambda * DT).unwrap();
  let mut total = 0u64;
  for i in 0..paths {
    let mut rng = SeededRng::for_stream(seed, i, Stream::Jump);
    let mut expected = 1.0f64;
    for t in 1..=steps {
      let count: f64 = poisson.sample(&mut rng);
      for _ in 0..count as u64 {
        let _: f64 = StandardNormal.sample(&mut rng);
      }
      total += count as u64;
      expected *= count.exp();
      let got = out.ensemble.path(i)[t];
      assert_abs_diff_eq!(got / expected, 1.0, epsilon = 1e-9);
    }
  }
  assert_eq!(out.diagnostics.jump_events, total);

  // zero-mean, zero-dispersion jumps leave the price untouched
  let null_jumps = ModelParameters::Jump {
    diffusion: DiffusionParams::new(0.0, 0.0),
    jump: JumpParams::new(lambda, 0.0, 0.0),
  };
  let flat = simulate(ModelType::Jump, &null_jumps, paths, steps, DT, 1.0, seed).unwrap();
  assert!(flat.ensemble.view().iter().all(|&p| p == 1.0));
  assert_eq!(flat.diagnostics.jump_events, total);
}

#[test]
fn engine_runs_every_model_from_history() {
  let prices: Vec<f64> = (0..300)
    .map(|i| 50.0 * (0.0004 * i as f64 + 0.03 * (i as f64 * 0.9).sin()).exp())
    .collect();
  let history = HistoricalSeries::from_prices(&prices).unwrap();
  let engine = SimulationEngine::new(EngineConfig {
    record_regimes: true,
    ..Default::default()
  })
  .unwrap();

  for model in ModelType::ALL {
    let request = SimulationRequest::new(model, 500, 21, 8, None, None, None, None);
    let outcome = engine.run(&request, Some(&history)).unwrap();

    assert_eq!(outcome.initial_price, prices[299]);
    assert_eq!(outcome.ensemble.steps(), 21);
    assert_eq!(
      outcome.diagnostics.regimes.is_some(),
      model == ModelType::RegimeCombined
    );
    let json = serde_json::to_string(&outcome.statistics).unwrap();
    assert!(json.contains("\"var\""));
  }
}
