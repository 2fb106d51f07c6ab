//! Calibration against synthetic and observed call prices.

mod common;

use hestonlib::calibration::{CalibrationOutcome, CalibrationSettings, Calibrator};
use hestonlib::core::Error;
use hestonlib::models::HestonModel;
use hestonlib::pricingengines::{AnalyticHestonEngine, HestonIntegration};

fn quadrature() -> HestonIntegration {
    HestonIntegration::default()
        .with_bounds(1e-8, 80.0)
        .with_intervals(800)
}

#[test]
fn recovers_known_parameters_from_synthetic_quotes() {
    common::init_tracing();
    let truth = HestonModel::from_params(0.05, 100.0, 2.0, 0.06, 0.4, -0.5, 0.04).unwrap();
    let engine = AnalyticHestonEngine::new(truth).with_integration(quadrature());

    let mut calibrator = Calibrator::new(0.05, 100.0, CalibrationSettings::default())
        .unwrap()
        .with_integration(quadrature());
    for maturity in [0.5, 1.0, 2.0] {
        for strike in [80.0, 90.0, 100.0, 110.0, 120.0] {
            let price = engine.call_price(strike, maturity).unwrap();
            calibrator.add_observed_option(strike, maturity, price).unwrap();
        }
    }
    calibrator.set_guess(2.2, 0.055, 0.42, -0.45, 0.042).unwrap();

    let report = calibrator.calibrate().unwrap();
    assert_eq!(report.outcome, CalibrationOutcome::FinishedOk);
    assert!(report.pricing_error < 1e-6, "sse {}", report.pricing_error);

    let fitted = calibrator.calibrated_model().unwrap();
    assert_eq!(fitted, report.model);
    for (name, (fit, want)) in ["kappa", "theta", "sigma", "rho", "v0"]
        .iter()
        .zip(fitted.param_array().into_iter().zip(truth.param_array()))
    {
        assert!((fit - want).abs() < 1e-3, "{name}: fitted {fit}, true {want}");
    }

    let (outcome, error) = calibrator.status().unwrap();
    assert_eq!(outcome, CalibrationOutcome::FinishedOk);
    assert_eq!(error, report.pricing_error);
}

#[test]
fn fits_observed_market_quotes() {
    common::init_tracing();
    let mut calibrator = Calibrator::new(0.025, 100.0, CalibrationSettings::default())
        .unwrap()
        .with_integration(quadrature());
    for (strike, maturity, price) in [
        (80.0, 1.0, 25.72),
        (90.0, 1.0, 18.93),
        (80.0, 2.0, 30.49),
        (100.0, 2.0, 19.36),
        (100.0, 1.5, 16.58),
    ] {
        calibrator.add_observed_option(strike, maturity, price).unwrap();
    }
    calibrator.set_guess(1.5768, 0.0398, 0.5751, -0.5711, 0.0175).unwrap();
    let guess = calibrator.calibrated_model().unwrap();
    let initial_error = calibrator.pricing_error(&guess).unwrap();

    match calibrator.calibrate() {
        Ok(report) => {
            assert_ne!(report.outcome, CalibrationOutcome::FailedOther);
            assert!(report.pricing_error <= initial_error);
            assert_eq!(calibrator.status().unwrap(), (report.outcome, report.pricing_error));
        }
        Err(Error::CalibrationFailed(_)) => {
            assert_eq!(calibrator.outcome(), CalibrationOutcome::FailedOther);
            assert_eq!(calibrator.calibrated_model().unwrap(), guess);
        }
        Err(e) => panic!("unexpected error {e}"),
    }
}

#[test]
fn calibrated_model_prices_like_the_report() {
    common::init_tracing();
    let truth = HestonModel::from_params(0.03, 50.0, 1.5, 0.05, 0.3, -0.7, 0.05).unwrap();
    let engine = AnalyticHestonEngine::new(truth).with_integration(quadrature());

    let settings = CalibrationSettings::default().with_max_iterations(25);
    let mut calibrator = Calibrator::new(0.03, 50.0, settings)
        .unwrap()
        .with_integration(quadrature());
    for (strike, maturity) in [(45.0, 1.0), (50.0, 1.0), (55.0, 1.0), (50.0, 2.0)] {
        let price = engine.call_price(strike, maturity).unwrap();
        calibrator.add_observed_option(strike, maturity, price).unwrap();
    }
    calibrator.set_guess(1.2, 0.06, 0.35, -0.6, 0.045).unwrap();

    let report = calibrator.calibrate().unwrap();
    assert!(matches!(
        report.outcome,
        CalibrationOutcome::FinishedOk | CalibrationOutcome::FailedMaxIterations
    ));
    let fitted = AnalyticHestonEngine::new(report.model).with_integration(quadrature());
    let recomputed: f64 = calibrator
        .quotes()
        .iter()
        .map(|q| (fitted.call_price(q.strike(), q.maturity()).unwrap() - q.price()).powi(2))
        .sum();
    assert!((recomputed - report.pricing_error).abs() < 1e-10);
}
