use chrono::{Duration, NaiveDate};
use demand_forecast::features::TemporalFeatures;
use demand_forecast::{
    ArtifactStore, CsvObservationStore, ExamPeriod, FileArtifactStore, ForecastConfig,
    ForecastContext, ForecastError, Forecaster, MemoryArtifactStore, ModelBundle,
    ObservationStore, Region, SalesObservation, ThresholdPolicy, TimeSlot, TrainingPipeline,
    Weather,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const TEA: [u32; 10] = [40, 42, 38, 45, 50, 120, 130, 125, 128, 132];

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn context() -> ForecastContext {
    ForecastContext::new(
        Weather::Sunny,
        ExamPeriod::Midterms,
        Region::Urban,
        TimeSlot::Afternoon,
    )
}

fn daily(item: &str, quantities: &[u32]) -> Vec<SalesObservation> {
    quantities
        .iter()
        .enumerate()
        .map(|(i, qty)| {
            SalesObservation::new("canteen-1", item, *qty, start() + Duration::days(i as i64))
                .with_context(&context())
        })
        .collect()
}

fn small_config() -> ForecastConfig {
    let mut config = ForecastConfig::default();
    config.training.cv_splits = 3;
    config.training.forest.n_trees = 20;
    config.training.boosting.n_estimators = 60;
    config
}

fn mixed_history() -> Vec<SalesObservation> {
    let mut history = daily("Tea", &TEA);
    history.extend(daily("Coffee", &[80, 85, 90, 88, 95, 99, 101, 97, 104, 110]));
    history.extend(daily("Samosa", &[30, 28, 35, 31, 29, 33, 30, 27, 26, 25]));
    history
}

#[test]
fn test_tea_forecast_follows_the_shift() {
    let history = daily("Tea", &TEA);
    let (bundle, report) = TrainingPipeline::new(ForecastConfig::default())
        .unwrap()
        .train(&history)
        .unwrap();
    assert_eq!(report.rows, 10);
    assert_eq!(report.folds.len(), 5);

    let forecaster = Forecaster::new(bundle, ThresholdPolicy::default()).unwrap();
    let batch = forecaster.forecast(&history, &context()).unwrap();

    assert_eq!(batch.target_date, start() + Duration::days(10));
    assert_eq!(batch.results.len(), 1);
    let tea = &batch.results[0];
    assert_eq!(tea.item, "Tea");
    assert!(
        tea.predicted_quantity > 38 && tea.predicted_quantity < 132,
        "predicted {}",
        tea.predicted_quantity
    );
    assert_eq!(batch.unknown_categories, 0);
}

#[test]
fn test_reloaded_bundle_predicts_identically() {
    let history = mixed_history();
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&history)
        .unwrap();

    let dir = tempdir().unwrap();
    let store = FileArtifactStore::new(dir.path());
    store.save_bundle("canteen-1", &bundle).unwrap();
    let reloaded = store.load_bundle("canteen-1").unwrap();
    assert_eq!(reloaded, bundle);

    let fresh = Forecaster::new(bundle, ThresholdPolicy::default()).unwrap();
    let loaded = Forecaster::new(reloaded, ThresholdPolicy::default()).unwrap();

    let target = start() + Duration::days(10);
    let (features, _) = fresh.feature_vector("Coffee", &[80.0, 85.0, 90.0], &context(), target);
    let row = features.to_row();
    let a = fresh.bundle().ensemble.predict(&row).unwrap();
    let b = loaded.bundle().ensemble.predict(&row).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());

    assert_eq!(
        fresh.forecast(&history, &context()).unwrap(),
        loaded.forecast(&history, &context()).unwrap()
    );
}

#[test]
fn test_memory_artifact_store_round_trip() {
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&mixed_history())
        .unwrap();
    let store = MemoryArtifactStore::new();
    store.save_bundle("latest", &bundle).unwrap();
    assert_eq!(store.load_bundle("latest").unwrap(), bundle);
    assert!(matches!(
        store.load_bundle("missing"),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_new_item_with_no_history() {
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&mixed_history())
        .unwrap();
    let forecaster = Forecaster::new(bundle, ThresholdPolicy::default()).unwrap();
    let target = start() + Duration::days(10);

    let (features, fallbacks) = forecaster.feature_vector("Paneer Roll", &[], &context(), target);
    assert_eq!(fallbacks, 1);
    assert_eq!(
        features.temporal,
        TemporalFeatures {
            day_of_week: features.temporal.day_of_week,
            week_of_year: features.temporal.week_of_year,
            ..TemporalFeatures::default()
        }
    );

    let result = forecaster
        .predict_item("Paneer Roll", &[], &context(), target)
        .unwrap();
    assert_eq!(result.item, "Paneer Roll");
    assert_eq!(result.trend, demand_forecast::Trend::Stable);
}

#[test]
fn test_unseen_context_uses_fallback() {
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&mixed_history())
        .unwrap();
    let forecaster = Forecaster::new(bundle, ThresholdPolicy::default()).unwrap();
    let history = mixed_history();

    // Training only saw Sunny, Urban and Afternoon
    let unseen = ForecastContext::new(
        Weather::Rainy,
        ExamPeriod::Midterms,
        Region::Rural,
        TimeSlot::Night,
    );
    let batch = forecaster.forecast(&history, &unseen).unwrap();
    assert_eq!(batch.results.len(), 3);
    assert!(batch.skipped.is_empty());
    assert_eq!(batch.unknown_categories, 3 * 3);

    // The fallback is the first known class, which here is the only one
    assert_eq!(
        batch,
        forecaster.forecast(&history, &context()).map(|mut b| {
            b.unknown_categories = 9;
            b
        })
        .unwrap()
    );
}

#[test]
fn test_schema_mismatch_is_refused() {
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&mixed_history())
        .unwrap();

    let mut reordered: ModelBundle = bundle.clone();
    reordered.schema.fields.swap(7, 8);
    reordered.schema_signature = reordered.schema.signature();

    let err = Forecaster::new(reordered.clone(), ThresholdPolicy::default()).unwrap_err();
    assert!(matches!(err, ForecastError::SchemaMismatch { .. }));

    let bytes = reordered.to_bytes().unwrap();
    assert!(matches!(
        ModelBundle::from_bytes(&bytes),
        Err(ForecastError::SchemaMismatch { .. })
    ));

    let mut forged = bundle;
    forged.schema_signature = "00000000".to_string();
    assert!(matches!(
        forged.verify(),
        Err(ForecastError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_corrupt_bundle_bytes() {
    assert!(matches!(
        ModelBundle::from_bytes(&[1, 2, 3]),
        Err(ForecastError::SerializationError(_))
    ));
}

#[test]
fn test_csv_train_and_forecast_workflow() {
    let dir = tempdir().unwrap();
    let mut store = CsvObservationStore::new(dir.path().join("sales.csv"));
    let inserted = store.insert_observations(&mixed_history()).unwrap();
    assert_eq!(inserted, 30);

    let other_owner = SalesObservation::new("canteen-2", "Tea", 999, start());
    store.insert_observations(&[other_owner]).unwrap();

    let pipeline = TrainingPipeline::new(small_config()).unwrap();
    let (bundle, report) = pipeline.train_from_store(&store, "canteen-1").unwrap();
    assert_eq!(report.rows, 30);
    assert_eq!(report.items, 3);

    let forecaster = Forecaster::new(bundle, ThresholdPolicy::absolute()).unwrap();
    let batch = forecaster
        .forecast_for_owner(&store, "canteen-1", &context())
        .unwrap();

    assert_eq!(batch.results.len(), 3);
    for pair in batch.results.windows(2) {
        assert!(pair[0].predicted_quantity >= pair[1].predicted_quantity);
    }
    for result in &batch.results {
        assert_eq!(result.tier, ThresholdPolicy::absolute().tier(result.predicted_quantity));
        assert_eq!(result.recommendation, result.tier.recommendation());
    }
    let samosa = batch.get("Samosa").unwrap();
    assert_eq!(samosa.trend, demand_forecast::Trend::Decreasing);

    let summary = batch.summary().unwrap();
    assert_eq!(summary.highest_item, batch.results[0].item);
    assert_eq!(batch.top(1).len(), 1);
}

#[test]
fn test_forecast_requires_history() {
    let (bundle, _) = TrainingPipeline::new(small_config())
        .unwrap()
        .train(&mixed_history())
        .unwrap();
    let forecaster = Forecaster::new(bundle, ThresholdPolicy::default()).unwrap();
    assert!(matches!(
        forecaster.forecast(&[], &context()),
        Err(ForecastError::DataError(_))
    ));
}
