use approx::assert_relative_eq;
use demand_math::metrics::{mean_absolute_error, RegressionScore};
use demand_math::validation::{feasible_splits, forward_chaining_splits};
use demand_math::{
    BoostingParams, ForestParams, GradientBoosting, MathError, RandomForest, RegressionTree,
    Regressor, TreeParams,
};

// y = 3 * x0 with an irrelevant second column
fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
    let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
    let y: Vec<f64> = x.iter().map(|row| 3.0 * row[0]).collect();
    (x, y)
}

#[test]
fn test_tree_respects_min_samples_leaf() {
    let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
    let y: Vec<f64> = (0..10).map(|i| i as f64).collect();

    let params = TreeParams {
        max_depth: 8,
        min_samples_split: 2,
        min_samples_leaf: 5,
    };
    let tree = RegressionTree::fit(params, &x, &y).unwrap();
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.node_count(), 3);
    assert_relative_eq!(tree.predict(&[0.0]).unwrap(), 2.0);
    assert_relative_eq!(tree.predict(&[9.0]).unwrap(), 7.0);
}

#[test]
fn test_forest_and_boosting_learn_linear_signal() {
    let (x, y) = linear_data();

    let forest = RandomForest::fit(
        ForestParams {
            n_trees: 30,
            min_samples_leaf: 1,
            ..ForestParams::default()
        },
        &x,
        &y,
    )
    .unwrap();
    let boosting = GradientBoosting::fit(BoostingParams::default(), &x, &y).unwrap();

    let forest_mae = mean_absolute_error(&y, &forest.predict_many(&x).unwrap()).unwrap();
    let boosting_mae = mean_absolute_error(&y, &boosting.predict_many(&x).unwrap()).unwrap();
    assert!(forest_mae < 10.0, "forest MAE {}", forest_mae);
    assert!(boosting_mae < 5.0, "boosting MAE {}", boosting_mae);

    let importances = forest.feature_importances();
    assert!(importances[0] > importances[1]);
    assert_relative_eq!(importances.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_models_reject_wrong_width() {
    let (x, y) = linear_data();
    let tree = RegressionTree::fit(TreeParams::default(), &x, &y).unwrap();
    assert!(matches!(
        tree.predict(&[1.0]),
        Err(MathError::InvalidInput(_))
    ));
}

#[test]
fn test_cross_validated_scores() {
    let (x, y) = linear_data();
    let n_splits = feasible_splits(x.len(), 5);
    let folds = forward_chaining_splits(x.len(), n_splits).unwrap();

    let scores: Vec<RegressionScore> = folds
        .iter()
        .map(|fold| {
            let model = GradientBoosting::fit(
                BoostingParams::default(),
                &x[fold.train.clone()],
                &y[fold.train.clone()],
            )
            .unwrap();
            let predicted = model.predict_many(&x[fold.test.clone()]).unwrap();
            RegressionScore::evaluate(&y[fold.test.clone()], &predicted).unwrap()
        })
        .collect();

    assert_eq!(scores.len(), 5);
    // Trees cannot extrapolate, so later folds score worse than a perfect fit
    let mean = RegressionScore::mean(&scores).unwrap();
    assert!(mean.mae > 0.0);
    assert!(mean.r2 <= 1.0);
}
