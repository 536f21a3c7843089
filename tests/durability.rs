//! Integration tests for durability-constrained writes.

mod support;

use bucketmap::{
    BucketConfig, BucketOperations, BucketTemplate, DataAccessError, PersistTo, ReplicateTo,
};
use support::beer::{beer_bucket_with, sample_beers, Beer};

fn single_node() -> BucketConfig {
    BucketConfig {
        name: "beers".into(),
        nodes: 1,
        replicas: 0,
    }
}

fn three_nodes() -> BucketConfig {
    BucketConfig {
        name: "beers".into(),
        nodes: 3,
        replicas: 2,
    }
}

#[test]
fn constrained_write_fails_on_small_topology() {
    let template = BucketTemplate::over(beer_bucket_with(single_node()));
    let beer = Beer::new("beer-1", "Pale Ale", "Mikkeller", 5.2);

    let err = template
        .save_with(&beer, PersistTo::Two, ReplicateTo::None)
        .unwrap_err();
    assert!(matches!(
        err,
        DataAccessError::Durability {
            persist_to: PersistTo::Two,
            nodes: 1,
            ..
        }
    ));

    // The write did not happen
    assert!(!template.exists("beer-1").unwrap());
}

#[test]
fn constrained_write_succeeds_within_topology() {
    let template = BucketTemplate::over(beer_bucket_with(three_nodes()));
    let beer = Beer::new("beer-1", "Pale Ale", "Mikkeller", 5.2);

    template
        .save_with(&beer, PersistTo::Three, ReplicateTo::Two)
        .unwrap();
    assert!(template.exists("beer-1").unwrap());
}

#[test]
fn all_write_families_check_durability() {
    let template = BucketTemplate::over(beer_bucket_with(single_node()));
    let beer = Beer::new("beer-1", "Pale Ale", "Mikkeller", 5.2);
    template.save(&beer).unwrap();

    let err = template
        .insert_with(
            &Beer::new("beer-2", "Imperial Stout", "Mikkeller", 9.4),
            PersistTo::None,
            ReplicateTo::One,
        )
        .unwrap_err();
    assert!(matches!(err, DataAccessError::Durability { .. }));

    let err = template
        .update_with(&beer, PersistTo::Four, ReplicateTo::None)
        .unwrap_err();
    assert!(matches!(err, DataAccessError::Durability { .. }));

    let err = template
        .remove_with(&beer, PersistTo::None, ReplicateTo::Three)
        .unwrap_err();
    assert!(matches!(err, DataAccessError::Durability { .. }));

    // The document survived the failed update and remove
    let loaded: Beer = template.find_by_id("beer-1").unwrap().unwrap();
    assert_eq!(loaded, beer);
}

#[test]
fn batch_writes_carry_the_constraint() {
    let template = BucketTemplate::over(beer_bucket_with(three_nodes()));
    let beers = sample_beers();

    template
        .save_all_with(&beers, PersistTo::Master, ReplicateTo::One)
        .unwrap();
    for beer in &beers {
        assert!(template.exists(&beer.id).unwrap());
    }

    template
        .remove_all_with(&beers, PersistTo::Master, ReplicateTo::One)
        .unwrap();
    for beer in &beers {
        assert!(!template.exists(&beer.id).unwrap());
    }
}
