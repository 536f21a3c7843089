use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use bucketmap::{BucketConfig, Document, InMemoryBucket, SELECT_CAS, SELECT_ID};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beer {
    pub id: String,
    pub name: String,
    pub brewery: String,
    pub abv: f64,
}

impl Beer {
    pub fn new(id: &str, name: &str, brewery: &str, abv: f64) -> Self {
        Beer {
            id: id.to_string(),
            name: name.to_string(),
            brewery: brewery.to_string(),
            abv,
        }
    }
}

impl Document for Beer {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Statement projecting full entities plus the `_ID`/`_CAS` metadata.
pub const BY_BREWERY: &str = "SELECT META(beers).id AS _ID, META(beers).cas AS _CAS, beers.* \
     FROM beers WHERE brewery = $brewery";

/// Statement projecting a single field, for fragment mapping.
pub const BEER_NAMES: &str = "SELECT name FROM beers";

/// Statement that forgets the metadata aliases.
pub const BY_BREWERY_NO_META: &str = "SELECT beers.* FROM beers WHERE brewery = $brewery";

pub fn sample_beers() -> Vec<Beer> {
    vec![
        Beer::new("beer-1", "Pale Ale", "Mikkeller", 5.2),
        Beer::new("beer-2", "Imperial Stout", "Mikkeller", 9.4),
        Beer::new("beer-3", "Pilsner", "Augustiner", 4.7),
    ]
}

/// An in-memory bucket with the beer views and query handlers registered.
pub fn beer_bucket() -> InMemoryBucket {
    beer_bucket_with(BucketConfig {
        name: "beers".into(),
        nodes: 1,
        replicas: 0,
    })
}

pub fn beer_bucket_with(config: BucketConfig) -> InMemoryBucket {
    let bucket = InMemoryBucket::with_config(config);

    bucket.register_view("beers", "by_name", |_, content| {
        vec![(content["name"].clone(), Value::Null)]
    });
    bucket.register_view("beers", "by_abv", |_, content| {
        vec![(content["abv"].clone(), Value::Null)]
    });
    bucket.register_view_with_reduce(
        "beers",
        "count",
        |_, _| vec![(Value::Null, json!(1))],
        |values| json!(values.len()),
    );

    bucket.register_query(BY_BREWERY, |query, docs| {
        let brewery = query
            .named_param("brewery")
            .and_then(Value::as_str)
            .ok_or("missing $brewery parameter")?;
        Ok(docs
            .iter()
            .filter(|doc| doc.content["brewery"] == brewery)
            .map(|doc| {
                let mut row = doc.content.clone();
                row[SELECT_ID] = json!(doc.id);
                row[SELECT_CAS] = json!(doc.cas);
                row
            })
            .collect())
    });

    bucket.register_query(BEER_NAMES, |_, docs| {
        Ok(docs
            .iter()
            .map(|doc| json!({ "name": doc.content["name"] }))
            .collect())
    });

    bucket.register_query(BY_BREWERY_NO_META, |query, docs| {
        let brewery = query
            .named_param("brewery")
            .and_then(Value::as_str)
            .ok_or("missing $brewery parameter")?;
        Ok(docs
            .iter()
            .filter(|doc| doc.content["brewery"] == brewery)
            .map(|doc| doc.content.clone())
            .collect())
    });

    bucket
}
