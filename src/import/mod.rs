// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::Result;
use database::models::NewIngredient;
use database::query;
use diesel::prelude::Connection as _;
use std::path::Path;

mod json;

/// Loads catalog entries from an ingredient dump. Entries whose name is already in the catalog
/// are skipped, so the same file can be imported again safely.
pub struct IngredientImporter {
    pending: Vec<json::Ingredient>,

    num_imported: usize,
    num_skipped: usize,
    total: usize,
}

impl IngredientImporter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_records(json::decode_ingredients_from_path(path)?))
    }

    fn from_records(mut pending: Vec<json::Ingredient>) -> Self {
        // import_one takes batches off the end
        pending.reverse();
        let total = pending.len();
        Self {
            pending,
            num_imported: 0,
            num_skipped: 0,
            total,
        }
    }

    pub fn done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn num_imported(&self) -> usize {
        self.num_imported
    }

    pub fn num_skipped(&self) -> usize {
        self.num_skipped
    }

    pub fn percent_done(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.num_imported + self.num_skipped) as f32 / self.total as f32
    }

    /// Imports the next batch in a single transaction. Does nothing once `done()`.
    pub fn import_one(&mut self, conn: &mut database::Connection) -> Result<()> {
        if self.done() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let split_point = self.pending.len().saturating_sub(BATCH_SIZE);
        let batch = self.pending.split_off(split_point);

        let (imported, skipped) = conn.transaction::<_, database::Error, _>(|conn| {
            let mut imported = 0;
            let mut skipped = 0;
            for record in batch.iter().rev() {
                let name = record.name.trim();
                if query::find_ingredient_by_name(conn, name)?.is_some() {
                    log::debug!("skipping existing ingredient {name:?}");
                    skipped += 1;
                    continue;
                }
                query::create_ingredient(
                    conn,
                    &NewIngredient {
                        name,
                        measurement_unit: record.measurement_unit.trim(),
                    },
                )?;
                imported += 1;
            }
            Ok((imported, skipped))
        })?;

        self.num_imported += imported;
        self.num_skipped += skipped;
        Ok(())
    }
}

pub fn import_ingredients(
    conn: &mut database::Connection,
    path: impl AsRef<Path>,
) -> Result<IngredientImporter> {
    let mut importer = IngredientImporter::new(path)?;

    while !importer.done() {
        importer.import_one(conn)?;
        log::info!("imported {:.0}%", importer.percent_done() * 100.0);
    }

    Ok(importer)
}

#[test]
fn import_skips_existing_names() {
    use std::io::Write as _;

    let mut conn = database::fixtures::connection();
    database::fixtures::ingredient(&mut conn, "salt", "g");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"[
            {"name": "sugar", "measurement_unit": "g"},
            {"name": "salt", "measurement_unit": "kg"},
            {"name": " milk ", "measurement_unit": "ml"},
            {"name": "sugar", "measurement_unit": "tbsp"}
        ]"#,
    )
    .unwrap();

    let importer = import_ingredients(&mut conn, file.path()).unwrap();
    assert!(importer.done());
    assert_eq!(importer.num_imported(), 2);
    assert_eq!(importer.num_skipped(), 2);
    assert_eq!(importer.percent_done(), 1.0);

    let catalog: Vec<_> = query::list_ingredients(&mut conn)
        .unwrap()
        .into_iter()
        .map(|i| i.to_string())
        .collect();
    assert_eq!(catalog, ["milk (ml)", "salt (g)", "sugar (g)"]);

    // a second run changes nothing
    let again = import_ingredients(&mut conn, file.path()).unwrap();
    assert_eq!(again.num_imported(), 0);
    assert_eq!(again.num_skipped(), 4);
}

#[test]
fn batches_keep_file_order() {
    let mut conn = database::fixtures::connection();
    let records: Vec<_> = (0..250)
        .map(|n| json::Ingredient {
            name: format!("ingredient {n:03}"),
            measurement_unit: "g".into(),
        })
        .collect();

    let mut importer = IngredientImporter::from_records(records);
    importer.import_one(&mut conn).unwrap();
    assert_eq!(importer.num_imported(), 100);
    assert_eq!(
        query::find_ingredient_by_name(&mut conn, "ingredient 099")
            .unwrap()
            .map(|i| i.name),
        Some("ingredient 099".to_owned())
    );
    assert_eq!(
        query::find_ingredient_by_name(&mut conn, "ingredient 100").unwrap(),
        None
    );

    while !importer.done() {
        importer.import_one(&mut conn).unwrap();
    }
    assert_eq!(importer.num_imported(), 250);
}

#[test]
fn invalid_entry_rolls_back_its_batch() {
    let mut conn = database::fixtures::connection();
    let mut importer = IngredientImporter::from_records(vec![
        json::Ingredient {
            name: "flour".into(),
            measurement_unit: "g".into(),
        },
        json::Ingredient {
            name: "x".repeat(61),
            measurement_unit: "g".into(),
        },
    ]);

    assert!(importer.import_one(&mut conn).is_err());
    assert!(query::list_ingredients(&mut conn).unwrap().is_empty());
}

#[test]
fn import_one_after_done_is_a_no_op() {
    let mut conn = database::fixtures::connection();
    let mut importer = IngredientImporter::from_records(vec![json::Ingredient {
        name: "flour".into(),
        measurement_unit: "g".into(),
    }]);
    importer.import_one(&mut conn).unwrap();
    assert!(importer.done());

    importer.import_one(&mut conn).unwrap();
    assert_eq!(importer.num_imported(), 1);
    assert_eq!(importer.num_skipped(), 0);

    let mut empty = IngredientImporter::from_records(vec![]);
    assert!(empty.done());
    empty.import_one(&mut conn).unwrap();
    assert_eq!(empty.percent_done(), 1.0);
}
